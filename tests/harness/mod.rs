// tests/harness/mod.rs
//
// Integration testing harness for link-relay.
// Provides an in-memory mailbox, a recording mail store and dispatcher,
// and time control.

pub mod mock_client;
pub mod virtual_clock;
pub mod virtual_mailbox;

pub use mock_client::{MockMailStore, RecordedAction, RecordingDispatch};
pub use virtual_clock::VirtualClock;
pub use virtual_mailbox::{MailboxMessage, VirtualMailbox};
