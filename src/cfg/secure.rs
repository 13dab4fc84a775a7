// src/cfg/secure.rs

use serde::{Deserialize, Deserializer};
use secure_string::SecureString;

/// Deserializes an `Option<SecureString>` from a plain YAML string.
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<SecureString>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.map(SecureString::from))
}
