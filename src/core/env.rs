//! Environment values and secret tokens

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Resolved environment mapping of a job (sorted for stable output)
pub type EnvMap = BTreeMap<String, EnvValue>;

/// A scalar YAML value kept in its textual form
///
/// Integers and booleans are accepted so `retries: 2` or `tags: true` can be
/// written unquoted, but the engine only ever compares text. Floats are
/// rejected: YAML does not keep their source text, so `3.10` would read
/// back as `3.1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "String")]
pub struct Scalar(pub String);

impl Scalar {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<Value> for Scalar {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(Scalar(s)),
            Value::Number(n) if n.is_f64() => Err(format!(
                "unquoted number {} loses its source text, quote it (e.g. \"3.10\")",
                n
            )),
            Value::Number(n) => Ok(Scalar(n.to_string())),
            Value::Bool(b) => Ok(Scalar(b.to_string())),
            Value::Null => Err("expected a scalar value, got null".to_string()),
            Value::Sequence(_) => Err("expected a scalar value, got a sequence".to_string()),
            Value::Mapping(_) => Err("expected a scalar value, got a mapping".to_string()),
            Value::Tagged(_) => Err("expected a scalar value, got a tagged value".to_string()),
        }
    }
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        scalar.0
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to an encrypted value
///
/// The token is handed to the executor untouched. It is never decrypted
/// here and both `Debug` and `Display` redact it.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretRef {
    pub secure: String,
}

impl fmt::Debug for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretRef(<redacted>)")
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<secret>")
    }
}

/// A value in a job environment or deploy parameter list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Secret(SecretRef),
    Plain(Scalar),
}

impl EnvValue {
    pub fn plain(value: impl Into<String>) -> Self {
        EnvValue::Plain(Scalar(value.into()))
    }

    /// The plain text of the value; `None` for secrets
    pub fn as_plain(&self) -> Option<&str> {
        match self {
            EnvValue::Plain(s) => Some(s.as_str()),
            EnvValue::Secret(_) => None,
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, EnvValue::Secret(_))
    }
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Plain(s) => fmt::Display::fmt(s, f),
            EnvValue::Secret(s) => fmt::Display::fmt(s, f),
        }
    }
}
