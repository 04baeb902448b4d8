//! Connection metadata and third-party credential values

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use zeroize::Zeroize;

/// Request timeout applied to a connection when none is given
pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 30_000;

/// A single credential value: string, integer, float or boolean
#[derive(Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CredentialValue {
    Bool(bool),
    Integer(i64),
    /// NaN and infinities have no JSON form and fail to serialize
    Float(f64),
    String(String),
}

impl Serialize for CredentialValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CredentialValue::Bool(value) => serializer.serialize_bool(*value),
            CredentialValue::Integer(value) => serializer.serialize_i64(*value),
            CredentialValue::Float(value) if !value.is_finite() => Err(S::Error::custom(
                "credential value is not a finite number",
            )),
            CredentialValue::Float(value) => serializer.serialize_f64(*value),
            CredentialValue::String(value) => serializer.serialize_str(value),
        }
    }
}

impl Zeroize for CredentialValue {
    fn zeroize(&mut self) {
        match self {
            CredentialValue::Bool(value) => value.zeroize(),
            CredentialValue::Integer(value) => value.zeroize(),
            CredentialValue::Float(value) => value.zeroize(),
            CredentialValue::String(value) => value.zeroize(),
        }
    }
}

impl fmt::Debug for CredentialValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<&str> for CredentialValue {
    fn from(value: &str) -> Self {
        CredentialValue::String(value.to_string())
    }
}

impl From<String> for CredentialValue {
    fn from(value: String) -> Self {
        CredentialValue::String(value)
    }
}

impl From<i64> for CredentialValue {
    fn from(value: i64) -> Self {
        CredentialValue::Integer(value)
    }
}

impl From<i32> for CredentialValue {
    fn from(value: i32) -> Self {
        CredentialValue::Integer(value.into())
    }
}

impl From<f64> for CredentialValue {
    fn from(value: f64) -> Self {
        CredentialValue::Float(value)
    }
}

impl From<bool> for CredentialValue {
    fn from(value: bool) -> Self {
        CredentialValue::Bool(value)
    }
}

/// Flat map of credential names to values
///
/// Values are wiped from memory on drop and never shown by `Debug`.
/// Serializes as a plain JSON object with keys in sorted order.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(BTreeMap<String, CredentialValue>);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning `self` for chaining
    pub fn with(mut self, key: impl Into<String>, value: impl Into<CredentialValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<CredentialValue>) {
        if let Some(mut previous) = self.0.insert(key.into(), value.into()) {
            previous.zeroize();
        }
    }

    pub fn get(&self, key: &str) -> Option<&CredentialValue> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Credentials
where
    K: Into<String>,
    V: Into<CredentialValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut credentials = Credentials::new();
        for (key, value) in iter {
            credentials.insert(key, value);
        }
        credentials
    }
}

impl Drop for Credentials {
    fn drop(&mut self) {
        self.0.values_mut().for_each(Zeroize::zeroize);
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.keys().map(|key| (key, "[REDACTED]")))
            .finish()
    }
}

/// Non-secret description of a downstream service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_MS
}

impl Connection {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            timeout_ms: DEFAULT_CONNECTION_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Secret values for one [`Connection`], matched by name
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub connection_name: String,
    pub values: Credentials,
}

impl Credential {
    pub fn new(connection_name: impl Into<String>, values: Credentials) -> Self {
        Self {
            connection_name: connection_name.into(),
            values,
        }
    }

    /// The values that get encrypted for the authorization server
    pub fn values_for_encryption(&self) -> &Credentials {
        &self.values
    }
}
