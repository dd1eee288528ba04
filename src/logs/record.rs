use chrono::{DateTime, Utc};
use serde::Serialize;

/// OpenTelemetry severity number for INFO.
pub const SEVERITY_NUMBER_INFO: u8 = 9;
/// OpenTelemetry severity number for ERROR.
pub const SEVERITY_NUMBER_ERROR: u8 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Success,
    Failed,
}

impl Severity {
    /// Only OK, Created and No Content count as successful calls.
    pub fn from_status_code(status_code: u16) -> Self {
        match status_code {
            200 | 201 | 204 => Severity::Success,
            _ => Severity::Failed,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Failed => "failed",
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Severity::Success => SEVERITY_NUMBER_INFO,
            Severity::Failed => SEVERITY_NUMBER_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Str(String),
    Int(i64),
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

/// Insertion ordered key/value attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Vec<(String, AttributeValue)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any previous value in place.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for Attributes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Normalized representation of one audit event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub event_name: String,
    pub severity: Severity,
    /// JSON form of the source event, `None` when it could not be encoded.
    pub body: Option<String>,
    pub attributes: Attributes,
}
