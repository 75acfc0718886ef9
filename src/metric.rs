//! Structured metric records produced by parsers and consumed by sinks.

use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

/// A typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Unsigned(u64),
    String(String),
    Boolean(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Integer(v) => write!(f, "{v}i"),
            FieldValue::Unsigned(v) => write!(f, "{v}u"),
            FieldValue::String(v) => write!(f, "{v:?}"),
            FieldValue::Boolean(v) => write!(f, "{v}"),
        }
    }
}

/// One measurement with its tags, fields and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    name: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp: SystemTime,
}

impl Metric {
    pub fn new(name: impl Into<String>, timestamp: SystemTime) -> Self {
        Self {
            name: name.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// Insert or overwrite a tag.
    pub fn add_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Insert or overwrite a field.
    pub fn add_field(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_tag(key, value);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.add_field(key, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_overwrite() {
        let mut metric = Metric::new("cpu", SystemTime::UNIX_EPOCH).with_tag("host", "a");
        metric.add_tag("host", "b");
        assert_eq!(metric.tag("host"), Some("b"));
        assert_eq!(metric.tags().len(), 1);
    }

    #[test]
    fn field_display_keeps_type_suffix() {
        assert_eq!(FieldValue::Integer(3).to_string(), "3i");
        assert_eq!(FieldValue::Unsigned(3).to_string(), "3u");
        assert_eq!(FieldValue::String("a b".into()).to_string(), "\"a b\"");
    }
}
