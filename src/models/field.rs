//! Form input and validated step data
//!
//! `FormInput` is the opaque key/value form data handed in by the rendering
//! layer. `StepData` is what a step validator produces from it: normalised,
//! typed field values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::money::Money;

/// Raw form data for one step, exactly as entered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormInput(BTreeMap<String, String>);

impl FormInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormInput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A single validated field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Text(String),
    Amount(Money),
    Flag(bool),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<Money> {
        match self {
            Self::Amount(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Amount(m) => write!(f, "{}", m),
            Self::Flag(true) => write!(f, "Yes"),
            Self::Flag(false) => write!(f, "No"),
        }
    }
}

/// Validated output of one step, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepData(BTreeMap<String, FieldValue>);

impl StepData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) {
        self.0.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn amount(&self, field: &str) -> Option<Money> {
        self.get(field).and_then(FieldValue::as_amount)
    }

    pub fn flag(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(FieldValue::as_flag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_input_builder() {
        let input = FormInput::new().with("payee", "p1").with("amount", "50");
        assert_eq!(input.get("payee"), Some("p1"));
        assert_eq!(input.get("reference"), None);
    }

    #[test]
    fn test_form_input_from_iter() {
        let input: FormInput = [("email", "jane@example.com")].into_iter().collect();
        assert_eq!(input.get("email"), Some("jane@example.com"));
    }

    #[test]
    fn test_step_data_typed_accessors() {
        let mut data = StepData::new();
        data.insert("amount", FieldValue::Amount(Money::from_minor(5000)));
        data.insert("terms_accepted", FieldValue::Flag(true));

        assert_eq!(data.amount("amount"), Some(Money::from_minor(5000)));
        assert_eq!(data.flag("terms_accepted"), Some(true));
        assert_eq!(data.text("amount"), None);
    }

    #[test]
    fn test_field_value_serialization() {
        let json = serde_json::to_string(&FieldValue::Amount(Money::from_minor(5000))).unwrap();
        assert_eq!(json, r#"{"type":"amount","value":5000}"#);
    }
}
