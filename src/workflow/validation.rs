//! Step validation
//!
//! Validators turn raw `FormInput` into typed `StepData` or a set of
//! field-level errors. `FormSchema` composes per-field rules into a validator;
//! any `Fn(&FormInput) -> Result<StepData, ValidationErrors>` works too.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::models::{FieldValue, FormInput, Money, StepData};

/// A validation message scoped to one form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All field errors produced by one validation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single-field failure
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, message)])
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// First message reported for a field, for inline display next to it
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Pure validation of one step's raw input
pub trait StepValidator: Send + Sync {
    fn validate(&self, input: &FormInput) -> Result<StepData, ValidationErrors>;
}

impl<F> StepValidator for F
where
    F: Fn(&FormInput) -> Result<StepData, ValidationErrors> + Send + Sync,
{
    fn validate(&self, input: &FormInput) -> Result<StepData, ValidationErrors> {
        self(input)
    }
}

/// How a raw field string is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Amount,
    Flag,
}

#[derive(Debug, Clone)]
enum Rule {
    Required(String),
    MinLen(usize, String),
    MaxLen(usize, String),
    Email(String),
    MinDigits(usize, String),
    Positive(String),
    Accepted(String),
}

/// One field of a form schema: its kind, optionality and rules
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    optional: bool,
    rules: Vec<Rule>,
}

impl FieldSpec {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
            rules: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn amount(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Amount)
    }

    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Flag)
    }

    /// An empty optional field skips its rules and is recorded as empty text
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn required(mut self, message: impl Into<String>) -> Self {
        self.rules.push(Rule::Required(message.into()));
        self
    }

    pub fn min_len(mut self, min: usize, message: impl Into<String>) -> Self {
        self.rules.push(Rule::MinLen(min, message.into()));
        self
    }

    pub fn max_len(mut self, max: usize, message: impl Into<String>) -> Self {
        self.rules.push(Rule::MaxLen(max, message.into()));
        self
    }

    pub fn email(mut self, message: impl Into<String>) -> Self {
        self.rules.push(Rule::Email(message.into()));
        self
    }

    /// At least `min` ASCII digits, ignoring spaces, `+` and other punctuation
    pub fn min_digits(mut self, min: usize, message: impl Into<String>) -> Self {
        self.rules.push(Rule::MinDigits(min, message.into()));
        self
    }

    pub fn positive(mut self, message: impl Into<String>) -> Self {
        self.rules.push(Rule::Positive(message.into()));
        self
    }

    /// Checkbox must be ticked
    pub fn accepted(mut self, message: impl Into<String>) -> Self {
        self.rules.push(Rule::Accepted(message.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, raw: &str) -> Result<FieldValue, String> {
        match self.kind {
            FieldKind::Text => {
                let value = raw.trim();
                if value.is_empty() && self.optional {
                    return Ok(FieldValue::Text(String::new()));
                }
                for rule in &self.rules {
                    check_text_rule(rule, value)?;
                }
                Ok(FieldValue::Text(value.to_string()))
            }
            FieldKind::Amount => {
                let amount = Money::parse(raw).map_err(|_| "Enter a valid amount.".to_string())?;
                for rule in &self.rules {
                    if let Rule::Positive(message) = rule {
                        if !amount.is_positive() {
                            return Err(message.clone());
                        }
                    }
                }
                Ok(FieldValue::Amount(amount))
            }
            FieldKind::Flag => {
                let checked = parse_flag(raw);
                for rule in &self.rules {
                    if let Rule::Accepted(message) = rule {
                        if !checked {
                            return Err(message.clone());
                        }
                    }
                }
                Ok(FieldValue::Flag(checked))
            }
        }
    }
}

fn check_text_rule(rule: &Rule, value: &str) -> Result<(), String> {
    let failed = match rule {
        Rule::Required(_) => value.is_empty(),
        Rule::MinLen(min, _) => value.chars().count() < *min,
        Rule::MaxLen(max, _) => value.chars().count() > *max,
        Rule::Email(_) => !email_pattern().is_match(value),
        Rule::MinDigits(min, _) => value.chars().filter(char::is_ascii_digit).count() < *min,
        Rule::Positive(_) | Rule::Accepted(_) => false,
    };

    if failed {
        Err(rule_message(rule).to_string())
    } else {
        Ok(())
    }
}

fn rule_message(rule: &Rule) -> &str {
    match rule {
        Rule::Required(m)
        | Rule::MinLen(_, m)
        | Rule::MaxLen(_, m)
        | Rule::Email(m)
        | Rule::MinDigits(_, m)
        | Rule::Positive(m)
        | Rule::Accepted(m) => m,
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "yes" | "y" | "on" | "1"
    )
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
    })
}

/// An ordered set of field specs validating a whole form
///
/// Every field is checked, so one run reports all failing fields. Each
/// field reports only its first failing rule.
#[derive(Debug, Clone, Default)]
pub struct FormSchema {
    fields: Vec<FieldSpec>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }
}

impl StepValidator for FormSchema {
    fn validate(&self, input: &FormInput) -> Result<StepData, ValidationErrors> {
        let mut data = StepData::new();
        let mut errors = ValidationErrors::new();

        for spec in &self.fields {
            match spec.check(input.get(&spec.name).unwrap_or("")) {
                Ok(value) => data.insert(spec.name.clone(), value),
                Err(message) => errors.push(FieldError::new(spec.name.clone(), message)),
            }
        }

        if errors.is_empty() {
            Ok(data)
        } else {
            Err(errors)
        }
    }
}
