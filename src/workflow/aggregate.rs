//! Aggregated record builder
//!
//! Merges the validated data of every committed step into one flat record
//! using a caller-supplied field mapping. Fields whose step has not been
//! committed (or that the step did not produce) are explicitly `Missing`, so
//! a review screen can tell "not yet provided" apart from "provided empty".

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::step::{StepId, StepRegistry};
use crate::error::{FlowError, FlowResult};
use crate::models::{FieldValue, StepData};

/// One mapping entry: `step.source` lands in the record as `destination`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub step: StepId,
    pub source: String,
    pub destination: String,
}

/// Step id to destination field mapping, in record order
#[derive(Debug, Clone, Default)]
pub struct FieldMapping {
    entries: Vec<MappingEntry>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `source` from `step` to `destination`
    pub fn map(
        mut self,
        step: impl Into<StepId>,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        self.entries.push(MappingEntry {
            step: step.into(),
            source: source.into(),
            destination: destination.into(),
        });
        self
    }

    /// Map each of `fields` from `step` under its own name
    pub fn same(mut self, step: impl Into<StepId>, fields: &[&str]) -> Self {
        let step = step.into();
        for field in fields {
            self = self.map(step.clone(), *field, *field);
        }
        self
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// Check that every entry names a registered step and that no two entries
    /// write the same destination
    pub fn check_against(&self, registry: &StepRegistry) -> FlowResult<()> {
        let mut destinations = HashSet::new();
        for entry in &self.entries {
            if !registry.contains(&entry.step) {
                return Err(FlowError::Registry(format!(
                    "Field mapping refers to unknown step '{}'",
                    entry.step
                )));
            }
            if !destinations.insert(entry.destination.as_str()) {
                return Err(FlowError::Registry(format!(
                    "Field '{}' is mapped more than once",
                    entry.destination
                )));
            }
        }
        Ok(())
    }
}

/// State of one aggregate field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum FieldSlot {
    Provided(FieldValue),
    Missing,
}

impl FieldSlot {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn value(&self) -> Option<&FieldValue> {
        match self {
            Self::Provided(v) => Some(v),
            Self::Missing => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateField {
    pub name: String,
    pub step: StepId,
    pub slot: FieldSlot,
}

/// Merged view of all committed step data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRecord {
    fields: Vec<AggregateField>,
}

impl AggregateRecord {
    pub fn get(&self, name: &str) -> Option<&FieldSlot> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.slot)
    }

    /// Provided value of a field, `None` if missing or unmapped
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.get(name).and_then(FieldSlot::value)
    }

    pub fn missing_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.slot.is_missing())
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.fields.iter().all(|f| !f.slot.is_missing())
    }

    pub fn fields(&self) -> &[AggregateField] {
        &self.fields
    }
}

/// Build the aggregate record from committed step data
pub fn build_aggregate(
    committed: &BTreeMap<StepId, StepData>,
    mapping: &FieldMapping,
) -> AggregateRecord {
    let fields = mapping
        .entries
        .iter()
        .map(|entry| {
            let slot = committed
                .get(&entry.step)
                .and_then(|data| data.get(&entry.source))
                .cloned()
                .map_or(FieldSlot::Missing, FieldSlot::Provided);

            AggregateField {
                name: entry.destination.clone(),
                step: entry.step.clone(),
                slot,
            }
        })
        .collect();

    AggregateRecord { fields }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;

    fn mapping() -> FieldMapping {
        FieldMapping::new()
            .same("applicant", &["full_name", "email"])
            .map("partner", "partner_email", "invitee_email")
            .same("payment", &["amount"])
    }

    #[test]
    fn test_partial_record_marks_missing() {
        let mut applicant = StepData::new();
        applicant.insert("full_name", FieldValue::Text("Jane Doe".into()));
        applicant.insert("email", FieldValue::Text(String::new()));

        let mut committed = BTreeMap::new();
        committed.insert(StepId::from("applicant"), applicant);

        let record = build_aggregate(&committed, &mapping());

        assert_eq!(
            record.value("full_name"),
            Some(&FieldValue::Text("Jane Doe".into()))
        );
        // Provided empty is not missing
        assert_eq!(
            record.get("email"),
            Some(&FieldSlot::Provided(FieldValue::Text(String::new())))
        );
        assert_eq!(record.get("invitee_email"), Some(&FieldSlot::Missing));
        assert_eq!(record.missing_fields(), vec!["invitee_email", "amount"]);
        assert!(!record.is_complete());
    }

    #[test]
    fn test_complete_record_keeps_mapping_order() {
        let mut applicant = StepData::new();
        applicant.insert("full_name", FieldValue::Text("Jane".into()));
        applicant.insert("email", FieldValue::Text("jane@example.com".into()));
        let mut partner = StepData::new();
        partner.insert("partner_email", FieldValue::Text("john@example.com".into()));
        let mut payment = StepData::new();
        payment.insert("amount", FieldValue::Amount(Money::from_minor(5000)));

        let committed: BTreeMap<_, _> = [
            (StepId::from("payment"), payment),
            (StepId::from("partner"), partner),
            (StepId::from("applicant"), applicant),
        ]
        .into_iter()
        .collect();

        let record = build_aggregate(&committed, &mapping());
        let names: Vec<&str> = record.fields().iter().map(|f| f.name.as_str()).collect();

        assert!(record.is_complete());
        assert_eq!(names, vec!["full_name", "email", "invitee_email", "amount"]);
    }

    #[test]
    fn test_missing_serializes_explicitly() {
        let record = build_aggregate(&BTreeMap::new(), &FieldMapping::new().same("a", &["x"]));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["fields"][0]["slot"]["status"], "missing");
    }
}
