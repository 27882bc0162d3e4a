//! Step definitions and the step registry
//!
//! A registry is the ordered, immutable list of steps a workflow walks
//! through. It is fixed at construction.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::validation::{StepValidator, ValidationErrors};
use crate::error::{FlowError, FlowResult};
use crate::models::{FormInput, StepData};

/// Stable key identifying a step within a registry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Descriptor for one step of a workflow
#[derive(Clone)]
pub struct StepDefinition {
    id: StepId,
    title: String,
    validator: Arc<dyn StepValidator>,
    requires_external_confirmation: bool,
}

impl StepDefinition {
    pub fn new(
        id: impl Into<StepId>,
        title: impl Into<String>,
        validator: impl StepValidator + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            validator: Arc::new(validator),
            requires_external_confirmation: false,
        }
    }

    /// Require an `acknowledge_side_effect` call before this step completes
    pub fn with_external_confirmation(mut self) -> Self {
        self.requires_external_confirmation = true;
        self
    }

    pub fn id(&self) -> &StepId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn requires_external_confirmation(&self) -> bool {
        self.requires_external_confirmation
    }

    pub fn validate(&self, input: &FormInput) -> Result<StepData, ValidationErrors> {
        self.validator.validate(input)
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("id", &self.id)
            .field("title", &self.title)
            .field(
                "requires_external_confirmation",
                &self.requires_external_confirmation,
            )
            .finish_non_exhaustive()
    }
}

/// Ordered, immutable list of step definitions
#[derive(Debug, Clone)]
pub struct StepRegistry {
    steps: Arc<[StepDefinition]>,
}

impl StepRegistry {
    /// Build a registry, rejecting empty lists and duplicate step ids
    pub fn new(steps: Vec<StepDefinition>) -> FlowResult<Self> {
        if steps.is_empty() {
            return Err(FlowError::Registry(
                "A workflow needs at least one step".into(),
            ));
        }

        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id.clone()) {
                return Err(FlowError::Registry(format!(
                    "Duplicate step id '{}'",
                    step.id
                )));
            }
        }

        Ok(Self {
            steps: steps.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    /// Step at an index already known to be in range
    pub(crate) fn at(&self, index: usize) -> &StepDefinition {
        &self.steps[index]
    }

    /// Look up a step, mapping a bad index to `UnknownStep`
    pub fn step(&self, index: usize) -> FlowResult<&StepDefinition> {
        self.steps
            .get(index)
            .ok_or_else(|| FlowError::unknown_index(index, self.steps.len()))
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id.as_str() == id)
    }

    pub fn contains(&self, id: &StepId) -> bool {
        self.steps.iter().any(|s| &s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepDefinition> {
        self.steps.iter()
    }
}
