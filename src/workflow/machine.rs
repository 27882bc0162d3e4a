//! Workflow state machine
//!
//! Holds the cursor, the committed data and completion flags for one
//! workflow session, and enforces the ordering rules:
//!
//! - a step is submitted only while it is the current step
//! - a step flagged for external confirmation completes only after
//!   `acknowledge_side_effect`
//! - `advance` never moves past an incomplete step
//! - `jump_to` targets an earlier step or an already completed one
//!
//! Rejected calls leave the state untouched. The machine performs no I/O.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::aggregate::{build_aggregate, AggregateRecord, FieldMapping};
use super::step::{StepDefinition, StepId, StepRegistry};
use super::validation::ValidationErrors;
use crate::audit::{AuditEntry, AuditTrail, Operation};
use crate::error::{FlowError, FlowResult};
use crate::models::{FormInput, SessionId, StepData};

/// Result of a successful `submit_step`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The step is complete and `advance` may proceed
    Completed,
    /// Data is committed but the step waits for `acknowledge_side_effect`
    AwaitingSideEffect,
}

/// Result of a successful `advance`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The cursor moved to `index`
    Moved { index: usize },
    /// The last step was current and every step is complete
    Finished,
}

/// Read-only view of a workflow for the rendering layer
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSnapshot {
    pub session: SessionId,
    pub current_index: usize,
    pub current_step: StepId,
    pub current_title: String,
    pub total_steps: usize,
    pub completed: Vec<StepId>,
    pub awaiting_side_effect: bool,
    pub finished: bool,
    pub last_errors: Option<ValidationErrors>,
    pub aggregate: AggregateRecord,
}

/// State of one multi-step workflow session
#[derive(Debug)]
pub struct WorkflowState {
    session: SessionId,
    steps: StepRegistry,
    mapping: FieldMapping,
    current_index: usize,
    committed_data: BTreeMap<StepId, StepData>,
    completed_steps: BTreeSet<StepId>,
    aggregate: AggregateRecord,
    last_errors: Option<ValidationErrors>,
    audit: AuditTrail,
}

impl WorkflowState {
    /// Start a fresh session at the first step
    pub fn new(steps: StepRegistry, mapping: FieldMapping) -> FlowResult<Self> {
        mapping.check_against(&steps)?;

        let session = SessionId::new();
        let aggregate = build_aggregate(&BTreeMap::new(), &mapping);
        tracing::debug!(%session, steps = steps.len(), "workflow session started");

        Ok(Self {
            session,
            steps,
            mapping,
            current_index: 0,
            committed_data: BTreeMap::new(),
            completed_steps: BTreeSet::new(),
            aggregate,
            last_errors: None,
            audit: AuditTrail::new(),
        })
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn steps(&self) -> &StepRegistry {
        &self.steps
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_step(&self) -> &StepDefinition {
        self.steps.at(self.current_index)
    }

    /// Validated data for a step, if it has ever been submitted successfully
    pub fn committed(&self, index: usize) -> Option<&StepData> {
        self.steps
            .get(index)
            .and_then(|step| self.committed_data.get(step.id()))
    }

    pub fn is_complete(&self, index: usize) -> bool {
        self.steps
            .get(index)
            .is_some_and(|step| self.completed_steps.contains(step.id()))
    }

    pub fn completed_steps(&self) -> impl Iterator<Item = &StepId> {
        self.completed_steps.iter()
    }

    pub fn aggregate(&self) -> &AggregateRecord {
        &self.aggregate
    }

    /// Errors from the last rejected submission of the current step
    pub fn last_errors(&self) -> Option<&ValidationErrors> {
        self.last_errors.as_ref()
    }

    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// The current step has committed data but still waits for its side effect
    pub fn awaiting_side_effect(&self) -> bool {
        let step = self.current_step();
        step.requires_external_confirmation()
            && self.committed_data.contains_key(step.id())
            && !self.completed_steps.contains(step.id())
    }

    /// The last step is current and every step is complete
    pub fn is_finished(&self) -> bool {
        self.current_index == self.steps.last_index() && self.first_incomplete(self.steps.len()).is_none()
    }

    /// Validate and commit input for the current step
    pub fn submit_step(&mut self, index: usize, input: &FormInput) -> FlowResult<SubmitOutcome> {
        let step = match self.steps.step(index) {
            Ok(step) => step.clone(),
            Err(err) => return Err(self.reject(Operation::SubmitStep, index.to_string(), err)),
        };

        if index != self.current_index {
            let err = FlowError::out_of_order(
                "submit_step",
                format!(
                    "step '{}' is not the current step (current is index {})",
                    step.id(),
                    self.current_index
                ),
            );
            return Err(self.reject(Operation::SubmitStep, step.id().to_string(), err));
        }

        let data = match step.validate(input) {
            Ok(data) => data,
            Err(errors) => {
                tracing::debug!(session = %self.session, step = %step.id(), errors = %errors, "step input rejected");
                self.audit.record(AuditEntry::rejected(
                    self.session,
                    Operation::SubmitStep,
                    step.id().to_string(),
                    errors.to_string(),
                ));
                self.last_errors = Some(errors.clone());
                return Err(FlowError::Validation(errors));
            }
        };

        let id = step.id().clone();
        let previous = self.committed_data.insert(id.clone(), data);
        let changed = previous.as_ref() != self.committed_data.get(&id);
        self.aggregate = build_aggregate(&self.committed_data, &self.mapping);
        self.last_errors = None;

        let outcome = if !step.requires_external_confirmation() {
            self.completed_steps.insert(id.clone());
            SubmitOutcome::Completed
        } else {
            // Edited data needs a fresh acknowledgment
            if changed {
                self.completed_steps.remove(&id);
            }
            if self.completed_steps.contains(&id) {
                SubmitOutcome::Completed
            } else {
                SubmitOutcome::AwaitingSideEffect
            }
        };

        tracing::debug!(session = %self.session, step = %id, ?outcome, "step submitted");
        self.audit.record(
            AuditEntry::accepted(self.session, Operation::SubmitStep, id.to_string())
                .with_detail(format!("{:?}", outcome)),
        );

        Ok(outcome)
    }

    /// Mark a step's external side effect as done. Idempotent.
    pub fn acknowledge_side_effect(&mut self, index: usize) -> FlowResult<()> {
        let step = match self.steps.step(index) {
            Ok(step) => step.clone(),
            Err(err) => {
                return Err(self.reject(Operation::AcknowledgeSideEffect, index.to_string(), err))
            }
        };

        if !step.requires_external_confirmation() {
            let err = FlowError::out_of_order(
                "acknowledge_side_effect",
                format!("step '{}' does not require external confirmation", step.id()),
            );
            return Err(self.reject(Operation::AcknowledgeSideEffect, step.id().to_string(), err));
        }

        if !self.committed_data.contains_key(step.id()) {
            let err = FlowError::out_of_order(
                "acknowledge_side_effect",
                format!("step '{}' has no validated data yet", step.id()),
            );
            return Err(self.reject(Operation::AcknowledgeSideEffect, step.id().to_string(), err));
        }

        if self.completed_steps.insert(step.id().clone()) {
            tracing::info!(session = %self.session, step = %step.id(), "side effect acknowledged");
            self.audit.record(AuditEntry::accepted(
                self.session,
                Operation::AcknowledgeSideEffect,
                step.id().to_string(),
            ));
        }

        Ok(())
    }

    /// Move to the next step, or report completion from the last step
    pub fn advance(&mut self) -> FlowResult<Advance> {
        let last = self.steps.last_index();
        let upto = if self.current_index == last {
            self.steps.len()
        } else {
            self.current_index + 1
        };

        if let Some(incomplete) = self.first_incomplete(upto) {
            let id = self.step_id(incomplete);
            let err = FlowError::out_of_order("advance", format!("step '{}' is not complete", id));
            return Err(self.reject(Operation::Advance, id, err));
        }

        if self.current_index == last {
            tracing::info!(session = %self.session, "workflow finished");
            let entry = AuditEntry::accepted(self.session, Operation::Advance, self.step_id(last))
                .with_detail("finished");
            self.audit.record(entry);
            return Ok(Advance::Finished);
        }

        self.move_to(Operation::Advance, self.current_index + 1);
        Ok(Advance::Moved {
            index: self.current_index,
        })
    }

    /// Move back one step; no completion requirement
    pub fn retreat(&mut self) -> FlowResult<usize> {
        if self.current_index == 0 {
            let err = FlowError::out_of_order("retreat", "already at the first step");
            return Err(self.reject(Operation::Retreat, self.step_id(0), err));
        }

        self.move_to(Operation::Retreat, self.current_index - 1);
        Ok(self.current_index)
    }

    /// Jump to an earlier step or any completed step
    pub fn jump_to(&mut self, index: usize) -> FlowResult<usize> {
        if let Err(err) = self.steps.step(index) {
            return Err(self.reject(Operation::JumpTo, index.to_string(), err));
        }

        if index > self.current_index && !self.is_complete(index) {
            let id = self.step_id(index);
            let err = FlowError::out_of_order(
                "jump_to",
                format!("step '{}' is ahead of the current step and not complete", id),
            );
            return Err(self.reject(Operation::JumpTo, id, err));
        }

        self.move_to(Operation::JumpTo, index);
        Ok(self.current_index)
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let step = self.current_step();
        WorkflowSnapshot {
            session: self.session,
            current_index: self.current_index,
            current_step: step.id().clone(),
            current_title: step.title().to_string(),
            total_steps: self.steps.len(),
            completed: self.completed_steps.iter().cloned().collect(),
            awaiting_side_effect: self.awaiting_side_effect(),
            finished: self.is_finished(),
            last_errors: self.last_errors.clone(),
            aggregate: self.aggregate.clone(),
        }
    }

    fn move_to(&mut self, operation: Operation, index: usize) {
        let from = self.current_index;
        self.current_index = index;
        self.last_errors = None;

        tracing::debug!(session = %self.session, from, to = index, %operation, "cursor moved");
        let entry = AuditEntry::accepted(self.session, operation, self.step_id(index))
            .with_detail(format!("{} -> {}", from, index));
        self.audit.record(entry);
    }

    /// Smallest index below `upto` whose step is not complete
    fn first_incomplete(&self, upto: usize) -> Option<usize> {
        (0..upto).find(|&i| !self.is_complete(i))
    }

    fn step_id(&self, index: usize) -> String {
        self.steps
            .get(index)
            .map(|s| s.id().to_string())
            .unwrap_or_else(|| index.to_string())
    }

    /// Log and audit a refused transition, handing the error back
    pub(crate) fn reject(
        &mut self,
        operation: Operation,
        subject: String,
        err: FlowError,
    ) -> FlowError {
        tracing::warn!(session = %self.session, %operation, subject = %subject, error = %err, "transition rejected");
        self.audit.record(AuditEntry::rejected(
            self.session,
            operation,
            subject,
            err.to_string(),
        ));
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;
    use crate::workflow::validation::{FieldSpec, FormSchema};
    use proptest::prelude::*;

    fn name_schema() -> FormSchema {
        FormSchema::new().field(FieldSpec::text("name").min_len(2, "Name is required."))
    }

    /// Three steps, the middle one gated on an external side effect
    fn three_step_workflow() -> WorkflowState {
        let registry = StepRegistry::new(vec![
            StepDefinition::new("details", "Details", name_schema()),
            StepDefinition::new("invite", "Invite", name_schema()).with_external_confirmation(),
            StepDefinition::new("review", "Review", name_schema()),
        ])
        .unwrap();

        let mapping = FieldMapping::new()
            .map("details", "name", "applicant")
            .map("invite", "name", "invitee")
            .map("review", "name", "reviewer");

        WorkflowState::new(registry, mapping).unwrap()
    }

    fn valid(name: &str) -> FormInput {
        FormInput::new().with("name", name)
    }

    #[test]
    fn test_gated_step_scenario() {
        let mut wf = three_step_workflow();

        assert_eq!(wf.submit_step(0, &valid("Jane")).unwrap(), SubmitOutcome::Completed);
        assert!(wf.is_complete(0));
        assert_eq!(wf.current_index(), 0);

        assert_eq!(wf.advance().unwrap(), Advance::Moved { index: 1 });

        assert_eq!(
            wf.submit_step(1, &valid("John")).unwrap(),
            SubmitOutcome::AwaitingSideEffect
        );
        assert!(wf.committed(1).is_some());
        assert!(!wf.is_complete(1));
        assert!(wf.awaiting_side_effect());

        let err = wf.advance().unwrap_err();
        assert!(err.is_out_of_order());
        assert_eq!(wf.current_index(), 1);

        wf.acknowledge_side_effect(1).unwrap();
        assert!(wf.is_complete(1));
        assert_eq!(wf.advance().unwrap(), Advance::Moved { index: 2 });
    }

    #[test]
    fn test_validation_failure_leaves_state_unchanged() {
        let mut wf = three_step_workflow();

        let err = wf.submit_step(0, &valid("J")).unwrap_err();
        assert!(err.is_validation());
        assert!(wf.committed(0).is_none());
        assert!(!wf.is_complete(0));
        assert_eq!(
            wf.last_errors().and_then(|e| e.message_for("name")),
            Some("Name is required.")
        );

        wf.submit_step(0, &valid("Jane")).unwrap();
        assert!(wf.last_errors().is_none());
    }

    #[test]
    fn test_stale_submission_rejected() {
        let mut wf = three_step_workflow();
        wf.submit_step(0, &valid("Jane")).unwrap();
        wf.advance().unwrap();

        let err = wf.submit_step(0, &valid("Someone Else")).unwrap_err();
        assert!(err.is_out_of_order());
        assert_eq!(wf.committed(0).unwrap().text("name"), Some("Jane"));
    }

    #[test]
    fn test_unknown_step() {
        let mut wf = three_step_workflow();
        assert!(matches!(wf.submit_step(7, &valid("Jane")), Err(FlowError::UnknownStep(_))));
        assert!(matches!(wf.jump_to(3), Err(FlowError::UnknownStep(_))));
        assert!(matches!(wf.acknowledge_side_effect(9), Err(FlowError::UnknownStep(_))));
    }

    #[test]
    fn test_advance_requires_completion() {
        let mut wf = three_step_workflow();
        assert!(wf.advance().unwrap_err().is_out_of_order());
        assert_eq!(wf.current_index(), 0);
    }

    #[test]
    fn test_acknowledge_is_idempotent() {
        let mut wf = three_step_workflow();
        wf.submit_step(0, &valid("Jane")).unwrap();
        wf.advance().unwrap();
        wf.submit_step(1, &valid("John")).unwrap();

        wf.acknowledge_side_effect(1).unwrap();
        let once: Vec<StepId> = wf.completed_steps().cloned().collect();
        wf.acknowledge_side_effect(1).unwrap();
        let twice: Vec<StepId> = wf.completed_steps().cloned().collect();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_acknowledge_requires_data_and_flag() {
        let mut wf = three_step_workflow();
        assert!(wf.acknowledge_side_effect(1).unwrap_err().is_out_of_order());

        wf.submit_step(0, &valid("Jane")).unwrap();
        assert!(wf.acknowledge_side_effect(0).unwrap_err().is_out_of_order());
    }

    #[test]
    fn test_retreat() {
        let mut wf = three_step_workflow();
        assert!(wf.retreat().unwrap_err().is_out_of_order());

        wf.submit_step(0, &valid("Jane")).unwrap();
        wf.advance().unwrap();
        assert_eq!(wf.retreat().unwrap(), 0);
    }

    #[test]
    fn test_jump_to_rules() {
        let mut wf = three_step_workflow();
        wf.submit_step(0, &valid("Jane")).unwrap();
        wf.advance().unwrap();

        // Incomplete future step
        assert!(wf.jump_to(2).unwrap_err().is_out_of_order());
        assert_eq!(wf.current_index(), 1);

        // Earlier step
        assert_eq!(wf.jump_to(0).unwrap(), 0);
        assert!(wf.jump_to(1).unwrap_err().is_out_of_order());

        // Completed step ahead of the cursor
        wf.advance().unwrap();
        wf.submit_step(1, &valid("John")).unwrap();
        wf.acknowledge_side_effect(1).unwrap();
        wf.jump_to(0).unwrap();
        assert_eq!(wf.jump_to(1).unwrap(), 1);

        // Step 2 was never completed
        assert!(wf.jump_to(2).is_err());
    }

    #[test]
    fn test_editing_gated_step_requires_new_acknowledgment() {
        let mut wf = three_step_workflow();
        wf.submit_step(0, &valid("Jane")).unwrap();
        wf.advance().unwrap();
        wf.submit_step(1, &valid("John")).unwrap();
        wf.acknowledge_side_effect(1).unwrap();

        // Same data: acknowledgment kept
        assert_eq!(wf.submit_step(1, &valid("John")).unwrap(), SubmitOutcome::Completed);

        // Changed data: invitation must go out again
        assert_eq!(
            wf.submit_step(1, &valid("Johnny")).unwrap(),
            SubmitOutcome::AwaitingSideEffect
        );
        assert!(!wf.is_complete(1));
        assert_eq!(
            wf.aggregate().value("invitee"),
            Some(&FieldValue::Text("Johnny".into()))
        );
    }

    #[test]
    fn test_advance_never_skips_reopened_earlier_step() {
        let mut wf = three_step_workflow();
        wf.submit_step(0, &valid("Jane")).unwrap();
        wf.advance().unwrap();
        wf.submit_step(1, &valid("John")).unwrap();
        wf.acknowledge_side_effect(1).unwrap();
        wf.advance().unwrap();
        wf.submit_step(2, &valid("Jane")).unwrap();

        // Reopen step 1, then jump forward to the completed step 2
        wf.jump_to(1).unwrap();
        wf.submit_step(1, &valid("Johnny")).unwrap();
        assert_eq!(wf.jump_to(2).unwrap(), 2);

        assert!(wf.advance().unwrap_err().is_out_of_order());
        assert!(!wf.is_finished());

        wf.jump_to(1).unwrap();
        wf.acknowledge_side_effect(1).unwrap();
        wf.jump_to(2).unwrap();
        assert_eq!(wf.advance().unwrap(), Advance::Finished);
    }

    #[test]
    fn test_finish_and_snapshot() {
        let mut wf = three_step_workflow();
        wf.submit_step(0, &valid("Jane")).unwrap();
        wf.advance().unwrap();
        wf.submit_step(1, &valid("John")).unwrap();
        wf.acknowledge_side_effect(1).unwrap();
        wf.advance().unwrap();

        let snapshot = wf.snapshot();
        assert_eq!(snapshot.current_step.as_str(), "review");
        assert_eq!(snapshot.aggregate.missing_fields(), vec!["reviewer"]);
        assert_eq!(snapshot.completed.len(), 2);
        assert!(!snapshot.finished);

        wf.submit_step(2, &valid("Jane")).unwrap();
        assert_eq!(wf.advance().unwrap(), Advance::Finished);
        assert!(wf.is_finished());
        assert!(wf.aggregate().is_complete());

        // Finishing again is harmless
        assert_eq!(wf.advance().unwrap(), Advance::Finished);
        assert_eq!(wf.current_index(), 2);
    }

    #[test]
    fn test_rejections_are_audited() {
        let mut wf = three_step_workflow();
        let _ = wf.advance();
        let _ = wf.jump_to(2);

        assert_eq!(wf.audit().rejected().count(), 2);
    }

    #[derive(Debug, Clone)]
    enum Action {
        Submit(usize, &'static str),
        Acknowledge(usize),
        Advance,
        Retreat,
        JumpTo(usize),
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        // Index 3 is out of range; "J" fails validation
        let index = 0usize..4;
        prop_oneof![
            (index.clone(), prop_oneof![Just("Jane"), Just("John"), Just("J")])
                .prop_map(|(i, name)| Action::Submit(i, name)),
            index.clone().prop_map(Action::Acknowledge),
            Just(Action::Advance),
            Just(Action::Retreat),
            index.prop_map(Action::JumpTo),
        ]
    }

    type Observed = (usize, Vec<StepId>, Vec<Option<StepData>>);

    fn observe(wf: &WorkflowState) -> Observed {
        (
            wf.current_index(),
            wf.completed_steps().cloned().collect(),
            (0..wf.steps().len()).map(|i| wf.committed(i).cloned()).collect(),
        )
    }

    proptest! {
        #[test]
        fn cursor_never_passes_incomplete_step(actions in prop::collection::vec(arb_action(), 0..40)) {
            let mut wf = three_step_workflow();

            for action in actions {
                let before = observe(&wf);
                let rejected = match action {
                    Action::Submit(i, name) => {
                        let result = wf.submit_step(i, &valid(name));
                        prop_assert_eq!(wf.current_index(), before.0);
                        result.is_err()
                    }
                    Action::Acknowledge(i) => wf.acknowledge_side_effect(i).is_err(),
                    Action::Advance => match wf.advance() {
                        Ok(Advance::Moved { index }) => {
                            prop_assert!((0..index).all(|j| wf.is_complete(j)));
                            false
                        }
                        Ok(Advance::Finished) => {
                            prop_assert!((0..wf.steps().len()).all(|j| wf.is_complete(j)));
                            false
                        }
                        Err(_) => true,
                    },
                    Action::Retreat => wf.retreat().is_err(),
                    Action::JumpTo(i) => {
                        let allowed = i < wf.steps().len() && (wf.is_complete(i) || i <= before.0);
                        let result = wf.jump_to(i);
                        prop_assert_eq!(result.is_ok(), allowed);
                        result.is_err()
                    }
                };

                if rejected {
                    prop_assert_eq!(observe(&wf), before);
                }
            }
        }
    }
}
