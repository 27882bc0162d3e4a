//! Staged workflow engine
//!
//! The engine behind multi-step flows such as opening a joint account or
//! initiating a payment:
//!
//! - `step`: step definitions and the immutable, ordered registry
//! - `validation`: field rules and the validator trait
//! - `machine`: the workflow state machine (cursor, committed data, gating)
//! - `aggregate`: merges committed step data into one reviewable record
//! - `submission`: review / confirm / commit controller for irrevocable actions
//! - `effect`: contracts for the external side effects the caller performs
//!
//! # Example
//!
//! ```rust,ignore
//! let mut workflow = WorkflowState::new(registry, mapping)?;
//! workflow.submit_step(0, &input)?;
//! workflow.advance()?;
//! ```

pub mod aggregate;
pub mod effect;
pub mod machine;
pub mod step;
pub mod submission;
pub mod validation;

pub use aggregate::{build_aggregate, AggregateRecord, FieldMapping, FieldSlot};
pub use effect::{CommitGateway, CommitReceipt, SideEffectError};
pub use machine::{Advance, SubmitOutcome, WorkflowSnapshot, WorkflowState};
pub use step::{StepDefinition, StepId, StepRegistry};
pub use submission::{SubmissionController, SubmissionPhase, SubmissionSnapshot};
pub use validation::{FieldError, FieldSpec, FormSchema, StepValidator, ValidationErrors};
