//! Audit entry data structures
//!
//! Defines the structure of audit entries: which transition was attempted,
//! on which session and subject, and whether it was accepted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::SessionId;

/// Transitions that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    SubmitStep,
    AcknowledgeSideEffect,
    SendInvitation,
    Advance,
    Retreat,
    JumpTo,
    SubmitForReview,
    EditDetails,
    Confirm,
    Commit,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::SubmitStep => write!(f, "SUBMIT_STEP"),
            Operation::AcknowledgeSideEffect => write!(f, "ACK_SIDE_EFFECT"),
            Operation::SendInvitation => write!(f, "SEND_INVITATION"),
            Operation::Advance => write!(f, "ADVANCE"),
            Operation::Retreat => write!(f, "RETREAT"),
            Operation::JumpTo => write!(f, "JUMP_TO"),
            Operation::SubmitForReview => write!(f, "SUBMIT_FOR_REVIEW"),
            Operation::EditDetails => write!(f, "EDIT_DETAILS"),
            Operation::Confirm => write!(f, "CONFIRM"),
            Operation::Commit => write!(f, "COMMIT"),
        }
    }
}

/// Whether the attempted transition was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Accepted,
    Rejected,
}

/// A single audit entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the transition was attempted (UTC)
    pub timestamp: DateTime<Utc>,

    /// Workflow or submission session the entry belongs to
    pub session: SessionId,

    pub operation: Operation,

    pub outcome: Outcome,

    /// Step id or submission phase the transition applied to
    pub subject: String,

    /// Error message for rejections, short summary otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AuditEntry {
    pub fn accepted(session: SessionId, operation: Operation, subject: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            session,
            operation,
            outcome: Outcome::Accepted,
            subject: subject.into(),
            detail: None,
        }
    }

    pub fn rejected(
        session: SessionId,
        operation: Operation,
        subject: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            session,
            operation,
            outcome: Outcome::Rejected,
            subject: subject.into(),
            detail: Some(reason.into()),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_rejected(&self) -> bool {
        self.outcome == Outcome::Rejected
    }
}
