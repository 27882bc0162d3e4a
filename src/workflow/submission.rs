//! Staged submission controller
//!
//! Separates "data entry validated" from "user explicitly confirmed the
//! irrevocable action". Phases are strictly linear:
//!
//! ```text
//! Entry -> Review -> Confirmed -> Committed
//!   ^        |
//!   +--------+ edit_details
//! ```
//!
//! `confirm` is a pure transition. Only `commit` reaches the outside world,
//! only from `Confirmed`, and at most once: a failed commit drops back to
//! `Review` so the user must confirm again, and a commit call after
//! `Committed` returns the original receipt without repeating the effect.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::effect::{CommitGateway, CommitReceipt};
use crate::audit::{AuditEntry, AuditTrail, Operation};
use crate::error::{FlowError, FlowResult};
use crate::models::SessionId;

/// Phase of a staged submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmissionPhase {
    Entry,
    Review,
    Confirmed,
    Committed,
}

impl fmt::Display for SubmissionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry => write!(f, "Entry"),
            Self::Review => write!(f, "Review"),
            Self::Confirmed => write!(f, "Confirmed"),
            Self::Committed => write!(f, "Committed"),
        }
    }
}

/// Read-only view of a submission for the rendering layer
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSnapshot<T> {
    pub session: SessionId,
    pub phase: SubmissionPhase,
    pub draft: Option<T>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub receipt: Option<CommitReceipt>,
}

/// Drives one record through review, confirmation and commit
#[derive(Debug)]
pub struct SubmissionController<T> {
    session: SessionId,
    phase: SubmissionPhase,
    draft: Option<T>,
    confirmed_at: Option<DateTime<Utc>>,
    receipt: Option<CommitReceipt>,
    commit_attempts: u32,
    audit: AuditTrail,
}

impl<T> Default for SubmissionController<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SubmissionController<T> {
    pub fn new() -> Self {
        Self {
            session: SessionId::new(),
            phase: SubmissionPhase::Entry,
            draft: None,
            confirmed_at: None,
            receipt: None,
            commit_attempts: 0,
            audit: AuditTrail::new(),
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    /// The record under review; kept through `edit_details` for pre-filling
    pub fn draft(&self) -> Option<&T> {
        self.draft.as_ref()
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    pub fn receipt(&self) -> Option<&CommitReceipt> {
        self.receipt.as_ref()
    }

    /// Number of times the external commit was actually invoked
    pub fn commit_attempts(&self) -> u32 {
        self.commit_attempts
    }

    pub fn is_committed(&self) -> bool {
        self.phase == SubmissionPhase::Committed
    }

    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// Entry -> Review, storing an already validated record as the draft
    pub fn submit_for_review(&mut self, record: T) -> FlowResult<()> {
        self.require(Operation::SubmitForReview, "submit for review", SubmissionPhase::Entry)?;

        self.draft = Some(record);
        self.transition(Operation::SubmitForReview, SubmissionPhase::Review);
        Ok(())
    }

    /// Review -> Entry; the draft stays available for pre-filling the form
    pub fn edit_details(&mut self) -> FlowResult<Option<&T>> {
        self.require(Operation::EditDetails, "edit details", SubmissionPhase::Review)?;

        self.transition(Operation::EditDetails, SubmissionPhase::Entry);
        Ok(self.draft.as_ref())
    }

    /// Review -> Confirmed; records when the user confirmed, triggers nothing
    pub fn confirm(&mut self) -> FlowResult<DateTime<Utc>> {
        self.require(Operation::Confirm, "confirm", SubmissionPhase::Review)?;

        let now = Utc::now();
        self.confirmed_at = Some(now);
        self.transition(Operation::Confirm, SubmissionPhase::Confirmed);
        Ok(now)
    }

    /// Invoke the external commit for the confirmed draft
    ///
    /// The phase changes only after the gateway has resolved. On failure the
    /// submission returns to `Review` with the confirmation cleared.
    pub async fn commit<G>(&mut self, gateway: &G) -> FlowResult<CommitReceipt>
    where
        T: Sync,
        G: CommitGateway<T> + ?Sized,
    {
        if let Some(receipt) = &self.receipt {
            tracing::debug!(session = %self.session, reference = %receipt.reference, "commit already done, returning original receipt");
            let receipt = receipt.clone();
            self.audit.record(
                AuditEntry::accepted(self.session, Operation::Commit, self.phase.to_string())
                    .with_detail("already committed; effect not repeated"),
            );
            return Ok(receipt);
        }

        self.require(Operation::Commit, "commit", SubmissionPhase::Confirmed)?;

        let Some(draft) = self.draft.as_ref() else {
            return Err(self.reject(
                Operation::Commit,
                FlowError::InvalidPhase {
                    operation: "commit",
                    phase: self.phase,
                },
            ));
        };

        self.commit_attempts += 1;
        let result = gateway.attempt_commit(draft).await;

        match result {
            Ok(receipt) => {
                tracing::info!(session = %self.session, reference = %receipt.reference, "commit succeeded");
                self.receipt = Some(receipt.clone());
                self.transition(Operation::Commit, SubmissionPhase::Committed);
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(session = %self.session, error = %err, "commit failed, back to review");
                self.confirmed_at = None;
                self.phase = SubmissionPhase::Review;
                self.audit.record(AuditEntry::rejected(
                    self.session,
                    Operation::Commit,
                    SubmissionPhase::Confirmed.to_string(),
                    err.to_string(),
                ));
                Err(FlowError::SideEffectFailure(err.message))
            }
        }
    }

    pub fn snapshot(&self) -> SubmissionSnapshot<T>
    where
        T: Clone,
    {
        SubmissionSnapshot {
            session: self.session,
            phase: self.phase,
            draft: self.draft.clone(),
            confirmed_at: self.confirmed_at,
            receipt: self.receipt.clone(),
        }
    }

    fn require(
        &mut self,
        operation: Operation,
        name: &'static str,
        expected: SubmissionPhase,
    ) -> FlowResult<()> {
        if self.phase == expected {
            return Ok(());
        }

        let err = FlowError::InvalidPhase {
            operation: name,
            phase: self.phase,
        };
        Err(self.reject(operation, err))
    }

    fn transition(&mut self, operation: Operation, to: SubmissionPhase) {
        let from = self.phase;
        self.phase = to;

        tracing::debug!(session = %self.session, %from, %to, "submission phase changed");
        self.audit.record(
            AuditEntry::accepted(self.session, operation, from.to_string())
                .with_detail(format!("{} -> {}", from, to)),
        );
    }

    pub(crate) fn reject(&mut self, operation: Operation, err: FlowError) -> FlowError {
        tracing::warn!(session = %self.session, %operation, phase = %self.phase, error = %err, "submission transition rejected");
        self.audit.record(AuditEntry::rejected(
            self.session,
            operation,
            self.phase.to_string(),
            err.to_string(),
        ));
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::effect::SideEffectError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Payment {
        amount: u32,
        payee: &'static str,
    }

    /// Counts calls; fails the first `failures` of them
    struct CountingGateway {
        calls: AtomicU32,
        failures: u32,
    }

    impl CountingGateway {
        fn succeeding() -> Self {
            Self::failing_first(0)
        }

        fn failing_first(failures: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CommitGateway<Payment> for CountingGateway {
        async fn attempt_commit(&self, record: &Payment) -> Result<CommitReceipt, SideEffectError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(SideEffectError::new("bank unavailable"));
            }
            Ok(CommitReceipt::new(format!("pay-{}-{}", record.payee, call)))
        }
    }

    fn payment() -> Payment {
        Payment {
            amount: 50,
            payee: "p1",
        }
    }

    #[tokio::test]
    async fn test_payment_scenario() {
        let mut controller = SubmissionController::new();

        controller.submit_for_review(payment()).unwrap();
        assert_eq!(controller.phase(), SubmissionPhase::Review);

        let draft = controller.edit_details().unwrap().cloned();
        assert_eq!(controller.phase(), SubmissionPhase::Entry);
        assert_eq!(draft.map(|p| p.amount), Some(50));

        controller.submit_for_review(payment()).unwrap();
        controller.confirm().unwrap();
        assert_eq!(controller.phase(), SubmissionPhase::Confirmed);
        assert!(controller.confirmed_at().is_some());

        let failing = CountingGateway::failing_first(1);
        let err = controller.commit(&failing).await.unwrap_err();
        assert!(err.is_side_effect_failure());
        assert_eq!(controller.phase(), SubmissionPhase::Review);
        assert!(controller.confirmed_at().is_none());

        controller.confirm().unwrap();
        let succeeding = CountingGateway::succeeding();
        let receipt = controller.commit(&succeeding).await.unwrap();
        assert_eq!(controller.phase(), SubmissionPhase::Committed);
        assert_eq!(succeeding.calls(), 1);
        assert_eq!(receipt.reference, "pay-p1-1");
    }

    #[tokio::test]
    async fn test_double_commit_invokes_effect_once() {
        let mut controller = SubmissionController::new();
        controller.submit_for_review(payment()).unwrap();
        controller.confirm().unwrap();

        let gateway = CountingGateway::succeeding();
        let first = controller.commit(&gateway).await.unwrap();
        let second = controller.commit(&gateway).await.unwrap();

        assert_eq!(gateway.calls(), 1);
        assert_eq!(controller.commit_attempts(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_commit_requires_confirmation() {
        let mut controller = SubmissionController::new();
        let gateway = CountingGateway::succeeding();

        let err = controller.commit(&gateway).await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::InvalidPhase {
                phase: SubmissionPhase::Entry,
                ..
            }
        ));

        controller.submit_for_review(payment()).unwrap();
        assert!(controller.commit(&gateway).await.is_err());
        assert_eq!(gateway.calls(), 0);
        assert_eq!(controller.phase(), SubmissionPhase::Review);
    }

    #[test]
    fn test_phase_order_is_enforced() {
        let mut controller: SubmissionController<Payment> = SubmissionController::new();

        assert!(controller.confirm().is_err());
        assert!(controller.edit_details().is_err());

        controller.submit_for_review(payment()).unwrap();
        assert!(controller.submit_for_review(payment()).is_err());

        controller.confirm().unwrap();
        // No going back to entry once confirmed
        assert!(controller.edit_details().is_err());
        assert!(controller.confirm().is_err());
        assert_eq!(controller.phase(), SubmissionPhase::Confirmed);
        assert_eq!(controller.audit().rejected().count(), 5);
    }

    #[test]
    fn test_snapshot() {
        let mut controller = SubmissionController::new();
        controller.submit_for_review(payment()).unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, SubmissionPhase::Review);
        assert_eq!(snapshot.draft, Some(payment()));
        assert!(snapshot.receipt.is_none());
    }
}
