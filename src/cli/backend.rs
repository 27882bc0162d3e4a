//! Simulated banking backend for the terminal drivers
//!
//! Stands in for the real invitation and payment services. Failures can be
//! injected to exercise the retry paths.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::models::{ConfirmationId, InvitationId, InvitationReceipt, PartnerInvite, PaymentDetails};
use crate::services::InvitationSender;
use crate::workflow::{AggregateRecord, CommitGateway, CommitReceipt, SideEffectError};

/// Accepts every request after the first `fail_first` calls
#[derive(Debug, Default)]
pub struct SimulatedBackend {
    fail_first: u32,
    calls: AtomicU32,
}

impl SimulatedBackend {
    pub fn new(fail_first: u32) -> Self {
        Self {
            fail_first,
            calls: AtomicU32::new(0),
        }
    }

    /// Number of requests received, failed ones included
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn attempt(&self, what: &str) -> Result<(), SideEffectError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            tracing::debug!(call, what, "simulated failure");
            return Err(SideEffectError::new(format!("{} service unavailable", what)));
        }
        Ok(())
    }
}

#[async_trait]
impl InvitationSender for SimulatedBackend {
    async fn send_invitation(
        &self,
        invite: &PartnerInvite,
    ) -> Result<InvitationReceipt, SideEffectError> {
        self.attempt("Invitation")?;
        Ok(InvitationReceipt {
            invitation_id: InvitationId::new(),
            sent_to: invite.email.clone(),
        })
    }
}

#[async_trait]
impl CommitGateway<PaymentDetails> for SimulatedBackend {
    async fn attempt_commit(
        &self,
        _details: &PaymentDetails,
    ) -> Result<CommitReceipt, SideEffectError> {
        self.attempt("Payment")?;
        Ok(CommitReceipt::new(ConfirmationId::new().to_string()))
    }
}

#[async_trait]
impl CommitGateway<AggregateRecord> for SimulatedBackend {
    async fn attempt_commit(
        &self,
        record: &AggregateRecord,
    ) -> Result<CommitReceipt, SideEffectError> {
        if !record.is_complete() {
            return Err(SideEffectError::new(format!(
                "Application incomplete: missing {}",
                record.missing_fields().join(", ")
            )));
        }
        self.attempt("Application")?;
        Ok(CommitReceipt::new(ConfirmationId::new().to_string()))
    }
}
