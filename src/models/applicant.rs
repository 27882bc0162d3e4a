//! Joint-account applicant models

use serde::{Deserialize, Serialize};

use super::field::StepData;
use super::ids::InvitationId;

/// The second applicant being invited to a joint account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerInvite {
    pub full_name: String,
    pub email: String,
}

impl PartnerInvite {
    /// Read an invite out of the validated partner step
    pub fn from_step_data(data: &StepData) -> Option<Self> {
        Some(Self {
            full_name: data.text("partner_full_name")?.to_string(),
            email: data.text("partner_email")?.to_string(),
        })
    }
}

/// Confirmation that an invitation went out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationReceipt {
    pub invitation_id: InvitationId,
    pub sent_to: String,
}
