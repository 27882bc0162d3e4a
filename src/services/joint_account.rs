//! Joint-account application service
//!
//! Three steps: the applicant's own details, inviting the partner (gated on
//! the invitation actually being sent), and a final review where the terms
//! are accepted. Finishing the steps puts the aggregated application under
//! review; it is submitted only after an explicit confirmation.

use async_trait::async_trait;

use crate::audit::Operation;
use crate::config::Settings;
use crate::error::{FlowError, FlowResult};
use crate::models::{FormInput, InvitationReceipt, PartnerInvite};
use crate::workflow::{
    Advance, AggregateRecord, CommitGateway, CommitReceipt, FieldMapping, FieldSpec, FormSchema,
    SideEffectError, StepDefinition, StepRegistry, SubmissionController, SubmissionPhase,
    SubmitOutcome, WorkflowState,
};

pub const APPLICANT_STEP: &str = "applicant";
pub const PARTNER_STEP: &str = "partner";
pub const REVIEW_STEP: &str = "review";

/// Aggregate fields with the labels shown on the review screen
pub const REVIEW_LABELS: &[(&str, &str)] = &[
    ("full_name", "Your Name"),
    ("email", "Your Email"),
    ("phone", "Your Phone"),
    ("partner_full_name", "Invited Partner"),
    ("partner_email", "Partner's Email"),
];

/// Sends the partner their invitation to join the application
#[async_trait]
pub trait InvitationSender: Send + Sync {
    async fn send_invitation(
        &self,
        invite: &PartnerInvite,
    ) -> Result<InvitationReceipt, SideEffectError>;
}

/// The three joint-account steps
pub fn joint_account_steps(settings: &Settings) -> FlowResult<StepRegistry> {
    let applicant = FormSchema::new()
        .field(FieldSpec::text("full_name").min_len(2, "Full name is required."))
        .field(FieldSpec::text("email").email("Invalid email address."))
        .field(FieldSpec::text("phone").min_digits(
            settings.min_phone_digits,
            "Valid phone number is required.",
        ));

    let partner = FormSchema::new()
        .field(FieldSpec::text("partner_full_name").min_len(2, "Partner's full name is required."))
        .field(FieldSpec::text("partner_email").email("Invalid partner email address."));

    let review = FormSchema::new().field(
        FieldSpec::flag("terms_accepted").accepted("You must accept the terms and conditions."),
    );

    StepRegistry::new(vec![
        StepDefinition::new(APPLICANT_STEP, "Your Details", applicant),
        StepDefinition::new(PARTNER_STEP, "Invite Partner", partner).with_external_confirmation(),
        StepDefinition::new(REVIEW_STEP, "Review & Confirm", review),
    ])
}

/// How step data lands in the application record
pub fn joint_account_mapping() -> FieldMapping {
    FieldMapping::new()
        .same(APPLICANT_STEP, &["full_name", "email", "phone"])
        .same(PARTNER_STEP, &["partner_full_name", "partner_email"])
        .same(REVIEW_STEP, &["terms_accepted"])
}

/// One joint-account application session
#[derive(Debug)]
pub struct JointAccountApplication {
    workflow: WorkflowState,
    submission: SubmissionController<AggregateRecord>,
    invitation: Option<InvitationReceipt>,
}

impl JointAccountApplication {
    pub fn new(settings: &Settings) -> FlowResult<Self> {
        Ok(Self {
            workflow: WorkflowState::new(joint_account_steps(settings)?, joint_account_mapping())?,
            submission: SubmissionController::new(),
            invitation: None,
        })
    }

    pub fn workflow(&self) -> &WorkflowState {
        &self.workflow
    }

    pub fn submission(&self) -> &SubmissionController<AggregateRecord> {
        &self.submission
    }

    /// Receipt of the invitation for the currently entered partner, if sent
    pub fn invitation(&self) -> Option<&InvitationReceipt> {
        self.invitation.as_ref()
    }

    /// Submit input for the step currently on screen
    pub fn submit_current(&mut self, input: &FormInput) -> FlowResult<SubmitOutcome> {
        let index = self.workflow.current_index();
        self.submit_step(index, input)
    }

    pub fn submit_step(&mut self, index: usize, input: &FormInput) -> FlowResult<SubmitOutcome> {
        self.ensure_not_frozen(Operation::SubmitStep, "edit the application")?;

        let outcome = self.workflow.submit_step(index, input)?;
        if index == self.partner_index() && outcome == SubmitOutcome::AwaitingSideEffect {
            // A changed partner needs a new invitation
            self.invitation = None;
        }
        self.reopen_review()?;
        Ok(outcome)
    }

    /// Send the partner invitation, then unlock the partner step
    ///
    /// Once sent for the current partner details, further calls return the
    /// original receipt instead of sending again.
    pub async fn send_invitation<S>(&mut self, sender: &S) -> FlowResult<InvitationReceipt>
    where
        S: InvitationSender + ?Sized,
    {
        let index = self.partner_index();
        if let Some(receipt) = &self.invitation {
            if self.workflow.is_complete(index) {
                return Ok(receipt.clone());
            }
        }

        self.ensure_not_frozen(Operation::SendInvitation, "send an invitation")?;

        let Some(invite) = self
            .workflow
            .committed(index)
            .and_then(PartnerInvite::from_step_data)
        else {
            let err =
                FlowError::out_of_order("send_invitation", "partner details have not been entered");
            return Err(self
                .workflow
                .reject(Operation::SendInvitation, PARTNER_STEP.to_string(), err));
        };

        match sender.send_invitation(&invite).await {
            Ok(receipt) => {
                tracing::info!(session = %self.workflow.session(), invitation = %receipt.invitation_id, "partner invited");
                self.workflow.acknowledge_side_effect(index)?;
                self.invitation = Some(receipt.clone());
                self.reopen_review()?;
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(session = %self.workflow.session(), error = %err, "invitation failed");
                Err(FlowError::SideEffectFailure(err.message))
            }
        }
    }

    /// Move forward; finishing the last step puts the application under review
    pub fn advance(&mut self) -> FlowResult<Advance> {
        self.ensure_not_frozen(Operation::Advance, "continue the application")?;

        let advance = self.workflow.advance()?;
        match (advance, self.submission.phase()) {
            (Advance::Finished, SubmissionPhase::Entry) => {
                self.submission
                    .submit_for_review(self.workflow.aggregate().clone())?;
            }
            // Already under review with the current answers
            (Advance::Finished, _) => {}
            (Advance::Moved { .. }, _) => self.reopen_review()?,
        }
        Ok(advance)
    }

    pub fn retreat(&mut self) -> FlowResult<usize> {
        self.ensure_not_frozen(Operation::Retreat, "go back")?;
        let index = self.workflow.retreat()?;
        self.reopen_review()?;
        Ok(index)
    }

    pub fn jump_to(&mut self, index: usize) -> FlowResult<usize> {
        self.ensure_not_frozen(Operation::JumpTo, "change step")?;
        let index = self.workflow.jump_to(index)?;
        self.reopen_review()?;
        Ok(index)
    }

    /// Leave review and return to editing the steps
    pub fn edit_details(&mut self) -> FlowResult<()> {
        self.submission.edit_details().map(|_| ())
    }

    pub fn confirm(&mut self) -> FlowResult<()> {
        self.submission.confirm().map(|_| ())
    }

    /// Submit the confirmed application
    pub async fn commit<G>(&mut self, gateway: &G) -> FlowResult<CommitReceipt>
    where
        G: CommitGateway<AggregateRecord> + ?Sized,
    {
        self.submission.commit(gateway).await
    }

    fn partner_index(&self) -> usize {
        self.workflow.steps().index_of(PARTNER_STEP).unwrap_or(1)
    }

    /// A confirmed or committed application can no longer change
    fn ensure_not_frozen(&mut self, operation: Operation, name: &'static str) -> FlowResult<()> {
        match self.submission.phase() {
            SubmissionPhase::Entry | SubmissionPhase::Review => Ok(()),
            phase => {
                let err = FlowError::InvalidPhase {
                    operation: name,
                    phase,
                };
                Err(self.submission.reject(operation, err))
            }
        }
    }

    /// Called after a step change was accepted; a pending review is stale
    fn reopen_review(&mut self) -> FlowResult<()> {
        if self.submission.phase() == SubmissionPhase::Review {
            self.edit_details()?;
        }
        Ok(())
    }
}
