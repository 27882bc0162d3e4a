//! Payment service
//!
//! A single-form flow wrapped in the review / confirm / commit lifecycle:
//! details are validated, shown back for review, and the payment is sent
//! only after the user explicitly authorizes it.

use crate::audit::Operation;
use crate::config::Settings;
use crate::error::{FlowError, FlowResult};
use crate::models::{FormInput, PaymentDetails, PaymentDirectory};
use crate::workflow::{
    CommitGateway, CommitReceipt, FieldError, FieldSpec, FormSchema, StepValidator,
    SubmissionController, SubmissionPhase, ValidationErrors,
};

/// Form rules for a payment instruction
pub fn payment_schema(settings: &Settings) -> FormSchema {
    FormSchema::new()
        .field(FieldSpec::text("account_from").required("Please select an account to pay from."))
        .field(FieldSpec::text("payee").required("Please select a payee."))
        .field(FieldSpec::amount("amount").positive("Amount must be positive."))
        .field(
            FieldSpec::text("reference")
                .optional()
                .max_len(settings.reference_max_length, "Reference too long."),
        )
}

/// One payment from entry through to execution
#[derive(Debug)]
pub struct PaymentSession {
    schema: FormSchema,
    directory: PaymentDirectory,
    currency_symbol: String,
    controller: SubmissionController<PaymentDetails>,
    last_errors: Option<ValidationErrors>,
}

impl PaymentSession {
    pub fn new(settings: &Settings, directory: PaymentDirectory) -> Self {
        Self {
            schema: payment_schema(settings),
            directory,
            currency_symbol: settings.currency_symbol.clone(),
            controller: SubmissionController::new(),
            last_errors: None,
        }
    }

    pub fn directory(&self) -> &PaymentDirectory {
        &self.directory
    }

    pub fn controller(&self) -> &SubmissionController<PaymentDetails> {
        &self.controller
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.controller.phase()
    }

    pub fn draft(&self) -> Option<&PaymentDetails> {
        self.controller.draft()
    }

    pub fn last_errors(&self) -> Option<&ValidationErrors> {
        self.last_errors.as_ref()
    }

    /// Validate the entered details and move them to review
    pub fn submit_details(&mut self, input: &FormInput) -> FlowResult<&PaymentDetails> {
        let phase = self.controller.phase();
        if phase != SubmissionPhase::Entry {
            let err = FlowError::InvalidPhase {
                operation: "submit payment details",
                phase,
            };
            return Err(self.controller.reject(Operation::SubmitForReview, err));
        }

        let details = match self.validate(input) {
            Ok(details) => details,
            Err(errors) => {
                tracing::debug!(errors = %errors, "payment details rejected");
                self.last_errors = Some(errors.clone());
                return Err(FlowError::Validation(errors));
            }
        };

        self.last_errors = None;
        self.controller.submit_for_review(details)?;
        self.controller
            .draft()
            .ok_or_else(|| FlowError::out_of_order("submit_details", "no draft after review"))
    }

    /// Back to entry; returns the draft as form input for pre-filling
    pub fn edit_details(&mut self) -> FlowResult<FormInput> {
        let draft = self.controller.edit_details()?;
        Ok(draft.map(details_to_input).unwrap_or_default())
    }

    pub fn confirm(&mut self) -> FlowResult<()> {
        self.controller.confirm().map(|_| ())
    }

    /// Execute the authorized payment; repeated calls never pay twice
    pub async fn commit<G>(&mut self, gateway: &G) -> FlowResult<CommitReceipt>
    where
        G: CommitGateway<PaymentDetails> + ?Sized,
    {
        self.controller.commit(gateway).await
    }

    /// Label/value pairs for the review screen
    pub fn review_lines(&self) -> Vec<(&'static str, String)> {
        let Some(details) = self.controller.draft() else {
            return Vec::new();
        };

        let mut lines = vec![
            (
                "From Account",
                self.directory
                    .account_name(&details.account_from)
                    .unwrap_or(&details.account_from)
                    .to_string(),
            ),
            ("To Payee", self.payee_label(details)),
            (
                "Amount",
                details.amount.format_with_symbol(&self.currency_symbol),
            ),
        ];
        if let Some(reference) = &details.reference {
            lines.push(("Reference", reference.clone()));
        }
        lines
    }

    /// The final "are you sure" text shown before authorizing
    pub fn authorization_prompt(&self) -> Option<String> {
        let details = self.controller.draft()?;
        Some(format!(
            "You are about to authorize a payment of {} to {}. This action cannot be undone.",
            details.amount.format_with_symbol(&self.currency_symbol),
            self.payee_label(details)
        ))
    }

    fn payee_label(&self, details: &PaymentDetails) -> String {
        self.directory
            .payee_name(&details.payee)
            .unwrap_or(&details.payee)
            .to_string()
    }

    fn validate(&self, input: &FormInput) -> Result<PaymentDetails, ValidationErrors> {
        let data = self.schema.validate(input)?;
        let details = PaymentDetails::from_step_data(&data).ok_or_else(|| {
            ValidationErrors::single("amount", "Enter a valid amount.")
        })?;

        // Only ids the user could have picked are accepted
        let mut errors = ValidationErrors::new();
        if self.directory.account_name(&details.account_from).is_none() {
            errors.push(FieldError::new("account_from", "Please select an account to pay from."));
        }
        if self.directory.payee_name(&details.payee).is_none() {
            errors.push(FieldError::new("payee", "Please select a payee."));
        }

        if errors.is_empty() {
            Ok(details)
        } else {
            Err(errors)
        }
    }
}

fn details_to_input(details: &PaymentDetails) -> FormInput {
    let mut input = FormInput::new()
        .with("account_from", details.account_from.as_str())
        .with("payee", details.payee.as_str())
        .with("amount", details.amount.format_with_symbol(""));
    if let Some(reference) = &details.reference {
        input.set("reference", reference.as_str());
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use crate::workflow::SideEffectError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Bank {
        calls: AtomicU32,
        fail_first: u32,
    }

    impl Bank {
        fn new(fail_first: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_first,
            }
        }
    }

    #[async_trait]
    impl CommitGateway<PaymentDetails> for Bank {
        async fn attempt_commit(
            &self,
            details: &PaymentDetails,
        ) -> Result<CommitReceipt, SideEffectError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(SideEffectError::new("payment rejected by bank"));
            }
            Ok(CommitReceipt::new(format!("PAY-{}", details.payee)))
        }
    }

    fn session() -> PaymentSession {
        PaymentSession::new(&Settings::default(), PaymentDirectory::sample())
    }

    fn input() -> FormInput {
        FormInput::new()
            .with("account_from", "acc1")
            .with("payee", "p1")
            .with("amount", "50")
    }

    #[tokio::test]
    async fn test_payment_happy_path() {
        let mut payment = session();

        let details = payment.submit_details(&input()).unwrap();
        assert_eq!(details.amount, Money::from_minor(5000));
        assert_eq!(payment.phase(), SubmissionPhase::Review);
        assert_eq!(
            payment.authorization_prompt().unwrap(),
            "You are about to authorize a payment of £50.00 to John Doe (Savings). This action cannot be undone."
        );

        payment.confirm().unwrap();
        let bank = Bank::new(0);
        let receipt = payment.commit(&bank).await.unwrap();
        assert_eq!(receipt.reference, "PAY-p1");

        // A second click does not pay again
        payment.commit(&bank).await.unwrap();
        assert_eq!(bank.calls.load(Ordering::SeqCst), 1);
        assert_eq!(payment.phase(), SubmissionPhase::Committed);
    }

    #[tokio::test]
    async fn test_commit_before_confirm_rejected() {
        let mut payment = session();
        payment.submit_details(&input()).unwrap();

        let bank = Bank::new(0);
        assert!(payment.commit(&bank).await.is_err());
        assert_eq!(bank.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_payment_returns_to_review() {
        let mut payment = session();
        payment.submit_details(&input()).unwrap();
        payment.confirm().unwrap();

        let bank = Bank::new(1);
        assert!(payment.commit(&bank).await.unwrap_err().is_side_effect_failure());
        assert_eq!(payment.phase(), SubmissionPhase::Review);

        payment.confirm().unwrap();
        payment.commit(&bank).await.unwrap();
        assert_eq!(bank.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_validation_messages() {
        let mut payment = session();
        let err = payment
            .submit_details(&FormInput::new().with("amount", "0").with("reference", "x".repeat(51)))
            .unwrap_err();

        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.message_for("account_from"), Some("Please select an account to pay from."));
        assert_eq!(errors.message_for("payee"), Some("Please select a payee."));
        assert_eq!(errors.message_for("amount"), Some("Amount must be positive."));
        assert_eq!(errors.message_for("reference"), Some("Reference too long."));
        assert_eq!(payment.phase(), SubmissionPhase::Entry);
        assert!(payment.last_errors().is_some());
    }

    #[test]
    fn test_unknown_payee_rejected() {
        let mut payment = session();
        let err = payment
            .submit_details(&input().with("payee", "new"))
            .unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().message_for("payee"),
            Some("Please select a payee.")
        );
    }

    #[test]
    fn test_edit_prefills_draft() {
        let mut payment = session();
        payment
            .submit_details(&input().with("reference", "Rent"))
            .unwrap();

        let prefill = payment.edit_details().unwrap();
        assert_eq!(payment.phase(), SubmissionPhase::Entry);
        assert_eq!(prefill.get("payee"), Some("p1"));
        assert_eq!(prefill.get("amount"), Some("50.00"));
        assert_eq!(prefill.get("reference"), Some("Rent"));

        // Resubmitting the prefill yields the same payment
        let details = payment.submit_details(&prefill).unwrap();
        assert_eq!(details.reference.as_deref(), Some("Rent"));
    }

    #[test]
    fn test_review_lines() {
        let mut payment = session();
        assert!(payment.review_lines().is_empty());
        payment.submit_details(&input()).unwrap();

        let lines = payment.review_lines();
        assert_eq!(lines[0], ("From Account", "Current Account".to_string()));
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|(label, _)| *label != "Reference"));

        payment.edit_details().unwrap();
        payment
            .submit_details(&input().with("reference", "Rent"))
            .unwrap();
        assert_eq!(payment.review_lines()[3], ("Reference", "Rent".to_string()));
    }

    #[test]
    fn test_resubmit_during_review_rejected_and_audited() {
        let mut payment = session();
        payment.submit_details(&input()).unwrap();

        let err = payment.submit_details(&input()).unwrap_err();
        assert!(matches!(err, FlowError::InvalidPhase { .. }));
        assert_eq!(payment.phase(), SubmissionPhase::Review);

        let rejected: Vec<_> = payment.controller().audit().rejected().collect();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].operation, Operation::SubmitForReview);
    }
}
