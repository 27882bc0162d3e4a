//! Interactive payment
//!
//! Entry, review, authorization, then execution. A failed payment drops
//! back to review so the user can try again or change the details.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Args;

use crate::config::Settings;
use crate::display::{format_details, format_validation_errors};
use crate::error::{FlowError, FlowResult};
use crate::models::{FormInput, PaymentDirectory};
use crate::services::PaymentSession;
use crate::workflow::{CommitReceipt, SubmissionPhase};

use super::audit::export_audit;
use super::backend::SimulatedBackend;
use super::prompt::Prompter;

/// Options for `bankflow pay`
#[derive(Args, Debug, Clone, Default)]
pub struct PayArgs {
    /// Make the first N payment attempts fail
    #[arg(long, default_value_t = 0)]
    pub fail_first: u32,

    /// Write the session's audit trail to this file as JSON lines
    #[arg(long)]
    pub audit: Option<PathBuf>,
}

/// Run one payment; `None` if the user cancels
pub async fn run_payment<R: BufRead, W: Write>(
    settings: &Settings,
    args: &PayArgs,
    prompter: &mut Prompter<R, W>,
) -> FlowResult<Option<CommitReceipt>> {
    let backend = SimulatedBackend::new(args.fail_first);
    let mut session = PaymentSession::new(settings, PaymentDirectory::sample());

    prompter.say("Make a Payment")?;

    let result = drive(&mut session, &backend, prompter).await;

    if let Some(path) = &args.audit {
        export_audit(path, &[session.controller().audit()])?;
    }

    result
}

async fn drive<R: BufRead, W: Write>(
    session: &mut PaymentSession,
    backend: &SimulatedBackend,
    prompter: &mut Prompter<R, W>,
) -> FlowResult<Option<CommitReceipt>> {
    let mut prefill = FormInput::new();

    loop {
        match session.phase() {
            SubmissionPhase::Entry => {
                let input = prompt_details(session, &prefill, prompter)?;
                match session.submit_details(&input) {
                    Ok(_) => {}
                    Err(FlowError::Validation(errors)) => {
                        prompter.say("Please fix the following:")?;
                        prompter.say(format_validation_errors(&errors))?;
                    }
                    Err(err) => return Err(err),
                }
                prefill = input;
            }
            SubmissionPhase::Review => {
                prompter.say("")?;
                prompter.say("Review Payment")?;
                prompter.say(format_details(&session.review_lines()))?;

                let answer =
                    prompter.prompt_string("Confirm & pay? [y]es / [e]dit / [n]o: ")?;
                match answer.to_lowercase().as_str() {
                    "y" | "yes" => {
                        if let Some(text) = session.authorization_prompt() {
                            prompter.say(text)?;
                        }
                        if prompter.confirm("Authorize payment?")? {
                            session.confirm()?;
                        }
                    }
                    "e" | "edit" => prefill = session.edit_details()?,
                    _ => {
                        prompter.say("Payment cancelled.")?;
                        return Ok(None);
                    }
                }
            }
            SubmissionPhase::Confirmed => {
                prompter.say("Processing payment...")?;
                match session.commit(backend).await {
                    Ok(receipt) => {
                        prompter.say(format!("Payment sent. Confirmation: {}", receipt.reference))?;
                        return Ok(Some(receipt));
                    }
                    Err(err) if err.is_side_effect_failure() => {
                        prompter.say(format!("Payment failed: {}", err))?;
                    }
                    Err(err) => return Err(err),
                }
            }
            SubmissionPhase::Committed => {
                return Ok(session.controller().receipt().cloned());
            }
        }
    }
}

fn prompt_details<R: BufRead, W: Write>(
    session: &PaymentSession,
    prefill: &FormInput,
    prompter: &mut Prompter<R, W>,
) -> FlowResult<FormInput> {
    let directory = session.directory();

    let account = prompter.choose(
        "Pay from",
        &directory.accounts,
        prefill.get("account_from"),
    )?;
    let payee = prompter.choose("Pay to", &directory.payees, prefill.get("payee"))?;
    let amount = prompter.prompt_with_default("Amount", prefill.get("amount"))?;
    let reference =
        prompter.prompt_with_default("Reference (optional)", prefill.get("reference"))?;

    Ok(FormInput::new()
        .with("account_from", account)
        .with("payee", payee)
        .with("amount", amount)
        .with("reference", reference))
}
