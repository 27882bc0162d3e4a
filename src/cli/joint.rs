//! Interactive joint-account application

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Args;

use crate::config::Settings;
use crate::display::{
    format_aggregate_review, format_progress_bar, format_step_header, format_validation_errors,
};
use crate::error::{FlowError, FlowResult};
use crate::models::FormInput;
use crate::services::joint_account::{
    JointAccountApplication, APPLICANT_STEP, PARTNER_STEP, REVIEW_LABELS, REVIEW_STEP,
};
use crate::workflow::{Advance, CommitReceipt, SubmissionPhase, SubmitOutcome};

use super::audit::export_audit;
use super::backend::SimulatedBackend;
use super::prompt::Prompter;

const APPLICANT_FIELDS: &[(&str, &str)] = &[
    ("full_name", "Full name"),
    ("email", "Email address"),
    ("phone", "Phone number"),
];

const PARTNER_FIELDS: &[(&str, &str)] = &[
    ("partner_full_name", "Partner's full name"),
    ("partner_email", "Partner's email address"),
];

const STEP_IDS: &[&str] = &[APPLICANT_STEP, PARTNER_STEP, REVIEW_STEP];

/// Options for `bankflow joint`
#[derive(Args, Debug, Clone, Default)]
pub struct JointArgs {
    /// Make the first N backend requests fail
    #[arg(long, default_value_t = 0)]
    pub fail_first: u32,

    /// Write the session's audit trail to this file as JSON lines
    #[arg(long)]
    pub audit: Option<PathBuf>,
}

/// Walk through the application; `None` if the user cancels
pub async fn run_joint_application<R: BufRead, W: Write>(
    settings: &Settings,
    args: &JointArgs,
    prompter: &mut Prompter<R, W>,
) -> FlowResult<Option<CommitReceipt>> {
    let backend = SimulatedBackend::new(args.fail_first);
    let mut app = JointAccountApplication::new(settings)?;

    prompter.say("Open a Joint Account")?;
    prompter.say("Invite a partner to open a shared account with you.")?;

    let result = drive(settings, &mut app, &backend, prompter).await;

    if let Some(path) = &args.audit {
        export_audit(
            path,
            &[app.workflow().audit(), app.submission().audit()],
        )?;
    }

    result
}

async fn drive<R: BufRead, W: Write>(
    settings: &Settings,
    app: &mut JointAccountApplication,
    backend: &SimulatedBackend,
    prompter: &mut Prompter<R, W>,
) -> FlowResult<Option<CommitReceipt>> {
    loop {
        if app.submission().phase() == SubmissionPhase::Review {
            match review_application(settings, app, backend, prompter).await? {
                ReviewChoice::Submitted(receipt) => return Ok(Some(receipt)),
                ReviewChoice::Cancelled => return Ok(None),
                ReviewChoice::Edit => continue,
            }
        }

        let snapshot = app.workflow().snapshot();
        prompter.say("")?;
        prompter.say(format_step_header(&snapshot))?;
        prompter.say(format_progress_bar(&snapshot, STEP_IDS))?;

        let input = prompt_step(settings, app, prompter)?;
        let outcome = match app.submit_current(&input) {
            Ok(outcome) => outcome,
            Err(FlowError::Validation(errors)) => {
                prompter.say("Please fix the following:")?;
                prompter.say(format_validation_errors(&errors))?;
                continue;
            }
            Err(err) => return Err(err),
        };

        if outcome == SubmitOutcome::AwaitingSideEffect && !send_invitation(app, backend, prompter).await? {
            return Ok(None);
        }

        if app.advance()? == Advance::Finished {
            prompter.say("")?;
            prompter.say("All steps complete.")?;
        }
    }
}

fn prompt_step<R: BufRead, W: Write>(
    settings: &Settings,
    app: &JointAccountApplication,
    prompter: &mut Prompter<R, W>,
) -> FlowResult<FormInput> {
    let workflow = app.workflow();
    let index = workflow.current_index();
    let previous = workflow.committed(index);

    let fields = match workflow.current_step().id().as_str() {
        APPLICANT_STEP => APPLICANT_FIELDS,
        PARTNER_STEP => PARTNER_FIELDS,
        _ => {
            prompter.say("Review your application:")?;
            prompter.say(format_aggregate_review(
                workflow.aggregate(),
                REVIEW_LABELS,
                &settings.currency_symbol,
            ))?;
            let accepted = prompter.confirm("Do you accept the terms and conditions?")?;
            return Ok(FormInput::new().with("terms_accepted", accepted.to_string()));
        }
    };

    let mut input = FormInput::new();
    for (field, label) in fields {
        let default = previous.and_then(|data| data.text(field));
        input.set(*field, prompter.prompt_with_default(label, default)?);
    }
    Ok(input)
}

/// Returns false if the user gives up after a failure
async fn send_invitation<R: BufRead, W: Write>(
    app: &mut JointAccountApplication,
    backend: &SimulatedBackend,
    prompter: &mut Prompter<R, W>,
) -> FlowResult<bool> {
    loop {
        prompter.say("Sending invitation...")?;
        match app.send_invitation(backend).await {
            Ok(receipt) => {
                prompter.say(format!(
                    "Invitation {} sent to {}.",
                    receipt.invitation_id, receipt.sent_to
                ))?;
                return Ok(true);
            }
            Err(err) if err.is_side_effect_failure() => {
                prompter.say(format!("Could not send the invitation: {}", err))?;
                if !prompter.confirm("Try again?")? {
                    prompter.say("Application cancelled.")?;
                    return Ok(false);
                }
            }
            Err(err) => return Err(err),
        }
    }
}

enum ReviewChoice {
    Submitted(CommitReceipt),
    Edit,
    Cancelled,
}

async fn review_application<R: BufRead, W: Write>(
    settings: &Settings,
    app: &mut JointAccountApplication,
    backend: &SimulatedBackend,
    prompter: &mut Prompter<R, W>,
) -> FlowResult<ReviewChoice> {
    loop {
        prompter.say("")?;
        prompter.say("Review & Confirm")?;
        prompter.say(format_aggregate_review(
            app.workflow().aggregate(),
            REVIEW_LABELS,
            &settings.currency_symbol,
        ))?;

        let answer = prompter.prompt_string("Submit application? [y]es / [e]dit / [n]o: ")?;
        match answer.to_lowercase().as_str() {
            "y" | "yes" => {}
            "e" | "edit" => {
                app.jump_to(0)?;
                return Ok(ReviewChoice::Edit);
            }
            _ => {
                prompter.say("Application not submitted.")?;
                return Ok(ReviewChoice::Cancelled);
            }
        }

        app.confirm()?;
        prompter.say("Submitting application...")?;
        match app.commit(backend).await {
            Ok(receipt) => {
                prompter.say(format!(
                    "Application submitted. Reference: {}",
                    receipt.reference
                ))?;
                return Ok(ReviewChoice::Submitted(receipt));
            }
            Err(err) if err.is_side_effect_failure() => {
                prompter.say(format!("Submission failed: {}", err))?;
            }
            Err(err) => return Err(err),
        }
    }
}
