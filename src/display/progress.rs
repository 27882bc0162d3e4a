//! Progress and error formatting for multi-step flows

use crate::workflow::{ValidationErrors, WorkflowSnapshot};

/// Step header, e.g. `Step 2 of 3: Invite Partner`
pub fn format_step_header(snapshot: &WorkflowSnapshot) -> String {
    format!(
        "Step {} of {}: {}",
        snapshot.current_index + 1,
        snapshot.total_steps,
        snapshot.current_title
    )
}

/// One marker per step: `x` complete, `>` current, `.` pending
pub fn format_progress_bar(snapshot: &WorkflowSnapshot, step_ids: &[&str]) -> String {
    step_ids
        .iter()
        .enumerate()
        .map(|(index, id)| {
            if snapshot.completed.iter().any(|done| done.as_str() == *id) {
                "[x]"
            } else if index == snapshot.current_index {
                "[>]"
            } else {
                "[.]"
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Field errors, one per line
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionId;
    use crate::workflow::{AggregateRecord, FieldError, StepId};

    fn snapshot() -> WorkflowSnapshot {
        WorkflowSnapshot {
            session: SessionId::new(),
            current_index: 1,
            current_step: StepId::new("partner"),
            current_title: "Invite Partner".into(),
            total_steps: 3,
            completed: vec![StepId::new("applicant")],
            awaiting_side_effect: true,
            finished: false,
            last_errors: None,
            aggregate: AggregateRecord::default(),
        }
    }

    #[test]
    fn test_step_header() {
        assert_eq!(format_step_header(&snapshot()), "Step 2 of 3: Invite Partner");
    }

    #[test]
    fn test_progress_bar() {
        let bar = format_progress_bar(&snapshot(), &["applicant", "partner", "review"]);
        assert_eq!(bar, "[x] [>] [.]");
    }

    #[test]
    fn test_validation_errors() {
        let errors = ValidationErrors::from(vec![
            FieldError::new("email", "Invalid email address."),
            FieldError::new("phone", "Valid phone number is required."),
        ]);
        assert_eq!(
            format_validation_errors(&errors),
            "  - email: Invalid email address.\n  - phone: Valid phone number is required."
        );
    }
}
