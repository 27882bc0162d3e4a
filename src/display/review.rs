//! Review screen formatting
//!
//! Formats aggregated records and payment drafts as aligned label/value
//! lists for the final check before anything is submitted.

use crate::models::FieldValue;
use crate::workflow::{AggregateRecord, FieldSlot};

/// Shown for aggregate fields no step has provided yet
pub const NOT_PROVIDED: &str = "N/A";

/// Format label/value pairs as an aligned two-column list
pub fn format_details<L: AsRef<str>>(lines: &[(L, String)]) -> String {
    if lines.is_empty() {
        return "Nothing to review.".to_string();
    }

    let label_width = lines
        .iter()
        .map(|(label, _)| label.as_ref().len())
        .max()
        .unwrap_or(0);

    let mut output = String::new();
    for (label, value) in lines {
        output.push_str(&format!(
            "  {:<label_width$}  {}\n",
            format!("{}:", label.as_ref()),
            value,
            label_width = label_width + 1,
        ));
    }
    output
}

/// Label/value pairs for an aggregate record
///
/// Only fields named in `labels` are shown, in that order. Missing fields
/// render as `N/A`; amounts use the configured currency symbol.
pub fn aggregate_lines<'a>(
    record: &AggregateRecord,
    labels: &[(&str, &'a str)],
    currency_symbol: &str,
) -> Vec<(&'a str, String)> {
    labels
        .iter()
        .map(|(field, label)| {
            let value = match record.get(field) {
                Some(FieldSlot::Provided(value)) => format_value(value, currency_symbol),
                Some(FieldSlot::Missing) | None => NOT_PROVIDED.to_string(),
            };
            (*label, value)
        })
        .collect()
}

/// Format the aggregate review block
pub fn format_aggregate_review(
    record: &AggregateRecord,
    labels: &[(&str, &str)],
    currency_symbol: &str,
) -> String {
    format_details(&aggregate_lines(record, labels, currency_symbol))
}

fn format_value(value: &FieldValue, currency_symbol: &str) -> String {
    match value {
        FieldValue::Text(text) if text.is_empty() => NOT_PROVIDED.to_string(),
        FieldValue::Amount(amount) => amount.format_with_symbol(currency_symbol),
        other => other.to_string(),
    }
}
