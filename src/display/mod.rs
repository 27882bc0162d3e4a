//! Display formatting for terminal output
//!
//! Turns workflow snapshots, review records and validation errors into text
//! for the interactive drivers.

pub mod progress;
pub mod review;

pub use progress::{format_progress_bar, format_step_header, format_validation_errors};
pub use review::{aggregate_lines, format_aggregate_review, format_details, NOT_PROVIDED};
