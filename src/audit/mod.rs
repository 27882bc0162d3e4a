//! Audit trail for workflow and submission transitions
//!
//! Every transition attempt, accepted or rejected, is recorded with a
//! timestamp and the session it belongs to.
//!
//! - `AuditEntry`: one attempted transition with its outcome.
//! - `AuditTrail`: the in-memory, append-only list of entries for a session,
//!   exportable as line-delimited JSON (JSONL).
//!
//! Nothing here touches the filesystem; callers decide where an export goes.

mod entry;
mod logger;

pub use entry::{AuditEntry, Operation, Outcome};
pub use logger::AuditTrail;
