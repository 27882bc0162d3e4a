//! Audit trail export for the terminal drivers

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::audit::AuditTrail;
use crate::error::{FlowError, FlowResult};

/// Write the given trails, merged by time, to `path` as JSON lines
pub fn export_audit(path: &Path, trails: &[&AuditTrail]) -> FlowResult<()> {
    let file = File::create(path).map_err(|e| {
        FlowError::Io(format!("Failed to create audit file {}: {}", path.display(), e))
    })?;

    let merged = AuditTrail::merged(trails);
    merged.write_jsonl(BufWriter::new(file))?;

    tracing::info!(path = %path.display(), entries = merged.len(), "audit trail exported");
    Ok(())
}
