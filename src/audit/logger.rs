//! In-memory audit trail
//!
//! Collects audit entries for the lifetime of a session. Entries can be
//! exported as line-delimited JSON (JSONL) to any writer.

use std::io::Write;

use crate::error::{FlowError, FlowResult};

use super::entry::AuditEntry;

/// Append-only list of audit entries for one session
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries for transitions that were refused
    pub fn rejected(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(|e| e.is_rejected())
    }

    /// Combine several trails into one, ordered by timestamp
    pub fn merged(trails: &[&AuditTrail]) -> Self {
        let mut entries: Vec<AuditEntry> = trails
            .iter()
            .flat_map(|trail| trail.entries.iter().cloned())
            .collect();
        entries.sort_by_key(|e| e.timestamp);
        Self { entries }
    }

    /// Write all entries as JSON lines and flush once at the end
    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> FlowResult<()> {
        for entry in &self.entries {
            let json = serde_json::to_string(entry)
                .map_err(|e| FlowError::Json(format!("Failed to serialize audit entry: {}", e)))?;

            writeln!(writer, "{}", json)
                .map_err(|e| FlowError::Io(format!("Failed to write audit entry: {}", e)))?;
        }

        writer
            .flush()
            .map_err(|e| FlowError::Io(format!("Failed to flush audit output: {}", e)))?;

        Ok(())
    }
}
