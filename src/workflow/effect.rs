//! Contracts for external side effects
//!
//! The engine never performs I/O. Irrevocable actions such as executing a
//! payment or submitting an application go through a `CommitGateway`
//! implemented by the caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A recoverable failure reported by an external collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SideEffectError {
    pub message: String,
}

impl SideEffectError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Proof of a successful commit, returned again on any later commit call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// Reference assigned by the collaborator (payment id, application number)
    pub reference: String,
    pub committed_at: DateTime<Utc>,
}

impl CommitReceipt {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            committed_at: Utc::now(),
        }
    }
}

/// Executes the terminal, irrevocable action for a confirmed record
#[async_trait]
pub trait CommitGateway<T: Sync + ?Sized>: Send + Sync {
    async fn attempt_commit(&self, record: &T) -> Result<CommitReceipt, SideEffectError>;
}
