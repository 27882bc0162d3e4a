//! bankflow - staged workflow engine for multi-step banking flows
//!
//! This library drives multi-step forms where each step is validated before
//! the user may move on, some steps are only complete once an external
//! action succeeds, and irrevocable actions pass through an explicit
//! review / confirm / commit lifecycle.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `workflow`: The engine (step registry, state machine, aggregation, submission)
//! - `services`: Concrete flows (joint-account application, payment)
//! - `models`: Form data, money, identifiers and domain records
//! - `audit`: In-memory audit trail of accepted and rejected transitions
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `logging`: tracing subscriber setup for binaries
//! - `display`: Terminal formatting
//! - `cli`: Interactive terminal drivers
//!
//! # Example
//!
//! ```rust,ignore
//! use bankflow::config::Settings;
//! use bankflow::services::JointAccountApplication;
//!
//! let mut app = JointAccountApplication::new(&Settings::default())?;
//! app.submit_current(&input)?;
//! app.advance()?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod workflow;

pub use error::{FlowError, FlowResult};
