//! CLI command handlers
//!
//! Interactive terminal drivers for the joint-account and payment flows,
//! bridging clap argument parsing with the service layer. External calls go
//! to a simulated backend.

pub mod audit;
pub mod backend;
pub mod config;
pub mod joint;
pub mod payment;
pub mod prompt;

pub use backend::SimulatedBackend;
pub use config::{handle_config_command, ConfigArgs};
pub use joint::{run_joint_application, JointArgs};
pub use payment::{run_payment, PayArgs};
pub use prompt::Prompter;
