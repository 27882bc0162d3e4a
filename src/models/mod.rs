//! Core data models for bankflow
//!
//! Form input and validated step data, money, identifiers, and the domain
//! records produced by the joint-account and payment flows.

pub mod applicant;
pub mod field;
pub mod ids;
pub mod money;
pub mod payment;

pub use applicant::{InvitationReceipt, PartnerInvite};
pub use field::{FieldValue, FormInput, StepData};
pub use ids::{ConfirmationId, InvitationId, SessionId};
pub use money::Money;
pub use payment::{DirectoryEntry, PaymentDetails, PaymentDirectory};
