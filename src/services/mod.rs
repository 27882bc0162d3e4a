//! Service layer for bankflow
//!
//! Concrete flows built on the workflow engine: the joint-account
//! application and the payment session. Services own the field rules and
//! messages; callers supply the external side effects.

pub mod joint_account;
pub mod payment;

pub use joint_account::{
    joint_account_mapping, joint_account_steps, InvitationSender, JointAccountApplication,
};
pub use payment::{payment_schema, PaymentSession};
