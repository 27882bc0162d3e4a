//! Payment model
//!
//! A validated payment instruction plus the account and payee directory
//! used to show it to the user.

use serde::{Deserialize, Serialize};

use super::field::StepData;
use super::money::Money;

/// A validated, not yet executed payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    /// Id of the account the money leaves
    pub account_from: String,
    /// Id of the payee receiving it
    pub payee: String,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl PaymentDetails {
    /// Build from validated payment form data; `None` if a field is absent
    pub fn from_step_data(data: &StepData) -> Option<Self> {
        let reference = data
            .text("reference")
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Some(Self {
            account_from: data.text("account_from")?.to_string(),
            payee: data.text("payee")?.to_string(),
            amount: data.amount("amount")?,
            reference,
        })
    }
}

/// A selectable entry (account or payee) with its display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: String,
    pub name: String,
}

impl DirectoryEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Accounts the user can pay from and payees they can pay to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDirectory {
    pub accounts: Vec<DirectoryEntry>,
    pub payees: Vec<DirectoryEntry>,
}

impl PaymentDirectory {
    /// Demo accounts and payees from the dashboard fixtures
    pub fn sample() -> Self {
        Self {
            accounts: vec![
                DirectoryEntry::new("acc1", "Current Account"),
                DirectoryEntry::new("acc2", "Savings Account"),
            ],
            payees: vec![
                DirectoryEntry::new("p1", "John Doe (Savings)"),
                DirectoryEntry::new("p2", "Utility Company Ltd."),
                DirectoryEntry::new("p3", "Landlord Rentals"),
            ],
        }
    }

    pub fn account_name(&self, id: &str) -> Option<&str> {
        self.accounts
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.name.as_str())
    }

    pub fn payee_name(&self, id: &str) -> Option<&str> {
        self.payees
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.as_str())
    }
}
