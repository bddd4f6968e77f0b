//! Accounts and authentication: password hashing, JWT issuance, the `AuthUser`
//! extractor, one-time codes and the signup/login/reset handlers.

pub mod extractor;
pub mod handlers;
pub mod otp;
pub mod password;
pub mod store;
pub mod token;
pub mod validation;

use serde::{Deserialize, Serialize};

pub use extractor::AuthUser;

/// The two account types. Each has its own table and login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Employer,
    Candidate,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Employer => "employer",
            AccountRole::Candidate => "candidate",
        }
    }
}
