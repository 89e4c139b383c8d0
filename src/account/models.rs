//! Data models for customer onboarding

use chrono::{DateTime, Utc};

use crate::core_types::CustomerId;

/// Registered customer
#[derive(Debug, Clone)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    /// PHC-formatted argon2 hash
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Customer about to be inserted; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl NewCustomer {
    /// Emails are stored trimmed and lowercased so lookups are case-insensitive
    pub fn new(name: &str, email: &str, password_hash: String) -> Self {
        Self {
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
