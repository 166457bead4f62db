//! Registered user identities.
//!
//! The directory that stores these lives in infra; this module only holds the
//! record shape and the registration rules.

use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, UserId};

use crate::Role;

/// Username that is granted the admin role on registration.
pub const ADMIN_USERNAME: &str = "admin";

// ─────────────────────────────────────────────────────────────────────────────
// User Identity
// ─────────────────────────────────────────────────────────────────────────────

/// A registered user as seen by the lending workflow.
///
/// # Invariants
/// - `username` is non-empty and unique within the directory.
/// - `full_name` is non-empty (it is what the audit log prints).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

impl UserIdentity {
    /// Validate registration input and assign the initial role.
    pub fn register(id: UserId, username: &str, full_name: &str) -> DomainResult<Self> {
        let username = username.trim();
        let full_name = full_name.trim();

        if username.is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if full_name.is_empty() {
            return Err(DomainError::validation("full name cannot be empty"));
        }

        Ok(Self {
            id,
            username: username.to_string(),
            full_name: full_name.to_string(),
            role: role_for_username(username),
        })
    }
}

impl Entity for UserIdentity {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Initial role for a newly registered username.
pub fn role_for_username(username: &str) -> Role {
    if username == ADMIN_USERNAME {
        Role::ADMIN
    } else {
        Role::USER
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
