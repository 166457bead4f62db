use serde::{Deserialize, Serialize};

use stockroom_core::UserId;

use crate::Role;

/// The authenticated caller of an operation.
///
/// Built from verified token claims and passed explicitly into every service
/// call; nothing reads identity from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }
}
