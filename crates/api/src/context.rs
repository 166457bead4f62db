use stockroom_auth::{Principal, Role};
use stockroom_core::UserId;

/// Principal context for a request (authenticated identity + roles).
///
/// Inserted by the auth middleware from verified token claims; handlers pass
/// the inner `Principal` explicitly into every service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn user_id(&self) -> UserId {
        self.principal.user_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.principal.roles
    }
}
