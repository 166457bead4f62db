//! User directory service: registration and identity resolution.

use std::sync::Arc;

use stockroom_auth::{Permission, Principal, UserIdentity, authorize, authorize_identity};
use stockroom_core::UserId;

use crate::error::{ServiceError, StoreError};
use crate::store::InventoryStore;

#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn InventoryStore>,
}

impl Directory {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Register a new user. The username `admin` receives the admin role.
    pub async fn register(&self, username: &str, full_name: &str) -> Result<UserIdentity, ServiceError> {
        let user = UserIdentity::register(UserId::new(), username, full_name)?;

        if self.store.find_user_by_username(&user.username).await?.is_some() {
            tracing::warn!(username = %user.username, "username already registered");
            return Err(ServiceError::Conflict(format!(
                "username '{}' is already registered",
                user.username
            )));
        }

        match self.store.insert_user(&user).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(msg)) => {
                tracing::warn!(username = %user.username, "username already registered");
                return Err(ServiceError::Conflict(msg));
            }
            Err(other) => return Err(other.into()),
        }

        tracing::info!(user_id = %user.id, username = %user.username, role = %user.role, "user registered");
        Ok(user)
    }

    /// Map an authenticated principal to its registered identity, if any.
    pub async fn resolve(&self, principal: &Principal) -> Result<Option<UserIdentity>, ServiceError> {
        Ok(self.store.get_user(principal.user_id).await?)
    }

    /// Gate an operation on `required`.
    ///
    /// The token's roles must grant it, the principal must be registered, and
    /// the role stored for that user must grant it too.
    pub async fn authorize(&self, actor: &Principal, required: &Permission) -> Result<UserIdentity, ServiceError> {
        authorize(actor, required)?;

        let Some(identity) = self.resolve(actor).await? else {
            tracing::warn!(user_id = %actor.user_id, permission = %required, "identity not registered");
            return Err(ServiceError::IdentityUnresolved);
        };

        authorize_identity(&identity, required)?;
        Ok(identity)
    }
}
