//! Request lifecycle manager (application-level orchestration).
//!
//! Every operation follows the same pipeline:
//!
//! ```text
//! Principal + request id
//!   ↓
//! 1. Authorize (token roles, then the directory role of the registered user)
//!   ↓
//! 2. Load request, item and requester from the store
//!   ↓
//! 3. Decide (pure: `stockroom_inventory::lifecycle`, produces a Transition)
//!   ↓
//! 4. Commit request status + item quantity + audit entry as one unit,
//!    guarded by the request's prior status and the item's version
//! ```
//!
//! A refused operation is returned as a `ServiceError` value and also logged
//! at `warn`; a lost race surfaces as `ServiceError::Conflict` with nothing
//! written. The manager never retries.

use std::sync::Arc;

use chrono::Utc;

use stockroom_auth::{Permission, Principal, UserIdentity};
use stockroom_core::{Entity, ItemId, RequestId, Resource};
use stockroom_inventory::{
    AuditEntry, InventoryItem, ItemRequest, RequestAction, RequestStatus, Transition, lifecycle,
};

use crate::directory::Directory;
use crate::error::ServiceError;
use crate::store::InventoryStore;

#[derive(Clone)]
pub struct RequestLifecycle {
    store: Arc<dyn InventoryStore>,
    directory: Directory,
}

impl RequestLifecycle {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            directory: Directory::new(store.clone()),
            store,
        }
    }

    /// File a PENDING request for one unit of `item_id` on behalf of `actor`.
    ///
    /// The actor must resolve to a registered user; that check comes before the
    /// item lookup.
    pub async fn create_request(&self, actor: &Principal, item_id: ItemId) -> Result<ItemRequest, ServiceError> {
        let requester = self.directory.authorize(actor, &Permission::REQUESTS_CREATE).await?;

        if self.store.get_item(item_id).await?.is_none() {
            tracing::warn!(item_id = %item_id, "request refused: item not found");
            return Err(ServiceError::NotFound(Resource::Item));
        }

        let request = ItemRequest::open(RequestId::new(), item_id, requester.id, Utc::now());
        self.store.insert_request(&request).await?;

        tracing::info!(
            request_id = %request.id(),
            item_id = %item_id,
            requester = %requester.username,
            "request created"
        );
        Ok(request)
    }

    /// PENDING -> APPROVED, taking one unit off the shelf.
    pub async fn approve_request(&self, actor: &Principal, id: RequestId) -> Result<ItemRequest, ServiceError> {
        self.directory.authorize(actor, &Permission::REQUESTS_MANAGE).await?;

        let request = self.load_request(id).await?;
        precheck(&request, RequestAction::Approve)?;
        let item = self.load_item(&request).await?;
        let requester = self.load_requester(&request).await?;

        let transition = lifecycle::approve(&request, &item, &requester.full_name)
            .map_err(|e| refused(RequestAction::Approve, id, e.into()))?;
        self.commit(RequestAction::Approve, transition).await
    }

    /// PENDING -> REJECTED. Stock and audit log are untouched.
    pub async fn reject_request(&self, actor: &Principal, id: RequestId) -> Result<ItemRequest, ServiceError> {
        self.directory.authorize(actor, &Permission::REQUESTS_MANAGE).await?;

        let request = self.load_request(id).await?;
        let transition =
            lifecycle::reject(&request).map_err(|e| refused(RequestAction::Reject, id, e.into()))?;
        self.commit(RequestAction::Reject, transition).await
    }

    /// APPROVED -> RETURNED, putting the unit back on the shelf.
    pub async fn return_request(&self, actor: &Principal, id: RequestId) -> Result<ItemRequest, ServiceError> {
        self.directory.authorize(actor, &Permission::REQUESTS_MANAGE).await?;

        let request = self.load_request(id).await?;
        precheck(&request, RequestAction::Return)?;
        let item = self.load_item(&request).await?;
        let requester = self.load_requester(&request).await?;

        let transition = lifecycle::return_loan(&request, &item, &requester.full_name)
            .map_err(|e| refused(RequestAction::Return, id, e.into()))?;
        self.commit(RequestAction::Return, transition).await
    }

    /// Admin queue: requests waiting for a decision, oldest first.
    pub async fn list_pending_requests(&self, actor: &Principal) -> Result<Vec<ItemRequest>, ServiceError> {
        self.directory.authorize(actor, &Permission::REQUESTS_MANAGE).await?;
        Ok(self.store.list_requests_by_status(RequestStatus::Pending).await?)
    }

    /// Active loans, oldest first.
    pub async fn list_approved_requests(&self, actor: &Principal) -> Result<Vec<ItemRequest>, ServiceError> {
        self.directory.authorize(actor, &Permission::REQUESTS_MANAGE).await?;
        Ok(self.store.list_requests_by_status(RequestStatus::Approved).await?)
    }

    /// Audit log, newest first.
    pub async fn list_audit_log(&self, actor: &Principal) -> Result<Vec<AuditEntry>, ServiceError> {
        self.directory.authorize(actor, &Permission::AUDIT_READ).await?;
        Ok(self.store.list_audit().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline steps
    // ─────────────────────────────────────────────────────────────────────────

    async fn load_request(&self, id: RequestId) -> Result<ItemRequest, ServiceError> {
        match self.store.get_request(id).await? {
            Some(request) => Ok(request),
            None => {
                tracing::warn!(request_id = %id, "request not found");
                Err(ServiceError::NotFound(Resource::Request))
            }
        }
    }

    async fn load_item(&self, request: &ItemRequest) -> Result<InventoryItem, ServiceError> {
        match self.store.get_item(request.item_id()).await? {
            Some(item) => Ok(item),
            None => {
                tracing::warn!(
                    request_id = %request.id(),
                    item_id = %request.item_id(),
                    "item for request no longer exists"
                );
                Err(ServiceError::NotFound(Resource::Item))
            }
        }
    }

    async fn load_requester(&self, request: &ItemRequest) -> Result<UserIdentity, ServiceError> {
        match self.store.get_user(request.requester_id()).await? {
            Some(user) => Ok(user),
            None => {
                tracing::warn!(
                    request_id = %request.id(),
                    user_id = %request.requester_id(),
                    "requester no longer exists"
                );
                Err(ServiceError::NotFound(Resource::User))
            }
        }
    }

    async fn commit(&self, action: RequestAction, transition: Transition) -> Result<ItemRequest, ServiceError> {
        let audit = transition
            .audit_message
            .as_deref()
            .map(|msg| AuditEntry::new(msg, Utc::now()));

        let request_id = transition.request.id();
        self.store
            .commit_transition(&transition, audit.as_ref())
            .await
            .map_err(|e| refused(action, request_id, e.into()))?;

        tracing::info!(
            request_id = %request_id,
            action = action.as_str(),
            from = %transition.from,
            to = %transition.request.status(),
            quantity = transition.stock.as_ref().map(|s| s.item.quantity()),
            "request transition committed"
        );
        Ok(transition.request)
    }
}

/// Refuse a wrong-status request before looking at its item, so the caller
/// sees the status problem rather than a missing item.
fn precheck(request: &ItemRequest, action: RequestAction) -> Result<(), ServiceError> {
    request
        .next_status(action)
        .map(|_| ())
        .map_err(|e| refused(action, request.id(), e.into()))
}

/// Log a refused operation at `warn` and hand the error back.
fn refused(action: RequestAction, request_id: RequestId, err: ServiceError) -> ServiceError {
    tracing::warn!(
        request_id = %request_id,
        action = action.as_str(),
        error = %err,
        "request operation refused"
    );
    err
}
