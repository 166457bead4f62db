//! Storage boundary for the catalog, requests, audit log and user directory.
//!
//! Services depend on `Arc<dyn InventoryStore>`; the backend (in-memory or
//! Postgres) is chosen once at startup by [`open`].

use std::sync::Arc;

use stockroom_auth::UserIdentity;
use stockroom_core::{ExpectedVersion, ItemId, RequestId, UserId};
use stockroom_inventory::{AuditEntry, InventoryItem, ItemRequest, RequestStatus, Transition};

use crate::config::StockroomConfig;
use crate::error::StoreResult;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;

/// Item catalog storage.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_items(&self) -> StoreResult<Vec<InventoryItem>>;

    /// Items whose title contains `keyword`, ignoring case.
    async fn search_items(&self, keyword: &str) -> StoreResult<Vec<InventoryItem>>;

    async fn get_item(&self, id: ItemId) -> StoreResult<Option<InventoryItem>>;

    /// Insert `item` and append `audit` (if any) as one unit.
    async fn insert_item(&self, item: &InventoryItem, audit: Option<&AuditEntry>) -> StoreResult<()>;

    /// Replace an item if the stored version still satisfies `expected`.
    async fn update_item(&self, item: &InventoryItem, expected: ExpectedVersion) -> StoreResult<()>;

    /// Remove an item if the stored version still satisfies `expected`, and
    /// append `audit` (if any) as one unit. Nothing is written on failure.
    async fn delete_item(&self, id: ItemId, expected: ExpectedVersion, audit: Option<&AuditEntry>)
    -> StoreResult<()>;
}

/// Item request storage.
#[async_trait::async_trait]
pub trait RequestStore: Send + Sync {
    async fn insert_request(&self, request: &ItemRequest) -> StoreResult<()>;

    async fn get_request(&self, id: RequestId) -> StoreResult<Option<ItemRequest>>;

    /// Requests in `status`, oldest first.
    async fn list_requests_by_status(&self, status: RequestStatus) -> StoreResult<Vec<ItemRequest>>;

    /// Persist a status change if the stored request is still in `expected_status`.
    async fn save_request(&self, request: &ItemRequest, expected_status: RequestStatus) -> StoreResult<()>;

    async fn count_requests_for_item(&self, item_id: ItemId, status: RequestStatus) -> StoreResult<u64>;
}

/// Append-only audit log storage.
#[async_trait::async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn append_audit(&self, entry: &AuditEntry) -> StoreResult<()>;

    /// All entries, newest first.
    async fn list_audit(&self) -> StoreResult<Vec<AuditEntry>>;
}

/// Registered users.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fails with `StoreError::Duplicate` if the username is taken.
    async fn insert_user(&self, user: &UserIdentity) -> StoreResult<()>;

    async fn get_user(&self, id: UserId) -> StoreResult<Option<UserIdentity>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<UserIdentity>>;
}

/// Atomic commit of a lifecycle transition.
#[async_trait::async_trait]
pub trait TransitionCommit: Send + Sync {
    /// Apply the request status change, the stock change (if any) and the audit
    /// entry (if any) as one unit.
    ///
    /// Fails with `StoreError::Conflict` and writes nothing if the request is no
    /// longer in `transition.from` or the item is no longer at
    /// `transition.stock.expected_version`.
    async fn commit_transition(&self, transition: &Transition, audit: Option<&AuditEntry>) -> StoreResult<()>;
}

/// Everything the services need from a backend.
pub trait InventoryStore: CatalogStore + RequestStore + AuditLogStore + UserDirectory + TransitionCommit {}

impl<T> InventoryStore for T where
    T: CatalogStore + RequestStore + AuditLogStore + UserDirectory + TransitionCommit
{
}

/// Open the backend selected by `config`: Postgres when a database URL is
/// configured, in-memory otherwise.
pub async fn open(config: &StockroomConfig) -> StoreResult<Arc<dyn InventoryStore>> {
    match &config.database_url {
        Some(url) => {
            let store = PostgresInventoryStore::connect(url, config.database_max_connections).await?;
            tracing::info!("using postgres inventory store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory inventory store");
            Ok(Arc::new(InMemoryInventoryStore::new()))
        }
    }
}
