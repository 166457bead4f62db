//! Postgres-backed inventory store.
//!
//! Tables are described in `crates/infra/sql/schema.sql`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (check constraint violation) | `23514` | `Conflict` |
//! | Database (serialization failure) | `40001` | `Conflict` |
//! | Anything else | - | `Storage` |
//!
//! ## Atomicity
//!
//! `insert_item` and `delete_item` write the item row and its audit row in one
//! transaction.
//!
//! `commit_transition` runs in one transaction: the request row is updated with
//! `WHERE status = $from`, the item row with `WHERE version = $expected`, and the
//! audit row is inserted. If either guarded update touches zero rows the
//! transaction is rolled back and `StoreError::Conflict` is returned.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use stockroom_auth::{Role, UserIdentity};
use stockroom_core::{
    AggregateRoot, AuditEntryId, Entity, ExpectedVersion, ItemId, RequestId, Resource, UserId,
};
use stockroom_inventory::{AuditEntry, InventoryItem, ItemRequest, RequestStatus, Transition};

use super::{AuditLogStore, CatalogStore, RequestStore, TransitionCommit, UserDirectory};
use crate::error::{StoreError, StoreResult};

/// Postgres-backed store.
///
/// Uses the SQLx connection pool, which is `Send + Sync` and shared across tasks.
#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    async fn item_exists(&self, id: ItemId) -> StoreResult<bool> {
        let row = sqlx::query("SELECT 1 FROM inventory_items WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("item_exists", e))?;
        Ok(row.is_some())
    }

    /// Zero rows affected by a version-guarded write: missing row or stale version.
    async fn missing_or_stale(&self, id: ItemId, expected: ExpectedVersion) -> StoreError {
        match self.item_exists(id).await {
            Ok(false) => StoreError::NotFound(Resource::Item),
            Ok(true) => StoreError::Conflict(format!("item {id} is not at {expected:?}")),
            Err(e) => e,
        }
    }
}

// -------------------------
// Row mapping
// -------------------------

fn decode_err(what: &str, e: impl core::fmt::Display) -> StoreError {
    StoreError::Storage(format!("failed to decode {what} row: {e}"))
}

fn item_from_row(row: &PgRow) -> StoreResult<InventoryItem> {
    let id: Uuid = row.try_get("id").map_err(|e| decode_err("item", e))?;
    let title: String = row.try_get("title").map_err(|e| decode_err("item", e))?;
    let quantity: i64 = row.try_get("quantity").map_err(|e| decode_err("item", e))?;
    let date_added: NaiveDate = row.try_get("date_added").map_err(|e| decode_err("item", e))?;
    let version: i64 = row.try_get("version").map_err(|e| decode_err("item", e))?;

    let quantity = u32::try_from(quantity).map_err(|e| decode_err("item", e))?;
    let version = u64::try_from(version).map_err(|e| decode_err("item", e))?;

    Ok(InventoryItem::restore(
        ItemId::from_uuid(id),
        title,
        quantity,
        date_added,
        version,
    ))
}

fn request_from_row(row: &PgRow) -> StoreResult<ItemRequest> {
    let id: Uuid = row.try_get("id").map_err(|e| decode_err("request", e))?;
    let item_id: Uuid = row.try_get("item_id").map_err(|e| decode_err("request", e))?;
    let requester_id: Uuid = row.try_get("requester_id").map_err(|e| decode_err("request", e))?;
    let status: String = row.try_get("status").map_err(|e| decode_err("request", e))?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(|e| decode_err("request", e))?;

    let status: RequestStatus = status.parse().map_err(|e| decode_err("request", e))?;

    Ok(ItemRequest::restore(
        RequestId::from_uuid(id),
        ItemId::from_uuid(item_id),
        UserId::from_uuid(requester_id),
        status,
        created_at,
    ))
}

fn audit_from_row(row: &PgRow) -> StoreResult<AuditEntry> {
    let id: Uuid = row.try_get("id").map_err(|e| decode_err("audit", e))?;
    let message: String = row.try_get("message").map_err(|e| decode_err("audit", e))?;
    let timestamp: DateTime<Utc> = row.try_get("timestamp").map_err(|e| decode_err("audit", e))?;

    Ok(AuditEntry {
        id: AuditEntryId::from_uuid(id),
        message,
        timestamp,
    })
}

fn user_from_row(row: &PgRow) -> StoreResult<UserIdentity> {
    let id: Uuid = row.try_get("id").map_err(|e| decode_err("user", e))?;
    let username: String = row.try_get("username").map_err(|e| decode_err("user", e))?;
    let full_name: String = row.try_get("full_name").map_err(|e| decode_err("user", e))?;
    let role: String = row.try_get("role").map_err(|e| decode_err("user", e))?;

    Ok(UserIdentity {
        id: UserId::from_uuid(id),
        username,
        full_name,
        role: Role::new(role),
    })
}

fn version_param(expected: ExpectedVersion) -> Option<i64> {
    match expected {
        ExpectedVersion::Any => None,
        ExpectedVersion::Exact(v) => Some(v as i64),
    }
}

const ITEM_COLUMNS: &str = "id, title, quantity, date_added, version";
const REQUEST_COLUMNS: &str = "id, item_id, requester_id, status, created_at";

// -------------------------
// Catalog
// -------------------------

#[async_trait::async_trait]
impl CatalogStore for PostgresInventoryStore {
    #[instrument(skip(self), err)]
    async fn list_items(&self) -> StoreResult<Vec<InventoryItem>> {
        let rows = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM inventory_items ORDER BY id"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_items", e))?;
        rows.iter().map(item_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn search_items(&self, keyword: &str) -> StoreResult<Vec<InventoryItem>> {
        // strpos instead of LIKE so '%' and '_' in the keyword match literally.
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items \
             WHERE strpos(lower(title), lower($1)) > 0 ORDER BY id"
        ))
        .bind(keyword)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("search_items", e))?;
        rows.iter().map(item_from_row).collect()
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn get_item(&self, id: ItemId) -> StoreResult<Option<InventoryItem>> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_item", e))?;
        row.as_ref().map(item_from_row).transpose()
    }

    #[instrument(skip(self, item, audit), fields(item_id = %item.id()), err)]
    async fn insert_item(&self, item: &InventoryItem, audit: Option<&AuditEntry>) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO inventory_items (id, title, quantity, date_added, version)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(item.id().as_uuid())
        .bind(item.title())
        .bind(i64::from(item.quantity()))
        .bind(item.date_added())
        .bind(item.version() as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_item", e))?;

        if let Some(entry) = audit {
            insert_audit(&mut *tx, entry).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self, item), fields(item_id = %item.id()), err)]
    async fn update_item(&self, item: &InventoryItem, expected: ExpectedVersion) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_items
            SET title = $2, quantity = $3, version = $4
            WHERE id = $1 AND ($5::bigint IS NULL OR version = $5)
            "#,
        )
        .bind(item.id().as_uuid())
        .bind(item.title())
        .bind(i64::from(item.quantity()))
        .bind(item.version() as i64)
        .bind(version_param(expected))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_stale(item.id(), expected).await);
        }
        Ok(())
    }

    #[instrument(skip(self, audit), fields(item_id = %id), err)]
    async fn delete_item(
        &self,
        id: ItemId,
        expected: ExpectedVersion,
        audit: Option<&AuditEntry>,
    ) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let result = sqlx::query(
            "DELETE FROM inventory_items WHERE id = $1 AND ($2::bigint IS NULL OR version = $2)",
        )
        .bind(id.as_uuid())
        .bind(version_param(expected))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("delete_item", e))?;

        if result.rows_affected() == 0 {
            let err = self.missing_or_stale(id, expected).await;
            return Err(rollback_with(tx, err).await);
        }

        if let Some(entry) = audit {
            insert_audit(&mut *tx, entry).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }
}

// -------------------------
// Requests
// -------------------------

#[async_trait::async_trait]
impl RequestStore for PostgresInventoryStore {
    #[instrument(skip(self, request), fields(request_id = %request.id()), err)]
    async fn insert_request(&self, request: &ItemRequest) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO item_requests (id, item_id, requester_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(request.id().as_uuid())
        .bind(request.item_id().as_uuid())
        .bind(request.requester_id().as_uuid())
        .bind(request.status().as_str())
        .bind(request.created_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_request", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(request_id = %id), err)]
    async fn get_request(&self, id: RequestId) -> StoreResult<Option<ItemRequest>> {
        let row = sqlx::query(&format!("SELECT {REQUEST_COLUMNS} FROM item_requests WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_request", e))?;
        row.as_ref().map(request_from_row).transpose()
    }

    #[instrument(skip(self), fields(status = %status), err)]
    async fn list_requests_by_status(&self, status: RequestStatus) -> StoreResult<Vec<ItemRequest>> {
        let rows = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM item_requests WHERE status = $1 ORDER BY created_at, id"
        ))
        .bind(status.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_requests_by_status", e))?;
        rows.iter().map(request_from_row).collect()
    }

    #[instrument(skip(self, request), fields(request_id = %request.id()), err)]
    async fn save_request(&self, request: &ItemRequest, expected_status: RequestStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE item_requests SET status = $2 WHERE id = $1 AND status = $3")
            .bind(request.id().as_uuid())
            .bind(request.status().as_str())
            .bind(expected_status.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("save_request", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "request {} is missing or no longer {expected_status}",
                request.id()
            )));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %item_id, status = %status), err)]
    async fn count_requests_for_item(&self, item_id: ItemId, status: RequestStatus) -> StoreResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM item_requests WHERE item_id = $1 AND status = $2")
            .bind(item_id.as_uuid())
            .bind(status.as_str())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_requests_for_item", e))?;
        let total: i64 = row.try_get("total").map_err(|e| decode_err("count", e))?;
        Ok(total.max(0) as u64)
    }
}

// -------------------------
// Audit log
// -------------------------

async fn insert_audit(
    executor: impl sqlx::Executor<'_, Database = Postgres>,
    entry: &AuditEntry,
) -> StoreResult<()> {
    sqlx::query("INSERT INTO audit_log (id, message, timestamp) VALUES ($1, $2, $3)")
        .bind(entry.id.as_uuid())
        .bind(&entry.message)
        .bind(entry.timestamp)
        .execute(executor)
        .await
        .map_err(|e| map_sqlx_error("insert_audit", e))?;
    Ok(())
}

#[async_trait::async_trait]
impl AuditLogStore for PostgresInventoryStore {
    #[instrument(skip(self, entry), err)]
    async fn append_audit(&self, entry: &AuditEntry) -> StoreResult<()> {
        insert_audit(&*self.pool, entry).await
    }

    #[instrument(skip(self), err)]
    async fn list_audit(&self) -> StoreResult<Vec<AuditEntry>> {
        let rows = sqlx::query("SELECT id, message, timestamp FROM audit_log ORDER BY timestamp DESC, id DESC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_audit", e))?;
        rows.iter().map(audit_from_row).collect()
    }
}

// -------------------------
// Users
// -------------------------

#[async_trait::async_trait]
impl UserDirectory for PostgresInventoryStore {
    #[instrument(skip(self, user), fields(username = %user.username), err)]
    async fn insert_user(&self, user: &UserIdentity) -> StoreResult<()> {
        sqlx::query("INSERT INTO users (id, username, full_name, role) VALUES ($1, $2, $3, $4)")
            .bind(user.id.as_uuid())
            .bind(&user.username)
            .bind(&user.full_name)
            .bind(user.role.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get_user(&self, id: UserId) -> StoreResult<Option<UserIdentity>> {
        let row = sqlx::query("SELECT id, username, full_name, role FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<UserIdentity>> {
        let row = sqlx::query("SELECT id, username, full_name, role FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_username", e))?;
        row.as_ref().map(user_from_row).transpose()
    }
}

// -------------------------
// Lifecycle commit
// -------------------------

async fn rollback_with(tx: Transaction<'_, Postgres>, err: StoreError) -> StoreError {
    match tx.rollback().await {
        Ok(()) => err,
        Err(e) => map_sqlx_error("rollback", e),
    }
}

#[async_trait::async_trait]
impl TransitionCommit for PostgresInventoryStore {
    #[instrument(
        skip(self, transition, audit),
        fields(
            request_id = %transition.request.id(),
            from = %transition.from,
            to = %transition.request.status()
        ),
        err
    )]
    async fn commit_transition(&self, transition: &Transition, audit: Option<&AuditEntry>) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let request = &transition.request;
        let moved = sqlx::query("UPDATE item_requests SET status = $2 WHERE id = $1 AND status = $3")
            .bind(request.id().as_uuid())
            .bind(request.status().as_str())
            .bind(transition.from.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("commit_transition.request", e))?;

        if moved.rows_affected() != 1 {
            let err = StoreError::Conflict(format!(
                "request {} is missing or no longer {}",
                request.id(),
                transition.from
            ));
            return Err(rollback_with(tx, err).await);
        }

        if let Some(stock) = &transition.stock {
            let item = &stock.item;
            let updated = sqlx::query(
                r#"
                UPDATE inventory_items
                SET quantity = $2, version = $3
                WHERE id = $1 AND version = $4
                "#,
            )
            .bind(item.id().as_uuid())
            .bind(i64::from(item.quantity()))
            .bind(item.version() as i64)
            .bind(stock.expected_version as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("commit_transition.item", e))?;

            if updated.rows_affected() != 1 {
                let err = StoreError::Conflict(format!(
                    "item {} is missing or no longer at version {}",
                    item.id(),
                    stock.expected_version
                ));
                return Err(rollback_with(tx, err).await);
            }
        }

        if let Some(entry) = audit {
            insert_audit(&mut *tx, entry).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(msg),
                Some("23514") | Some("40001") => StoreError::Conflict(msg),
                _ => StoreError::Storage(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {}", operation))
        }
        other => StoreError::Storage(format!("{} failed: {}", operation, other)),
    }
}
