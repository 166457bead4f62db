use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use stockroom_auth::UserIdentity;
use stockroom_core::{AggregateRoot, Entity, ExpectedVersion, ItemId, RequestId, Resource, UserId};
use stockroom_inventory::audit::sort_newest_first;
use stockroom_inventory::{AuditEntry, InventoryItem, ItemRequest, RequestStatus, Transition};

use super::{AuditLogStore, CatalogStore, RequestStore, TransitionCommit, UserDirectory};
use crate::error::{StoreError, StoreResult};

/// Rows of one entity type keyed by id.
#[derive(Debug)]
struct Table<E: Entity> {
    rows: HashMap<E::Id, E>,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<E: Entity + Clone> Table<E> {
    fn get(&self, id: E::Id) -> Option<E> {
        self.rows.get(&id).cloned()
    }

    fn contains(&self, id: E::Id) -> bool {
        self.rows.contains_key(&id)
    }

    fn put(&mut self, row: E) {
        self.rows.insert(row.id(), row);
    }

    fn remove(&mut self, id: E::Id) -> Option<E> {
        self.rows.remove(&id)
    }

    fn rows(&self) -> impl Iterator<Item = &E> {
        self.rows.values()
    }
}

#[derive(Debug, Default)]
struct Tables {
    items: Table<InventoryItem>,
    requests: Table<ItemRequest>,
    users: Table<UserIdentity>,
    audit: Vec<AuditEntry>,
}

/// In-memory store for tests/dev.
///
/// All tables sit behind one lock, so a transition commit (request + item +
/// audit) is atomic with respect to every other operation.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }
}

fn sorted_items<'a>(items: impl Iterator<Item = &'a InventoryItem>) -> Vec<InventoryItem> {
    let mut items: Vec<InventoryItem> = items.cloned().collect();
    items.sort_by_key(|i| i.id());
    items
}

fn check_version(item: &InventoryItem, expected: ExpectedVersion) -> StoreResult<()> {
    if expected.matches(item.version()) {
        Ok(())
    } else {
        Err(StoreError::Conflict(format!(
            "item {} is at version {}, expected {expected:?}",
            item.id(),
            item.version()
        )))
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryInventoryStore {
    async fn list_items(&self) -> StoreResult<Vec<InventoryItem>> {
        let t = self.read()?;
        Ok(sorted_items(t.items.rows()))
    }

    async fn search_items(&self, keyword: &str) -> StoreResult<Vec<InventoryItem>> {
        let t = self.read()?;
        Ok(sorted_items(t.items.rows().filter(|i| i.matches_keyword(keyword))))
    }

    async fn get_item(&self, id: ItemId) -> StoreResult<Option<InventoryItem>> {
        Ok(self.read()?.items.get(id))
    }

    async fn insert_item(&self, item: &InventoryItem, audit: Option<&AuditEntry>) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.items.contains(item.id()) {
            return Err(StoreError::Duplicate(format!("item {} already exists", item.id())));
        }
        t.items.put(item.clone());
        if let Some(entry) = audit {
            t.audit.push(entry.clone());
        }
        Ok(())
    }

    async fn update_item(&self, item: &InventoryItem, expected: ExpectedVersion) -> StoreResult<()> {
        let mut t = self.write()?;
        let current = t
            .items
            .get(item.id())
            .ok_or(StoreError::NotFound(Resource::Item))?;
        check_version(&current, expected)?;
        t.items.put(item.clone());
        Ok(())
    }

    async fn delete_item(
        &self,
        id: ItemId,
        expected: ExpectedVersion,
        audit: Option<&AuditEntry>,
    ) -> StoreResult<()> {
        let mut t = self.write()?;
        let current = t.items.get(id).ok_or(StoreError::NotFound(Resource::Item))?;
        check_version(&current, expected)?;
        t.items.remove(id);
        if let Some(entry) = audit {
            t.audit.push(entry.clone());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RequestStore for InMemoryInventoryStore {
    async fn insert_request(&self, request: &ItemRequest) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.requests.contains(request.id()) {
            return Err(StoreError::Duplicate(format!("request {} already exists", request.id())));
        }
        t.requests.put(request.clone());
        Ok(())
    }

    async fn get_request(&self, id: RequestId) -> StoreResult<Option<ItemRequest>> {
        Ok(self.read()?.requests.get(id))
    }

    async fn list_requests_by_status(&self, status: RequestStatus) -> StoreResult<Vec<ItemRequest>> {
        let t = self.read()?;
        let mut out: Vec<ItemRequest> = t
            .requests
            .rows()
            .filter(|r| r.status() == status)
            .cloned()
            .collect();
        out.sort_by_key(|r| (r.created_at(), r.id()));
        Ok(out)
    }

    async fn save_request(&self, request: &ItemRequest, expected_status: RequestStatus) -> StoreResult<()> {
        let mut t = self.write()?;
        let current = t
            .requests
            .get(request.id())
            .ok_or(StoreError::NotFound(Resource::Request))?;
        if current.status() != expected_status {
            return Err(StoreError::Conflict(format!(
                "request {} is {}, expected {expected_status}",
                request.id(),
                current.status()
            )));
        }
        t.requests.put(request.clone());
        Ok(())
    }

    async fn count_requests_for_item(&self, item_id: ItemId, status: RequestStatus) -> StoreResult<u64> {
        let t = self.read()?;
        Ok(t.requests
            .rows()
            .filter(|r| r.item_id() == item_id && r.status() == status)
            .count() as u64)
    }
}

#[async_trait::async_trait]
impl AuditLogStore for InMemoryInventoryStore {
    async fn append_audit(&self, entry: &AuditEntry) -> StoreResult<()> {
        self.write()?.audit.push(entry.clone());
        Ok(())
    }

    async fn list_audit(&self) -> StoreResult<Vec<AuditEntry>> {
        let mut entries = self.read()?.audit.clone();
        sort_newest_first(&mut entries);
        Ok(entries)
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryInventoryStore {
    async fn insert_user(&self, user: &UserIdentity) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.users.rows().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(format!("username '{}' is taken", user.username)));
        }
        t.users.put(user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<UserIdentity>> {
        Ok(self.read()?.users.get(id))
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<UserIdentity>> {
        let t = self.read()?;
        Ok(t.users.rows().find(|u| u.username == username).cloned())
    }
}

#[async_trait::async_trait]
impl TransitionCommit for InMemoryInventoryStore {
    async fn commit_transition(&self, transition: &Transition, audit: Option<&AuditEntry>) -> StoreResult<()> {
        let mut t = self.write()?;

        // Check everything before touching anything.
        let request_id = transition.request.id();
        let current = t
            .requests
            .get(request_id)
            .ok_or(StoreError::NotFound(Resource::Request))?;
        if current.status() != transition.from {
            return Err(StoreError::Conflict(format!(
                "request {request_id} is {}, expected {}",
                current.status(),
                transition.from
            )));
        }

        if let Some(stock) = &transition.stock {
            let item = t
                .items
                .get(stock.item.id())
                .ok_or(StoreError::NotFound(Resource::Item))?;
            check_version(&item, ExpectedVersion::Exact(stock.expected_version))?;
        }

        if let Some(stock) = &transition.stock {
            t.items.put(stock.item.clone());
        }
        t.requests.put(transition.request.clone());
        if let Some(entry) = audit {
            t.audit.push(entry.clone());
        }
        Ok(())
    }
}
