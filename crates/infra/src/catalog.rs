//! Catalog service: browse, search and maintain inventory items.
//!
//! Reads need `catalog.read`; writes need `catalog.write`, checked against the
//! caller's registered role. Adding and removing items leaves a line in the
//! audit log, written together with the change; edits do not.

use std::sync::Arc;

use chrono::Utc;

use stockroom_auth::{Permission, Principal};
use stockroom_core::{AggregateRoot, DomainError, Entity, ItemId, Resource};
use stockroom_inventory::audit::{added_to_catalog_message, removed_from_catalog_message};
use stockroom_inventory::{AuditEntry, InventoryItem, ItemDetails, RequestStatus};

use crate::directory::Directory;
use crate::error::ServiceError;
use crate::store::InventoryStore;

#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn InventoryStore>,
    directory: Directory,
}

impl Catalog {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            directory: Directory::new(store.clone()),
            store,
        }
    }

    /// All items, or only those whose title contains `keyword` (any case).
    /// A blank keyword lists everything.
    pub async fn list(&self, actor: &Principal, keyword: Option<&str>) -> Result<Vec<InventoryItem>, ServiceError> {
        self.directory.authorize(actor, &Permission::CATALOG_READ).await?;

        match keyword.map(str::trim).filter(|k| !k.is_empty()) {
            Some(k) => Ok(self.store.search_items(k).await?),
            None => Ok(self.store.list_items().await?),
        }
    }

    pub async fn get(&self, actor: &Principal, id: ItemId) -> Result<InventoryItem, ServiceError> {
        self.directory.authorize(actor, &Permission::CATALOG_READ).await?;
        self.load(id).await
    }

    pub async fn create(&self, actor: &Principal, details: ItemDetails) -> Result<InventoryItem, ServiceError> {
        self.directory.authorize(actor, &Permission::CATALOG_WRITE).await?;

        let now = Utc::now();
        let item = InventoryItem::create(ItemId::new(), details, now.date_naive())?;
        let audit = AuditEntry::new(added_to_catalog_message(item.title()), now);
        self.store.insert_item(&item, Some(&audit)).await?;

        tracing::info!(item_id = %item.id(), title = item.title(), quantity = item.quantity(), "item added");
        Ok(item)
    }

    /// Replace title and quantity. The date added is kept.
    pub async fn update(
        &self,
        actor: &Principal,
        id: ItemId,
        details: ItemDetails,
    ) -> Result<InventoryItem, ServiceError> {
        self.directory.authorize(actor, &Permission::CATALOG_WRITE).await?;

        let current = self.load(id).await?;
        let updated = current.edited(details)?;
        self.store.update_item(&updated, current.expected_version()).await?;

        tracing::info!(item_id = %id, version = updated.version(), "item updated");
        Ok(updated)
    }

    /// Remove an item. Refused while any unit of it is on loan.
    pub async fn delete(&self, actor: &Principal, id: ItemId) -> Result<(), ServiceError> {
        self.directory.authorize(actor, &Permission::CATALOG_WRITE).await?;

        let current = self.load(id).await?;
        let on_loan = self
            .store
            .count_requests_for_item(id, RequestStatus::Approved)
            .await?;
        if on_loan > 0 {
            tracing::warn!(item_id = %id, on_loan, "refusing to delete item with active loans");
            return Err(DomainError::invalid_transition(format!(
                "cannot delete '{}' while {on_loan} unit(s) are on loan",
                current.title()
            ))
            .into());
        }

        let audit = AuditEntry::new(removed_from_catalog_message(current.title()), Utc::now());
        self.store
            .delete_item(id, current.expected_version(), Some(&audit))
            .await?;

        tracing::info!(item_id = %id, title = current.title(), "item removed");
        Ok(())
    }

    async fn load(&self, id: ItemId) -> Result<InventoryItem, ServiceError> {
        self.store
            .get_item(id)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AuditLogStore, CatalogStore, InMemoryInventoryStore, RequestStore};
    use stockroom_auth::Role;
    use stockroom_core::{RequestId, UserId};
    use stockroom_inventory::ItemRequest;

    struct Fixture {
        store: Arc<InMemoryInventoryStore>,
        catalog: Catalog,
        directory: Directory,
    }

    fn setup() -> Fixture {
        let store = Arc::new(InMemoryInventoryStore::new());
        Fixture {
            catalog: Catalog::new(store.clone()),
            directory: Directory::new(store.clone()),
            store,
        }
    }

    impl Fixture {
        async fn admin(&self) -> Principal {
            let admin = self.directory.register("admin", "School Admin").await.unwrap();
            Principal::new(admin.id, vec![Role::ADMIN])
        }

        async fn user(&self) -> Principal {
            let ann = self.directory.register("ann", "Ann Lee").await.unwrap();
            Principal::new(ann.id, vec![Role::USER])
        }
    }

    #[tokio::test]
    async fn create_writes_an_audit_line() {
        let f = setup();
        let a = f.admin().await;
        let item = f.catalog.create(&a, ItemDetails::new("Microscope", 3)).await.unwrap();

        assert_eq!(item.quantity(), 3);
        let audit = f.store.list_audit().await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].message, "Added to catalog: Microscope");
    }

    #[tokio::test]
    async fn users_can_read_but_not_write() {
        let f = setup();
        let a = f.admin().await;
        let u = f.user().await;
        f.catalog.create(&a, ItemDetails::new("Globe", 1)).await.unwrap();

        assert_eq!(f.catalog.list(&u, None).await.unwrap().len(), 1);
        let err = f.catalog.create(&u, ItemDetails::new("Atlas", 1)).await.unwrap_err();
        assert_eq!(err, ServiceError::Forbidden("catalog.write".to_string()));
    }

    #[tokio::test]
    async fn admin_claim_does_not_let_a_user_write() {
        let f = setup();
        let u = f.user().await;
        let claims_admin = Principal::new(u.user_id, vec![Role::ADMIN]);

        let err = f.catalog.create(&claims_admin, ItemDetails::new("Atlas", 1)).await.unwrap_err();
        assert_eq!(err, ServiceError::Forbidden("catalog.write".to_string()));
        assert!(f.store.list_items().await.unwrap().is_empty());
        assert!(f.store.list_audit().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unregistered_principal_is_unresolved() {
        let f = setup();
        let ghost = Principal::new(UserId::new(), vec![Role::ADMIN]);

        assert_eq!(
            f.catalog.create(&ghost, ItemDetails::new("Atlas", 1)).await.unwrap_err(),
            ServiceError::IdentityUnresolved
        );
        assert_eq!(f.catalog.list(&ghost, None).await.unwrap_err(), ServiceError::IdentityUnresolved);
    }

    #[tokio::test]
    async fn keyword_search_is_case_insensitive() {
        let f = setup();
        let a = f.admin().await;
        f.catalog.create(&a, ItemDetails::new("Digital Microscope", 1)).await.unwrap();
        f.catalog.create(&a, ItemDetails::new("Globe", 1)).await.unwrap();

        let hits = f.catalog.list(&a, Some("  SCOPE ")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title(), "Digital Microscope");
        assert_eq!(f.catalog.list(&a, Some("")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_keeps_date_added() {
        let f = setup();
        let a = f.admin().await;
        let item = f.catalog.create(&a, ItemDetails::new("Globe", 1)).await.unwrap();

        let updated = f.catalog.update(&a, item.id(), ItemDetails::new("World Globe", 4)).await.unwrap();
        assert_eq!(updated.title(), "World Globe");
        assert_eq!(updated.quantity(), 4);
        assert_eq!(updated.date_added(), item.date_added());
        assert!(updated.version() > item.version());
    }

    #[tokio::test]
    async fn update_rejects_blank_title() {
        let f = setup();
        let a = f.admin().await;
        let item = f.catalog.create(&a, ItemDetails::new("Globe", 1)).await.unwrap();
        let err = f.catalog.update(&a, item.id(), ItemDetails::new("   ", 1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_is_refused_while_on_loan() {
        let f = setup();
        let a = f.admin().await;
        let item = f.catalog.create(&a, ItemDetails::new("Globe", 1)).await.unwrap();
        let loan = ItemRequest::open(RequestId::new(), item.id(), UserId::new(), Utc::now())
            .with_status(RequestStatus::Approved);
        f.store.insert_request(&loan).await.unwrap();

        let err = f.catalog.delete(&a, item.id()).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));
        assert!(f.store.get_item(item.id()).await.unwrap().is_some());
        assert_eq!(f.store.list_audit().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_and_audits() {
        let f = setup();
        let a = f.admin().await;
        let item = f.catalog.create(&a, ItemDetails::new("Globe", 1)).await.unwrap();

        f.catalog.delete(&a, item.id()).await.unwrap();

        assert_eq!(f.catalog.get(&a, item.id()).await.unwrap_err(), ServiceError::NotFound(Resource::Item));
        let audit = f.store.list_audit().await.unwrap();
        assert!(audit.iter().any(|e| e.message == "Removed from catalog: Globe"));
    }
}
