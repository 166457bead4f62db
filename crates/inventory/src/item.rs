//! Catalog items and their stock bookkeeping.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockroom_core::{AggregateRoot, DomainError, DomainResult, Entity, ItemId};

/// Editable catalog fields of an item (create / update payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetails {
    pub title: String,
    pub quantity: u32,
}

impl ItemDetails {
    pub fn new(title: impl Into<String>, quantity: u32) -> Self {
        Self {
            title: title.into(),
            quantity,
        }
    }

    fn validated(self) -> DomainResult<Self> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("title cannot be empty"));
        }
        Ok(Self {
            title: title.to_string(),
            quantity: self.quantity,
        })
    }
}

/// Aggregate root: InventoryItem.
///
/// `quantity` is the number of units currently on the shelf. Units out on loan
/// are not counted; approving a request takes one unit off, returning it puts
/// one back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    id: ItemId,
    title: String,
    quantity: u32,
    date_added: NaiveDate,
    version: u64,
}

impl InventoryItem {
    /// Create a new catalog entry at version 1.
    pub fn create(id: ItemId, details: ItemDetails, date_added: NaiveDate) -> DomainResult<Self> {
        let details = details.validated()?;
        Ok(Self {
            id,
            title: details.title,
            quantity: details.quantity,
            date_added,
            version: 1,
        })
    }

    /// Rebuild an item from storage without re-validating it.
    pub fn restore(
        id: ItemId,
        title: String,
        quantity: u32,
        date_added: NaiveDate,
        version: u64,
    ) -> Self {
        Self {
            id,
            title,
            quantity,
            date_added,
            version,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn date_added(&self) -> NaiveDate {
        self.date_added
    }

    pub fn is_in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// Case-insensitive substring match on the title.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        self.title.to_lowercase().contains(&keyword.to_lowercase())
    }

    /// Apply a catalog edit. `date_added` is kept from the original record.
    pub fn edited(&self, details: ItemDetails) -> DomainResult<Self> {
        let details = details.validated()?;
        Ok(Self {
            id: self.id,
            title: details.title,
            quantity: details.quantity,
            date_added: self.date_added,
            version: self.version + 1,
        })
    }

    /// Take one unit off the shelf.
    pub fn checked_out(&self) -> DomainResult<Self> {
        let quantity = self
            .quantity
            .checked_sub(1)
            .ok_or_else(|| DomainError::insufficient_quantity(self.title.clone()))?;
        Ok(Self {
            quantity,
            version: self.version + 1,
            ..self.clone()
        })
    }

    /// Put one unit back on the shelf.
    pub fn checked_in(&self) -> DomainResult<Self> {
        let quantity = self
            .quantity
            .checked_add(1)
            .ok_or_else(|| DomainError::invariant("quantity overflow"))?;
        Ok(Self {
            quantity,
            version: self.version + 1,
            ..self.clone()
        })
    }
}

impl Entity for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }
}

impl AggregateRoot for InventoryItem {
    fn version(&self) -> u64 {
        self.version
    }
}
