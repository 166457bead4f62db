//! Audit trail entries (history of significant actions).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{AuditEntryId, Entity};

/// Immutable, append-only record of something that happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: AuditEntryId::new(),
            message: message.into(),
            timestamp,
        }
    }
}

impl Entity for AuditEntry {
    type Id = AuditEntryId;

    fn id(&self) -> AuditEntryId {
        self.id
    }
}

/// Message written when a unit is handed out.
pub fn issued_message(item_title: &str, requester_name: &str) -> String {
    format!("Issued: {item_title} -> {requester_name}")
}

/// Message written when a unit comes back.
pub fn returned_message(requester_name: &str, item_title: &str) -> String {
    format!("Returned: {requester_name} -> {item_title}")
}

pub fn added_to_catalog_message(item_title: &str) -> String {
    format!("Added to catalog: {item_title}")
}

pub fn removed_from_catalog_message(item_title: &str) -> String {
    format!("Removed from catalog: {item_title}")
}

/// Sort newest first. Entries with equal timestamps fall back to id order,
/// which is creation order for UUIDv7 ids.
pub fn sort_newest_first(entries: &mut [AuditEntry]) {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
}
