use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;

use stockroom_auth::UserIdentity;
use stockroom_core::{AggregateRoot, Entity};
use stockroom_inventory::{AuditEntry, InventoryItem, ItemDetails, ItemRequest};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ItemDetailsRequest {
    pub title: String,
    pub quantity: i64,
}

impl ItemDetailsRequest {
    /// Negative quantities are a 400, not a JSON rejection.
    pub fn into_details(self) -> Result<ItemDetails, axum::response::Response> {
        let quantity = u32::try_from(self.quantity).map_err(|_| {
            errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "quantity must be between 0 and 4294967295",
            )
        })?;
        Ok(ItemDetails::new(self.title, quantity))
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemSearchQuery {
    pub keyword: Option<String>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn item_to_json(item: &InventoryItem) -> serde_json::Value {
    json!({
        "id": item.id().to_string(),
        "title": item.title(),
        "quantity": item.quantity(),
        "date_added": item.date_added().to_string(),
        "in_stock": item.is_in_stock(),
        "version": item.version(),
    })
}

pub fn request_to_json(request: &ItemRequest) -> serde_json::Value {
    json!({
        "id": request.id().to_string(),
        "item_id": request.item_id().to_string(),
        "requester_id": request.requester_id().to_string(),
        "status": request.status().as_str(),
        "closed": request.status().is_terminal(),
        "created_at": request.created_at().to_rfc3339(),
    })
}

pub fn audit_to_json(entry: &AuditEntry) -> serde_json::Value {
    json!({
        "id": entry.id.to_string(),
        "message": entry.message,
        "timestamp": entry.timestamp.to_rfc3339(),
    })
}

pub fn user_to_json(user: &UserIdentity) -> serde_json::Value {
    json!({
        "id": user.id.to_string(),
        "username": user.username,
        "full_name": user.full_name,
        "role": user.role.as_str(),
    })
}
