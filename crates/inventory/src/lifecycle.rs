//! Request lifecycle decisions (pure, deterministic).
//!
//! Each function takes the current request (and item, when stock moves) and
//! returns a [`Transition`] describing every write the operation needs. Nothing
//! here performs IO: the caller commits the transition atomically, using
//! `Transition::stock`'s expected version to detect a concurrent writer.

use stockroom_core::{AggregateRoot, DomainError, DomainResult, Entity};

use crate::audit::{issued_message, returned_message};
use crate::item::InventoryItem;
use crate::request::{ItemRequest, RequestAction, RequestStatus};

/// New item state plus the version it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub expected_version: u64,
    pub item: InventoryItem,
}

/// All writes produced by one lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Status the request must still be in at commit time.
    pub from: RequestStatus,
    pub request: ItemRequest,
    pub stock: Option<StockChange>,
    pub audit_message: Option<String>,
}

/// PENDING -> APPROVED, taking one unit off the shelf.
pub fn approve(
    request: &ItemRequest,
    item: &InventoryItem,
    requester_name: &str,
) -> DomainResult<Transition> {
    ensure_same_item(request, item)?;
    let to = request.next_status(RequestAction::Approve)?;
    let updated = item.checked_out()?;

    Ok(Transition {
        from: request.status(),
        request: request.with_status(to),
        stock: Some(StockChange {
            expected_version: item.version(),
            item: updated,
        }),
        audit_message: Some(issued_message(item.title(), requester_name)),
    })
}

/// PENDING -> REJECTED. Stock is untouched.
pub fn reject(request: &ItemRequest) -> DomainResult<Transition> {
    let to = request.next_status(RequestAction::Reject)?;
    Ok(Transition {
        from: request.status(),
        request: request.with_status(to),
        stock: None,
        audit_message: None,
    })
}

/// APPROVED -> RETURNED, putting the unit back on the shelf.
pub fn return_loan(
    request: &ItemRequest,
    item: &InventoryItem,
    requester_name: &str,
) -> DomainResult<Transition> {
    ensure_same_item(request, item)?;
    let to = request.next_status(RequestAction::Return)?;
    let updated = item.checked_in()?;

    Ok(Transition {
        from: request.status(),
        request: request.with_status(to),
        stock: Some(StockChange {
            expected_version: item.version(),
            item: updated,
        }),
        audit_message: Some(returned_message(requester_name, item.title())),
    })
}

fn ensure_same_item(request: &ItemRequest, item: &InventoryItem) -> DomainResult<()> {
    if request.item_id() != item.id() {
        return Err(DomainError::invariant("request refers to a different item"));
    }
    Ok(())
}
