//! Inventory lending domain module.
//!
//! This crate contains business rules for the item catalog, loan requests and
//! the audit trail, implemented purely as deterministic domain logic (no IO,
//! no HTTP, no storage).

pub mod audit;
pub mod item;
pub mod lifecycle;
pub mod request;

pub use audit::AuditEntry;
pub use item::{InventoryItem, ItemDetails};
pub use lifecycle::{StockChange, Transition};
pub use request::{ItemRequest, RequestAction, RequestStatus};
