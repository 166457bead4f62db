//! Infrastructure layer: storage backends, configuration, and the services
//! that drive the lending workflow.

pub mod catalog;
pub mod config;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod store;


pub use catalog::Catalog;
pub use config::{ConfigError, StockroomConfig};
pub use directory::Directory;
pub use error::{ServiceError, StoreError, StoreResult};
pub use lifecycle::RequestLifecycle;
pub use store::{InMemoryInventoryStore, InventoryStore, PostgresInventoryStore};
