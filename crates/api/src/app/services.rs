use std::sync::Arc;

use stockroom_infra::{Catalog, Directory, InventoryStore, RequestLifecycle};

/// Services shared by all handlers, built over one store.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Catalog,
    pub lifecycle: RequestLifecycle,
    pub directory: Directory,
}

impl AppServices {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            catalog: Catalog::new(store.clone()),
            lifecycle: RequestLifecycle::new(store.clone()),
            directory: Directory::new(store),
        }
    }
}
