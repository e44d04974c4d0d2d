use std::sync::Arc;

use crate::store::MessageStore;

/// Built once at startup and cloned into every handler; nothing in here is
/// mutated after that.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MessageStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }
}
