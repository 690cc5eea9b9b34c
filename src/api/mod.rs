pub mod directory;
pub mod health;

use crate::config::Config;
use crate::store::Store;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    #[allow(dead_code)]
    pub config: Config,
}

impl AppState {
    pub fn new(store: Store, config: Config) -> Self {
        Self { store, config }
    }
}
