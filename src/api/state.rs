use std::sync::Arc;

use crate::config::AppConfig;
use crate::storage::{DeckStore, KeyValueStore, SettingsStore};

#[derive(Clone)]
pub struct AppState {
    pub decks: Arc<DeckStore>,
    pub settings: Arc<SettingsStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wire both stores to one backend.
    pub fn new(config: AppConfig, backend: Arc<dyn KeyValueStore>) -> Self {
        let decks =
            DeckStore::new(backend.clone()).with_allow_empty_score(config.matches.allow_empty_score);
        Self {
            decks: Arc::new(decks),
            settings: Arc::new(SettingsStore::new(backend)),
            config: Arc::new(config),
        }
    }
}
