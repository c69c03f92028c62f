//! Persisted display settings.

use std::sync::Arc;

use tracing::{info, warn};

use super::{KeyValueStore, StorageError, SETTINGS_KEY};
use crate::models::Settings;

pub struct SettingsStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Load settings. Missing or unreadable values fall back to defaults.
    pub async fn load(&self) -> Settings {
        match self.backend.get(SETTINGS_KEY).await {
            Ok(Some(data)) => serde_json::from_str(&data).unwrap_or_else(|e| {
                warn!("Ignoring malformed settings: {}", e);
                Settings::default()
            }),
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!("Failed to read settings, using defaults: {}", e);
                Settings::default()
            }
        }
    }

    pub async fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        let data = serde_json::to_string(settings)?;
        self.backend.set(SETTINGS_KEY, &data).await?;
        info!(
            "Saved settings (dark_mode={}, display_style={:?})",
            settings.dark_mode, settings.display_style
        );
        Ok(())
    }
}
