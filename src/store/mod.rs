pub mod file;
pub mod history;
pub mod memory;
pub mod traits;

use std::sync::Arc;

pub use file::FileBackend;
pub use history::{project, HistoryStore, HISTORY_KEY};
pub use memory::MemoryBackend;
pub use traits::PersistenceBackend;

pub const DARK_MODE_KEY: &str = "ai-image-gen-darkmode";

/// Persisted user preferences, currently just the dark-mode flag. Like the
/// history store, persistence problems are logged and swallowed.
pub struct Preferences {
    backend: Arc<dyn PersistenceBackend>,
}

impl Preferences {
    pub fn new(backend: Arc<dyn PersistenceBackend>) -> Self {
        Self { backend }
    }

    pub async fn dark_mode(&self) -> bool {
        match self.backend.read(DARK_MODE_KEY).await {
            Ok(Some(value)) => value == "true",
            Ok(None) => false,
            Err(e) => {
                log::warn!("Failed to read dark-mode preference: {}", e);
                false
            }
        }
    }

    pub async fn set_dark_mode(&self, enabled: bool) {
        let value = if enabled { "true" } else { "false" };
        if let Err(e) = self.backend.write(DARK_MODE_KEY, value).await {
            log::warn!("Failed to persist dark-mode preference: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dark_mode_round_trips_and_defaults_off() {
        let backend = Arc::new(MemoryBackend::new());
        let prefs = Preferences::new(backend.clone());

        assert!(!prefs.dark_mode().await);
        prefs.set_dark_mode(true).await;
        assert!(prefs.dark_mode().await);
        assert_eq!(
            backend.read(DARK_MODE_KEY).await.unwrap().as_deref(),
            Some("true")
        );
    }
}
