use crate::{
    error::{GenError, Result},
    store::traits::PersistenceBackend,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Ephemeral backend. With `max_value_len` set it rejects oversized writes
/// the way a browser quota does, which makes degradation paths testable.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
    max_value_len: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(max_value_len: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_value_len: Some(max_value_len),
        }
    }
}

#[async_trait]
impl PersistenceBackend for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| GenError::PersistenceError(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        if let Some(max) = self.max_value_len {
            if value.len() > max {
                return Err(GenError::PersistenceError(format!(
                    "Quota exceeded: {} bytes > {} byte limit",
                    value.len(),
                    max
                )));
            }
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| GenError::PersistenceError(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| GenError::PersistenceError(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}
