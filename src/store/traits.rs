use crate::error::Result;
use async_trait::async_trait;

/// Key-value persistence behind the history store and preferences. A write
/// may fail on capacity limits; callers are expected to degrade rather than
/// propagate.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>>;
    async fn write(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}
