use crate::{
    error::{GenError, Result},
    store::traits::PersistenceBackend,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Durable backend keeping one JSON file per key under a directory.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl PersistenceBackend for FileBackend {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !Path::new(&path).exists() {
            return Ok(None);
        }
        let value = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| GenError::PersistenceError(e.to_string()))?;
        Ok(Some(value))
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| GenError::PersistenceError(e.to_string()))?;
        tokio::fs::write(self.path_for(key), value)
            .await
            .map_err(|e| GenError::PersistenceError(e.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GenError::PersistenceError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_values_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());

        assert!(backend.read("history").await.unwrap().is_none());
        backend.write("history", "[1,2,3]").await.unwrap();
        assert_eq!(
            backend.read("history").await.unwrap().as_deref(),
            Some("[1,2,3]")
        );

        backend.remove("history").await.unwrap();
        assert!(backend.read("history").await.unwrap().is_none());
        // Removing a missing key is a no-op.
        backend.remove("history").await.unwrap();
    }
}
