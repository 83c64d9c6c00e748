use crate::{
    config::RetentionPolicy,
    error::{GenError, Result},
    models::{HistoryStats, ImageRecord, SortKey},
    store::traits::PersistenceBackend,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

pub const HISTORY_KEY: &str = "ai-image-gen-history";

/// Bounded, persisted, newest-first record of every generated image. The
/// in-memory copy is authoritative; persistence failures degrade the cap and
/// never surface to callers.
pub struct HistoryStore {
    records: Vec<ImageRecord>,
    backend: Arc<dyn PersistenceBackend>,
    policy: RetentionPolicy,
    cap: usize,
}

impl HistoryStore {
    /// Loads the persisted history, tolerating a missing or corrupt payload.
    pub async fn load(backend: Arc<dyn PersistenceBackend>, policy: RetentionPolicy) -> Self {
        let records = match backend.read(HISTORY_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ImageRecord>>(&raw) {
                Ok(records) => records,
                Err(e) => {
                    log::error!("Failed to parse stored images: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Failed to read stored images: {}", e);
                Vec::new()
            }
        };

        let cap = policy.primary_cap;
        Self {
            records,
            backend,
            policy,
            cap,
        }
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The current capacity; starts at the primary cap and degrades under
    /// persistence pressure.
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Prepends the new records in the order produced, evicts past the cap,
    /// and persists. Infallible by contract: a failed write degrades, it
    /// does not abort the append.
    pub async fn append(&mut self, new_records: Vec<ImageRecord>) {
        if new_records.is_empty() {
            return;
        }

        let mut merged = new_records;
        merged.append(&mut self.records);
        self.records = merged;
        self.evict();
        self.persist().await;
    }

    /// Removes exactly one record matching `id`; no-op if absent.
    pub async fn remove(&mut self, id: &str) {
        if let Some(pos) = self.records.iter().position(|r| r.id == id) {
            self.records.remove(pos);
            self.persist().await;
        }
    }

    /// Empties the store and drops the persisted copy.
    pub async fn clear(&mut self) {
        self.records.clear();
        if let Err(e) = self.backend.remove(HISTORY_KEY).await {
            log::warn!("Failed to remove stored images: {}", e);
        }
    }

    pub fn project(&self, search_term: &str, sort_key: SortKey) -> Vec<ImageRecord> {
        project(&self.records, search_term, sort_key)
    }

    /// Aggregates for the stats dashboard.
    pub fn stats(&self) -> HistoryStats {
        let today = Utc::now().date_naive();
        let today_images = self
            .records
            .iter()
            .filter(|r| {
                DateTime::from_timestamp_millis(r.timestamp)
                    .map(|t| t.date_naive() == today)
                    .unwrap_or(false)
            })
            .count();

        let mut style_counts: HashMap<&str, usize> = HashMap::new();
        let mut ratio_counts: HashMap<&str, usize> = HashMap::new();
        for record in &self.records {
            let style = record.style_preset.as_deref().unwrap_or("realistic");
            let ratio = record.aspect_ratio.as_deref().unwrap_or("1:1");
            *style_counts.entry(style).or_insert(0) += 1;
            *ratio_counts.entry(ratio).or_insert(0) += 1;
        }

        HistoryStats {
            total_images: self.records.len(),
            today_images,
            favorite_style: most_frequent(&style_counts, "realistic"),
            most_used_ratio: most_frequent(&ratio_counts, "1:1"),
        }
    }

    /// Oldest records live at the tail, so the cap is a simple truncation.
    fn evict(&mut self) {
        if self.records.len() > self.cap {
            self.records.truncate(self.cap);
        }
    }

    /// Degradation ladder: on a failed write, drop to the fallback cap and
    /// retry once; if that also fails, keep the in-memory copy only.
    async fn persist(&mut self) {
        if let Err(e) = self.write_snapshot().await {
            log::warn!(
                "History write failed ({}); reducing retained images from {} to {}",
                e,
                self.cap,
                self.policy.fallback_cap
            );
            self.cap = self.cap.min(self.policy.fallback_cap);
            self.evict();

            if let Err(e) = self.write_snapshot().await {
                log::error!(
                    "History write failed after reducing retention; keeping in-memory copy only: {}",
                    e
                );
            }
        }
    }

    async fn write_snapshot(&self) -> Result<()> {
        let raw = serde_json::to_string(&self.records)
            .map_err(|e| GenError::SerializationError(e.to_string()))?;
        self.backend.write(HISTORY_KEY, &raw).await
    }
}

/// Filtered and sorted view of the history. Pure in `(records, search_term,
/// sort_key)`: case-insensitive substring match on the prompt (an empty or
/// whitespace term matches everything), then the requested ordering.
pub fn project(records: &[ImageRecord], search_term: &str, sort_key: SortKey) -> Vec<ImageRecord> {
    let term = search_term.trim().to_lowercase();
    let mut filtered: Vec<ImageRecord> = records
        .iter()
        .filter(|r| term.is_empty() || r.prompt.to_lowercase().contains(&term))
        .cloned()
        .collect();

    match sort_key {
        SortKey::Newest => filtered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        SortKey::Oldest => filtered.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
        SortKey::Prompt => filtered.sort_by(|a, b| a.prompt.cmp(&b.prompt)),
    }

    filtered
}

fn most_frequent(counts: &HashMap<&str, usize>, default: &str) -> String {
    counts
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryBackend;

    fn record(id: &str, timestamp: i64, prompt: &str) -> ImageRecord {
        ImageRecord {
            id: id.into(),
            data: "aW1n".into(),
            mime_type: "image/png".into(),
            prompt: prompt.into(),
            timestamp,
            aspect_ratio: None,
            style_preset: None,
        }
    }

    async fn empty_store(policy: RetentionPolicy) -> (HistoryStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let store = HistoryStore::load(backend.clone(), policy).await;
        (store, backend)
    }

    #[tokio::test]
    async fn projection_orders_by_timestamp() {
        let (mut store, _) = empty_store(RetentionPolicy::default()).await;
        store
            .append(vec![record("a", 100, "first"), record("b", 200, "second")])
            .await;

        let oldest: Vec<_> = store
            .project("", SortKey::Oldest)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(oldest, vec!["a", "b"]);

        let newest: Vec<_> = store
            .project("", SortKey::Newest)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(newest, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn projection_filters_prompts_case_insensitively() {
        let (mut store, _) = empty_store(RetentionPolicy::default()).await;
        store
            .append(vec![
                record("a", 100, "a cat on a mat"),
                record("b", 200, "a dog"),
            ])
            .await;

        let hits = store.project("CAT", SortKey::Newest);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");

        // Whitespace-only terms match everything.
        assert_eq!(store.project("   ", SortKey::Newest).len(), 2);
    }

    #[tokio::test]
    async fn projection_sorts_by_prompt_lexicographically() {
        let (mut store, _) = empty_store(RetentionPolicy::default()).await;
        store
            .append(vec![
                record("a", 100, "zebra"),
                record("b", 200, "apple"),
                record("c", 300, "mango"),
            ])
            .await;

        let prompts: Vec<_> = store
            .project("", SortKey::Prompt)
            .into_iter()
            .map(|r| r.prompt)
            .collect();
        assert_eq!(prompts, vec!["apple", "mango", "zebra"]);
    }

    #[tokio::test]
    async fn capacity_keeps_the_most_recently_appended_records() {
        let (mut store, _) = empty_store(RetentionPolicy::default()).await;
        for i in 0..55 {
            store
                .append(vec![record(&format!("r{}", i), i as i64, "prompt")])
                .await;
        }

        assert_eq!(store.len(), 50);
        assert!(store.records().iter().all(|r| r.id != "r4"));
        assert_eq!(store.records().last().unwrap().id, "r5");
        assert_eq!(store.records().first().unwrap().id, "r54");

        // One more append evicts the single oldest survivor.
        store.append(vec![record("r55", 55, "prompt")]).await;
        assert_eq!(store.len(), 50);
        assert!(store.records().iter().all(|r| r.id != "r5"));
        assert_eq!(store.records().first().unwrap().id, "r55");
    }

    #[tokio::test]
    async fn persisted_history_round_trips_losslessly() {
        let backend = Arc::new(MemoryBackend::new());
        let mut store =
            HistoryStore::load(backend.clone(), RetentionPolicy::default()).await;
        let records = vec![
            ImageRecord {
                id: "1700000000000-0".into(),
                data: "aW1n".into(),
                mime_type: "image/jpeg".into(),
                prompt: "a cat".into(),
                timestamp: 1_700_000_000_000,
                aspect_ratio: Some("16:9".into()),
                style_preset: Some("anime".into()),
            },
            record("1700000000001-0", 1_700_000_000_001, "a dog"),
        ];
        store.append(records.clone()).await;

        let reloaded = HistoryStore::load(backend, RetentionPolicy::default()).await;
        assert_eq!(reloaded.records(), store.records());
        assert_eq!(reloaded.records()[0].id, "1700000000000-0");
    }

    #[tokio::test]
    async fn corrupt_persisted_history_starts_empty() {
        let backend = Arc::new(MemoryBackend::new());
        backend.write(HISTORY_KEY, "not json").await.unwrap();

        let store = HistoryStore::load(backend, RetentionPolicy::default()).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn quota_failure_degrades_cap_and_retries() {
        // Five small records overflow the quota, two fit.
        let backend = Arc::new(MemoryBackend::with_quota(200));
        let policy = RetentionPolicy::default().with_caps(5, 2);
        let mut store = HistoryStore::load(backend.clone(), policy).await;

        store
            .append((0..5).map(|i| record(&format!("r{}", i), i as i64, "p")).collect())
            .await;

        assert_eq!(store.cap(), 2);
        assert_eq!(store.len(), 2);
        let persisted = backend.read(HISTORY_KEY).await.unwrap().unwrap();
        let parsed: Vec<ImageRecord> = serde_json::from_str(&persisted).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].id, "r0");
    }

    #[tokio::test]
    async fn persistence_failure_never_loses_the_in_memory_copy() {
        let backend = Arc::new(MemoryBackend::with_quota(1));
        let policy = RetentionPolicy::default().with_caps(5, 3);
        let mut store = HistoryStore::load(backend.clone(), policy).await;

        store
            .append(vec![
                record("a", 1, "p"),
                record("b", 2, "p"),
                record("c", 3, "p"),
            ])
            .await;

        // Both writes failed, but the append still took effect in memory.
        assert_eq!(store.len(), 3);
        assert!(backend.read(HISTORY_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_drops_exactly_one_record() {
        let (mut store, backend) = empty_store(RetentionPolicy::default()).await;
        store
            .append(vec![record("a", 100, "p"), record("b", 200, "p")])
            .await;

        store.remove("a").await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].id, "b");

        // Absent id is a no-op.
        store.remove("zzz").await;
        assert_eq!(store.len(), 1);

        let persisted = backend.read(HISTORY_KEY).await.unwrap().unwrap();
        let parsed: Vec<ImageRecord> = serde_json::from_str(&persisted).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[tokio::test]
    async fn clear_empties_store_and_persisted_copy() {
        let (mut store, backend) = empty_store(RetentionPolicy::default()).await;
        store.append(vec![record("a", 100, "p")]).await;

        store.clear().await;
        assert!(store.is_empty());
        assert!(backend.read(HISTORY_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stats_count_styles_ratios_and_todays_images() {
        let (mut store, _) = empty_store(RetentionPolicy::default()).await;
        let now = Utc::now().timestamp_millis();

        let mut anime_now = record("a", now, "p");
        anime_now.style_preset = Some("anime".into());
        anime_now.aspect_ratio = Some("16:9".into());
        let mut anime_old = record("b", 1_000, "p");
        anime_old.style_preset = Some("anime".into());
        anime_old.aspect_ratio = Some("16:9".into());
        let plain_old = record("c", 2_000, "p");

        store.append(vec![anime_now, anime_old, plain_old]).await;

        let stats = store.stats();
        assert_eq!(stats.total_images, 3);
        assert_eq!(stats.today_images, 1);
        assert_eq!(stats.favorite_style, "anime");
        assert_eq!(stats.most_used_ratio, "16:9");
    }
}
