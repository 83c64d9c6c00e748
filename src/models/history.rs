use serde::{Deserialize, Serialize};

/// Sort order for a history projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Timestamp descending.
    Newest,
    /// Timestamp ascending.
    Oldest,
    /// Lexicographic by prompt.
    Prompt,
}

/// Aggregate counters over the full history, for the stats dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_images: usize,
    pub today_images: usize,
    pub favorite_style: String,
    pub most_used_ratio: String,
}
