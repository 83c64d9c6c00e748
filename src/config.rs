use crate::models::GenerationMode;
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGEN_MODEL: &str = "imagen-4.0-ultra-generate-001";
pub const DEFAULT_FLASH_MODEL: &str = "gemini-2.5-flash-image";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Model used for text-only and single-reference generation.
    pub imagen_model: String,
    /// Model used for dual-image compose (virtual try-on).
    pub flash_model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            imagen_model: DEFAULT_IMAGEN_MODEL.to_string(),
            flash_model: DEFAULT_FLASH_MODEL.to_string(),
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY").ok();

        GeminiConfig {
            api_key,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_imagen_model(mut self, model: impl Into<String>) -> Self {
        self.imagen_model = model.into();
        self
    }

    pub fn with_flash_model(mut self, model: impl Into<String>) -> Self {
        self.flash_model = model.into();
        self
    }
}

/// Task-queue knobs for a batch: how many upstream calls may be in flight at
/// once and how long to pause before admitting each call after the first.
/// The defaults reproduce the strictly sequential, 500ms-paced behavior the
/// upstream rate limits call for.
#[derive(Debug, Clone)]
pub struct BatchPolicy {
    pub concurrency: usize,
    pub item_delay: Duration,
    pub max_count: u32,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        BatchPolicy {
            concurrency: 1,
            item_delay: Duration::from_millis(500),
            max_count: 4,
        }
    }
}

impl BatchPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_item_delay(mut self, item_delay: Duration) -> Self {
        self.item_delay = item_delay;
        self
    }

    pub fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = max_count;
        self
    }
}

/// History capacity ladder: `primary_cap` records normally, degrading to
/// `fallback_cap` when the persistence layer rejects a write.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    pub primary_cap: usize,
    pub fallback_cap: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        RetentionPolicy {
            primary_cap: 50,
            fallback_cap: 20,
        }
    }
}

impl RetentionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caps(mut self, primary_cap: usize, fallback_cap: usize) -> Self {
        self.primary_cap = primary_cap;
        self.fallback_cap = fallback_cap;
        self
    }
}

/// Pacing of the estimated progress indicator: one tick advances the
/// estimate by one item; the final corrected readout is held for `hold`
/// before clearing.
#[derive(Debug, Clone)]
pub struct ProgressPolicy {
    pub tick: Duration,
    pub hold: Duration,
}

impl ProgressPolicy {
    /// Observed per-item timings: ~8s for plain generation, ~10s for the
    /// slower dual-image compose.
    pub fn for_mode(mode: GenerationMode) -> Self {
        let tick = match mode {
            GenerationMode::Compose => Duration::from_secs(10),
            _ => Duration::from_secs(8),
        };
        ProgressPolicy {
            tick,
            hold: Duration::from_secs(2),
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub batch: BatchPolicy,
    pub retention: RetentionPolicy,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            gemini: GeminiConfig::from_env(),
            ..Self::default()
        }
    }

    pub fn with_gemini(mut self, gemini: GeminiConfig) -> Self {
        self.gemini = gemini;
        self
    }

    pub fn with_batch(mut self, batch: BatchPolicy) -> Self {
        self.batch = batch;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }
}
