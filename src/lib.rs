pub mod batch;
pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod progress;
pub mod store;
pub mod studio;

pub use batch::{BatchRunner, ImageGenerator};
pub use config::{BatchPolicy, Config, GeminiConfig, ProgressPolicy, RetentionPolicy};
pub use error::{GenError, Result};
pub use gemini::GeminiClient;
pub use models::*;
pub use progress::{Progress, ProgressTracker};
pub use store::{FileBackend, HistoryStore, MemoryBackend, PersistenceBackend, Preferences};
pub use studio::Studio;
