use crate::{
    batch::{BatchRunner, ImageGenerator},
    config::{Config, ProgressPolicy},
    error::Result,
    gemini::GeminiClient,
    models::{BatchRequest, BatchResult, ReferenceImage},
    progress::{Progress, ProgressTracker},
    store::{FileBackend, HistoryStore, PersistenceBackend, Preferences},
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// The application state in one place: generator, batch runner, history,
/// preferences, and the progress signal. All history mutation goes through
/// this struct's store; nothing else writes it.
pub struct Studio {
    runner: BatchRunner,
    history: HistoryStore,
    preferences: Preferences,
    progress: ProgressTracker,
}

impl Studio {
    /// Gemini-backed studio persisting its history under `data_dir`.
    pub async fn new(config: Config, data_dir: impl Into<PathBuf>) -> Result<Self> {
        let generator = Arc::new(GeminiClient::new(config.gemini.clone())?);
        let backend = Arc::new(FileBackend::new(data_dir));
        Self::with_parts(generator, backend, config).await
    }

    /// Injection point for tests and alternative providers/backends.
    pub async fn with_parts(
        generator: Arc<dyn ImageGenerator>,
        backend: Arc<dyn PersistenceBackend>,
        config: Config,
    ) -> Result<Self> {
        let history = HistoryStore::load(backend.clone(), config.retention.clone()).await;
        Ok(Self {
            runner: BatchRunner::new(generator, config.batch),
            history,
            preferences: Preferences::new(backend),
            progress: ProgressTracker::new(),
        })
    }

    pub async fn generate(&mut self, prompt: &str, count: u32) -> Result<BatchResult> {
        self.run(BatchRequest::text(prompt, count)).await
    }

    pub async fn generate_with_reference(
        &mut self,
        prompt: &str,
        count: u32,
        image: ReferenceImage,
    ) -> Result<BatchResult> {
        self.run(BatchRequest::with_reference(prompt, count, image))
            .await
    }

    pub async fn generate_try_on(
        &mut self,
        person: ReferenceImage,
        clothing: ReferenceImage,
        extra_prompt: Option<&str>,
        count: u32,
    ) -> Result<BatchResult> {
        self.run(BatchRequest::try_on(person, clothing, extra_prompt, count))
            .await
    }

    /// Runs any batch request: estimated progress while the batch is in
    /// flight, successes merged into history, and a corrected final readout
    /// whether the batch succeeded or failed. Partial failure is reported in
    /// the result, never as an error.
    pub async fn run(&mut self, request: BatchRequest) -> Result<BatchResult> {
        request.validate(self.runner.policy().max_count)?;

        let policy = ProgressPolicy::for_mode(request.mode());
        self.progress.begin(request.count, &policy);

        match self.runner.run(&request).await {
            Ok(result) => {
                if let Some(warning) = result.warning() {
                    log::warn!("{}", warning);
                }
                self.history.append(result.images.clone()).await;
                self.progress.finish(result.success_count as u32, &policy);
                Ok(result)
            }
            Err(e) => {
                self.progress.finish(0, &policy);
                Err(e)
            }
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn progress(&self) -> watch::Receiver<Option<Progress>> {
        self.progress.subscribe()
    }
}
