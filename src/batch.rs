use crate::{
    config::BatchPolicy,
    error::{GenError, Result},
    models::{
        BatchEvent, BatchRequest, BatchResult, GenerationMode, ImageRecord, InlineImage,
        ItemFailure,
    },
};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{FuturesOrdered, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// The seam between the orchestrator and the upstream provider: one
/// invocation is exactly one upstream call for one batch item. A call may
/// legitimately yield zero or several images.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_one(&self, request: &BatchRequest) -> Result<Vec<InlineImage>>;
}

/// Fulfils "generate N images" as N independent upstream calls through a
/// paced task queue, tolerating partial failure. With the default policy
/// (concurrency 1, 500ms delay) items run strictly sequentially, which is
/// what the upstream rate limits call for.
pub struct BatchRunner {
    generator: Arc<dyn ImageGenerator>,
    policy: BatchPolicy,
}

impl BatchRunner {
    pub fn new(generator: Arc<dyn ImageGenerator>, policy: BatchPolicy) -> Self {
        Self { generator, policy }
    }

    pub fn policy(&self) -> &BatchPolicy {
        &self.policy
    }

    pub async fn run(&self, request: &BatchRequest) -> Result<BatchResult> {
        self.run_with_events(request, None).await
    }

    /// Runs the batch, emitting per-item lifecycle events when a sender is
    /// supplied. Every item is attempted regardless of earlier failures;
    /// only an all-failure batch comes back as an error.
    pub async fn run_with_events(
        &self,
        request: &BatchRequest,
        events: Option<UnboundedSender<BatchEvent>>,
    ) -> Result<BatchResult> {
        request.validate(self.policy.max_count)?;

        let batch_id = Uuid::new_v4();
        let total = request.count as usize;
        log::info!(
            "Starting batch {} ({} items, mode {:?})",
            batch_id,
            total,
            request.mode()
        );

        let mut queue = FuturesOrdered::new();
        let mut inline_images: Vec<InlineImage> = Vec::new();
        let mut failures: Vec<ItemFailure> = Vec::new();
        let mut next = 0usize;

        while next < total || !queue.is_empty() {
            // Admit items into the in-flight window, pausing before each
            // admission after the first (no trailing delay after the last).
            while next < total && queue.len() < self.policy.concurrency {
                if next > 0 {
                    tokio::time::sleep(self.policy.item_delay).await;
                }
                let index = next + 1;
                emit(&events, BatchEvent::ItemStarted { index, total });

                let generator = Arc::clone(&self.generator);
                let item = request.clone();
                queue.push_back(async move { (index, generator.generate_one(&item).await) });
                next += 1;
            }

            if let Some((index, outcome)) = queue.next().await {
                match outcome {
                    Ok(images) => {
                        emit(
                            &events,
                            BatchEvent::ItemCompleted {
                                index,
                                total,
                                images: images.len(),
                            },
                        );
                        inline_images.extend(images);
                    }
                    Err(e) => {
                        let failure = classify_failure(index, e);
                        log::warn!(
                            "Batch {} item {}/{} failed: {}",
                            batch_id,
                            index,
                            total,
                            failure.message
                        );
                        emit(
                            &events,
                            BatchEvent::ItemFailed {
                                index,
                                total,
                                message: failure.message.clone(),
                            },
                        );
                        failures.push(failure);
                    }
                }
            }
        }

        // Zero images across all items is fatal; at least one image lowers
        // severity to degraded success.
        if inline_images.is_empty() {
            log::error!("Batch {}: all {} generation attempts failed", batch_id, total);
            return Err(GenError::BatchFailed(failures));
        }

        let result = assemble_result(request, inline_images, failures);
        log::info!(
            "Batch {} finished: {} images produced, {} items failed",
            batch_id,
            result.success_count,
            result.failures.len()
        );
        Ok(result)
    }
}

fn emit(events: &Option<UnboundedSender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

/// Folds one item's error into the batch failure list. Upstream rejections
/// keep the raw error body as detail; transport and parse errors carry the
/// message only.
fn classify_failure(index: usize, error: GenError) -> ItemFailure {
    match error {
        GenError::UpstreamError { status, detail } => ItemFailure {
            index,
            message: format!("Failed: {}", status),
            detail: Some(detail),
        },
        other => ItemFailure {
            index,
            message: other.to_string(),
            detail: None,
        },
    }
}

/// Turns the normalized upstream fragments into history records, in the
/// order the items produced them. Ids combine the batch timestamp with a
/// running index so they stay unique within the batch.
fn assemble_result(
    request: &BatchRequest,
    inline_images: Vec<InlineImage>,
    failures: Vec<ItemFailure>,
) -> BatchResult {
    let timestamp = Utc::now().timestamp_millis();
    let prefix = match request.mode() {
        GenerationMode::Compose => "tryon-",
        _ => "",
    };

    let images: Vec<ImageRecord> = inline_images
        .into_iter()
        .enumerate()
        .map(|(seq, inline)| ImageRecord {
            id: format!("{}{}-{}", prefix, timestamp, seq),
            data: inline.data,
            mime_type: inline.mime_type,
            prompt: request.prompt.clone(),
            timestamp,
            aspect_ratio: request.aspect_ratio.clone(),
            style_preset: request.style_preset.clone(),
        })
        .collect();

    let success_count = images.len();
    BatchResult {
        images,
        success_count,
        requested: request.count,
        failures,
    }
}
