use crate::error::{GenError, Result};
use crate::models::image::{ImageRecord, ReferenceImage};
use serde::{Deserialize, Serialize};

/// The reference images attached to a request. The generation mode is fully
/// determined by which references are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceSet {
    None,
    /// One conditioning image (style/subject reference).
    Single(ReferenceImage),
    /// Two images composed into one output: the primary subject first,
    /// the secondary overlay (e.g. a garment) second. Order is fixed.
    Pair {
        primary: ReferenceImage,
        secondary: ReferenceImage,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationMode {
    TextOnly,
    SingleReference,
    Compose,
}

/// One user-triggered request to produce `count` images, answered by `count`
/// independent upstream calls.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    /// The text prompt. For compose requests this is an optional free-text
    /// modifier appended to the built-in composite instruction.
    pub prompt: String,
    pub count: u32,
    pub references: ReferenceSet,
    pub aspect_ratio: Option<String>,
    pub style_preset: Option<String>,
}

impl BatchRequest {
    pub fn text(prompt: impl Into<String>, count: u32) -> Self {
        Self {
            prompt: prompt.into(),
            count,
            references: ReferenceSet::None,
            aspect_ratio: None,
            style_preset: None,
        }
    }

    pub fn with_reference(prompt: impl Into<String>, count: u32, image: ReferenceImage) -> Self {
        Self {
            prompt: prompt.into(),
            count,
            references: ReferenceSet::Single(image),
            aspect_ratio: None,
            style_preset: None,
        }
    }

    pub fn try_on(
        person: ReferenceImage,
        clothing: ReferenceImage,
        extra_prompt: Option<&str>,
        count: u32,
    ) -> Self {
        Self {
            prompt: extra_prompt.unwrap_or_default().to_string(),
            count,
            references: ReferenceSet::Pair {
                primary: person,
                secondary: clothing,
            },
            aspect_ratio: None,
            style_preset: None,
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(aspect_ratio.into());
        self
    }

    pub fn with_style_preset(mut self, style_preset: impl Into<String>) -> Self {
        self.style_preset = Some(style_preset.into());
        self
    }

    pub fn mode(&self) -> GenerationMode {
        match self.references {
            ReferenceSet::None => GenerationMode::TextOnly,
            ReferenceSet::Single(_) => GenerationMode::SingleReference,
            ReferenceSet::Pair { .. } => GenerationMode::Compose,
        }
    }

    /// Pre-flight checks, rejected before any network call. Compose requests
    /// may have an empty prompt; the other modes require one.
    pub fn validate(&self, max_count: u32) -> Result<()> {
        if self.mode() != GenerationMode::Compose && self.prompt.trim().is_empty() {
            return Err(GenError::ValidationError("Prompt is required".into()));
        }
        if self.count < 1 || self.count > max_count {
            return Err(GenError::ValidationError(format!(
                "Number of images must be between 1 and {}",
                max_count
            )));
        }
        Ok(())
    }
}

/// One batch item's failure: the 1-based item number, a short message, and
/// the raw upstream error body when there was one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub index: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Aggregated outcome of a batch. `success_count == images.len()` always
/// holds; `success_count + failures.len() == requested` does not, since a
/// single call may yield zero or several images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub images: Vec<ImageRecord>,
    pub success_count: usize,
    pub requested: u32,
    pub failures: Vec<ItemFailure>,
}

impl BatchResult {
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    /// The user-facing partial-failure message, or `None` when every item
    /// succeeded.
    pub fn warning(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        Some(format!(
            "Successfully generated {} of {} images. {} failed.",
            self.success_count,
            self.requested,
            self.failures.len()
        ))
    }
}

/// Per-item lifecycle notifications emitted by the batch runner, letting the
/// caller derive true progress instead of guessing from wall-clock timers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    ItemStarted {
        index: usize,
        total: usize,
    },
    ItemCompleted {
        index: usize,
        total: usize,
        images: usize,
    },
    ItemFailed {
        index: usize,
        total: usize,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ReferenceImage {
        ReferenceImage::png("aGVsbG8=")
    }

    #[test]
    fn mode_follows_attached_references() {
        assert_eq!(
            BatchRequest::text("a cat", 1).mode(),
            GenerationMode::TextOnly
        );
        assert_eq!(
            BatchRequest::with_reference("a cat", 1, reference()).mode(),
            GenerationMode::SingleReference
        );
        assert_eq!(
            BatchRequest::try_on(reference(), reference(), None, 1).mode(),
            GenerationMode::Compose
        );
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let request = BatchRequest::text("   ", 2);
        assert!(request.validate(4).is_err());
    }

    #[test]
    fn compose_allows_empty_prompt() {
        let request = BatchRequest::try_on(reference(), reference(), None, 1);
        assert!(request.validate(4).is_ok());
    }

    #[test]
    fn count_must_stay_in_policy_bounds() {
        assert!(BatchRequest::text("a cat", 0).validate(4).is_err());
        assert!(BatchRequest::text("a cat", 5).validate(4).is_err());
        assert!(BatchRequest::text("a cat", 4).validate(4).is_ok());
    }

    #[test]
    fn warning_reports_partial_failure_counts() {
        let result = BatchResult {
            images: vec![],
            success_count: 3,
            requested: 4,
            failures: vec![ItemFailure {
                index: 2,
                message: "Failed: Too Many Requests".into(),
                detail: None,
            }],
        };
        assert_eq!(
            result.warning().unwrap(),
            "Successfully generated 3 of 4 images. 1 failed."
        );
    }
}
