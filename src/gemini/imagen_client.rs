use crate::{
    error::{GenError, Result},
    models::{InlineImage, ReferenceImage},
};
use reqwest::Client;
use serde_json::{json, Value};

/// Client for the Imagen `:predict` endpoint, covering text-only and
/// single-reference generation.
#[derive(Clone)]
pub struct ImagenClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl ImagenClient {
    pub fn new(client: Client, base_url: String, model: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            model,
            api_key,
        }
    }

    /// Issues exactly one upstream call and normalizes the response. A
    /// non-success status comes back as `UpstreamError` carrying the status
    /// text and the raw error body.
    pub async fn generate(
        &self,
        prompt: &str,
        reference: Option<&ReferenceImage>,
        aspect_ratio: Option<&str>,
    ) -> Result<Vec<InlineImage>> {
        let payload = build_predict_payload(prompt, reference, aspect_ratio);
        let url = format!("{}/models/{}:predict", self.base_url, self.model);

        log::debug!("Requesting image prediction from model: {}", self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenError::RequestError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            log::error!("Gemini API error ({}): {}", status, detail);
            return Err(GenError::UpstreamError {
                status: status_text(status),
                detail,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenError::ResponseError(e.to_string()))?;

        Ok(parse_predictions(&body))
    }
}

pub(crate) fn status_text(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}

/// Builds the `:predict` request body. One batch item maps to one call, so
/// `sampleCount` is always 1.
pub(crate) fn build_predict_payload(
    prompt: &str,
    reference: Option<&ReferenceImage>,
    aspect_ratio: Option<&str>,
) -> Value {
    let mut instance = json!({ "prompt": prompt.trim() });
    if let Some(image) = reference {
        instance["image"] = json!({ "bytesBase64Encoded": image.data });
    }

    json!({
        "instances": [instance],
        "parameters": {
            "sampleCount": 1,
            "aspectRatio": aspect_ratio.unwrap_or("1:1"),
            "personGeneration": "allow_adult",
        },
    })
}

/// Scans `predictions[]` for inline-image payloads. The image bytes appear
/// either at the top level or nested under `image`; `mimeType` defaults to
/// `image/png` when absent.
pub(crate) fn parse_predictions(body: &Value) -> Vec<InlineImage> {
    body.get("predictions")
        .and_then(Value::as_array)
        .map(|predictions| {
            predictions
                .iter()
                .filter_map(|prediction| {
                    let data = prediction
                        .get("bytesBase64Encoded")
                        .and_then(Value::as_str)
                        .or_else(|| {
                            prediction
                                .get("image")
                                .and_then(|image| image.get("bytesBase64Encoded"))
                                .and_then(Value::as_str)
                        })?;
                    let mime_type = prediction.get("mimeType").and_then(Value::as_str);
                    Some(InlineImage::new(data, mime_type))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_only_payload_has_single_text_instance() {
        let payload = build_predict_payload("  a cat on a mat  ", None, Some("16:9"));

        assert_eq!(payload["instances"][0]["prompt"], "a cat on a mat");
        assert!(payload["instances"][0].get("image").is_none());
        assert_eq!(payload["parameters"]["sampleCount"], 1);
        assert_eq!(payload["parameters"]["aspectRatio"], "16:9");
    }

    #[test]
    fn reference_payload_carries_inline_image() {
        let reference = ReferenceImage::png("Zm9v");
        let payload = build_predict_payload("a cat", Some(&reference), None);

        assert_eq!(
            payload["instances"][0]["image"]["bytesBase64Encoded"],
            "Zm9v"
        );
        assert_eq!(payload["parameters"]["aspectRatio"], "1:1");
    }

    #[test]
    fn parses_both_prediction_shapes() {
        let body = json!({
            "predictions": [
                { "bytesBase64Encoded": "YWJj", "mimeType": "image/jpeg" },
                { "image": { "bytesBase64Encoded": "ZGVm" } },
            ]
        });

        let images = parse_predictions(&body);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].data, "YWJj");
        assert_eq!(images[0].mime_type, "image/jpeg");
        assert_eq!(images[1].data, "ZGVm");
        assert_eq!(images[1].mime_type, "image/png");
    }

    #[test]
    fn missing_predictions_yield_no_images() {
        assert!(parse_predictions(&json!({})).is_empty());
        assert!(parse_predictions(&json!({ "predictions": [] })).is_empty());
    }
}
