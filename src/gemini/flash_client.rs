use crate::{
    error::{GenError, Result},
    gemini::imagen_client::status_text,
    models::{InlineImage, ReferenceImage},
};
use reqwest::Client;
use serde_json::{json, Value};

/// Client for the `:generateContent` endpoint, covering the dual-image
/// compose mode (virtual try-on).
#[derive(Clone)]
pub struct FlashImageClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl FlashImageClient {
    pub fn new(client: Client, base_url: String, model: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            model,
            api_key,
        }
    }

    /// One compose call: the built-in try-on instruction plus two inline
    /// images, subject first, garment second.
    pub async fn compose(
        &self,
        person: &ReferenceImage,
        clothing: &ReferenceImage,
        extra_prompt: &str,
    ) -> Result<Vec<InlineImage>> {
        let payload = build_compose_payload(person, clothing, extra_prompt);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        log::debug!("Requesting try-on composition from model: {}", self.model);

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

        Ok(parse_content_parts(&body))
    }
}

/// The composite try-on instruction, with the optional free-text modifier
/// substituted. Deterministic for a given modifier.
pub(crate) fn compose_prompt(extra_prompt: &str) -> String {
    let additional = if extra_prompt.trim().is_empty() {
        String::new()
    } else {
        format!("Additional details: {}", extra_prompt.trim())
    };

    format!(
        "Create a highly realistic, photorealistic image showing the person from the first image wearing the clothing item from the second image. \n\n\
IMPORTANT REQUIREMENTS:\n\
- Maintain the exact person's face, body type, pose, and physical features\n\
- Seamlessly fit the clothing from the second image onto the person's body\n\
- Ensure perfect lighting consistency and shadows\n\
- Keep natural fabric draping and wrinkles\n\
- Match the original photo's lighting, background, and atmosphere\n\
- Preserve all facial details, skin tone, and hair\n\
- Make the clothing fit naturally without distortion\n\
- High detail, 8K quality, professional photography\n\n\
{}\n\n\
Generate a single cohesive image that looks like a professional fashion photograph where the person is naturally wearing the clothing item.",
        additional
    )
}

/// Builds the `:generateContent` request body: one text part followed by the
/// two inline-image parts in fixed order.
pub(crate) fn build_compose_payload(
    person: &ReferenceImage,
    clothing: &ReferenceImage,
    extra_prompt: &str,
) -> Value {
    json!({
        "contents": [{
            "parts": [
                { "text": compose_prompt(extra_prompt) },
                {
                    "inlineData": {
                        "mimeType": person.mime_type,
                        "data": person.data,
                    }
                },
                {
                    "inlineData": {
                        "mimeType": clothing.mime_type,
                        "data": clothing.data,
                    }
                },
            ]
        }]
    })
}

/// Scans the first candidate's content parts for `inlineData` payloads;
/// `mimeType` defaults to `image/png` when absent.
pub(crate) fn parse_content_parts(body: &Value) -> Vec<InlineImage> {
    body.get("candidates")
        .and_then(|candidates| candidates.get(0))
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| {
                    let inline = part.get("inlineData")?;
                    let data = inline.get("data").and_then(Value::as_str)?;
                    let mime_type = inline.get("mimeType").and_then(Value::as_str);
                    Some(InlineImage::new(data, mime_type))
                })
                .collect()
        })
        .unwrap_or_default()
}
