pub mod flash_client;
pub mod imagen_client;

use crate::{
    batch::ImageGenerator,
    config::GeminiConfig,
    error::{GenError, Result},
    models::{BatchRequest, InlineImage, ReferenceSet},
};
use async_trait::async_trait;
use reqwest::Client;

pub use flash_client::FlashImageClient;
pub use imagen_client::ImagenClient;

/// Entry point to the Gemini image APIs. Dispatches each batch item to the
/// endpoint its generation mode calls for.
#[derive(Clone)]
pub struct GeminiClient {
    imagen_client: ImagenClient,
    flash_client: FlashImageClient,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GenError::ConfigError("API key not configured".into()))?;

        let client = Client::new();

        Ok(Self {
            imagen_client: ImagenClient::new(
                client.clone(),
                config.base_url.clone(),
                config.imagen_model.clone(),
                api_key.clone(),
            ),
            flash_client: FlashImageClient::new(
                client,
                config.base_url,
                config.flash_model,
                api_key,
            ),
        })
    }

    pub fn imagen(&self) -> &ImagenClient {
        &self.imagen_client
    }

    pub fn flash(&self) -> &FlashImageClient {
        &self.flash_client
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_one(&self, request: &BatchRequest) -> Result<Vec<InlineImage>> {
        match &request.references {
            ReferenceSet::None => {
                self.imagen_client
                    .generate(&request.prompt, None, request.aspect_ratio.as_deref())
                    .await
            }
            ReferenceSet::Single(image) => {
                self.imagen_client
                    .generate(&request.prompt, Some(image), request.aspect_ratio.as_deref())
                    .await
            }
            ReferenceSet::Pair { primary, secondary } => {
                self.flash_client
                    .compose(primary, secondary, &request.prompt)
                    .await
            }
        }
    }
}
