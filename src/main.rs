use base64::{engine::general_purpose::STANDARD, Engine as _};
use pixgen::{Config, SortKey, Studio};
use std::env;
use std::fs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file first
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded successfully"),
        Err(_) => log::warn!("⚠️  No .env file found, using system environment variables"),
    }

    pixgen::logger::init_with_config(
        pixgen::logger::LoggerConfig::development()
            .with_level(pixgen::logger::LogLevel::Debug),
    )?;

    log::info!("🔍 Checking environment...");
    match env::var("GEMINI_API_KEY") {
        Ok(key) => {
            log::info!("✅ Gemini API key found in environment");
            log::debug!("Key starts with: {}...", &key[..5.min(key.len())]);
        }
        Err(_) => {
            log::error!("❌ GEMINI_API_KEY is not set, generation requests will fail");
        }
    }

    let config = Config::from_env();

    log::info!("🔄 Creating studio...");
    let mut studio = match Studio::new(config, ".pixgen").await {
        Ok(studio) => {
            log::info!("✅ Studio initialized successfully");
            studio
        }
        Err(e) => {
            log::error!("❌ Failed to initialize studio: {}", e);
            return Err(e.into());
        }
    };

    if !studio.history().is_empty() {
        let stats = studio.history().stats();
        log::info!(
            "🖼️  Restored {} images from history ({} generated today)",
            stats.total_images,
            stats.today_images
        );
        log::info!(
            "🎭 Favorite style: {} | 📏 Most used ratio: {}",
            stats.favorite_style,
            stats.most_used_ratio
        );
    }

    log::info!("🎨 Generating a small batch...");
    let prompt = "A serene landscape with mountains and a lake at sunset, digital art style";

    match studio.generate(prompt, 2).await {
        Ok(result) => {
            log::info!(
                "✅ Batch finished: {} of {} images produced",
                result.success_count,
                result.requested
            );
            if let Some(warning) = result.warning() {
                log::warn!("⚠️  {}", warning);
            }

            for record in &result.images {
                let filename = format!("generated_{}.png", record.id);
                match STANDARD.decode(&record.data) {
                    Ok(bytes) => match fs::write(&filename, bytes) {
                        Ok(_) => log::info!("💾 Image saved to: {}", filename),
                        Err(e) => log::error!("❌ Failed to save image: {}", e),
                    },
                    Err(e) => log::error!("❌ Failed to decode base64 image: {}", e),
                }
            }
        }
        Err(e) => {
            log::error!("❌ Batch failed: {}", e);
        }
    }

    let recent = studio.history().project("", SortKey::Newest);
    log::info!("📚 History now holds {} images", recent.len());
    for record in recent.iter().take(5) {
        log::info!("   {} — {}", record.id, record.prompt);
    }

    log::info!("🎉 Done!");
    Ok(())
}
