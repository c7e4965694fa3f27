use doodlegif::{logger, server, Config, GeminiClient, Pipeline};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_loaded = dotenv::dotenv().is_ok();

    logger::init_with_config(logger::LoggerConfig::from_env())?;

    if env_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = Config::from_env();
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), &config);
    logger::log_config_info(&config);

    log::info!("🔄 Creating Gemini client...");
    let client = match GeminiClient::new(&config.gemini) {
        Ok(client) => {
            log::info!("✅ Gemini client initialized successfully");
            log::debug!(
                "Clients ready: text={} image={}",
                client.text().model(),
                client.image().model()
            );
            client
        }
        Err(e) => {
            log::error!("❌ Failed to initialize Gemini client: {}", e);
            return Err(e.into());
        }
    };

    let pipeline = Pipeline::new(Arc::new(client), &config);

    log::info!("🚀 Listening on http://{}:{}", config.host, config.port);
    server::run(config, pipeline).await?;

    log::info!("👋 Server stopped");
    Ok(())
}
