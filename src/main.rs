use actix_web::{middleware, web, App, HttpServer};
use slabgen::{
    logger::{self, LoggerConfig},
    server, AppConfig, DesignPipeline, GeminiImageClient, HttpAssetFetcher, ReferenceLocator,
};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    // A missing credential stops the process here, before any port is bound.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            return Err(e.into());
        }
    };

    logger::init_with_config(LoggerConfig::from_settings(&config.log)?)?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), &config);
    logger::log_config_info(&config);

    let fetcher = HttpAssetFetcher::new(&config.assets)?;
    let generator = GeminiImageClient::new(&config.gemini)?;
    let pipeline = web::Data::new(DesignPipeline::new(
        ReferenceLocator::from_config(&config.assets),
        Arc::new(fetcher),
        Arc::new(generator),
    ));

    let allow_origin = config.server.cors_allow_origin.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(pipeline.clone())
            .wrap(server::cors_headers(&allow_origin))
            .wrap(middleware::Logger::new("%r %s %b %Dms"))
            .configure(server::routes)
    })
    .keep_alive(config.keep_alive())
    .shutdown_timeout(config.gemini.timeout.as_secs())
    .bind(config.bind_address())?;

    log::info!("🔧 Press Ctrl+C to stop the server");
    server.run().await?;

    log::info!("👋 Server stopped");
    Ok(())
}
