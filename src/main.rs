use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use blogsmith::config::Config;
use blogsmith::db::Database;
use blogsmith::generator::ModelDraftGenerator;
use blogsmith::pipeline::Pipeline;
use blogsmith::topics::FeedTopicSource;
use blogsmith::{scheduler, web};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    init_tracing()?;

    info!("Starting blogsmith");

    // Load and validate configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(model = %config.openai_model, site_url = %config.site_url, "Configuration loaded");

    if config.news_api_key.is_none() {
        info!("NEWS_API_KEY not set, news topic feed disabled");
    }
    if config.image_api_key.is_none() {
        info!("IMAGE_API_KEY not set, cover image generation disabled");
    }

    // Ensure the database directory exists
    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    // Initialize database
    let db = Database::new(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    info!("Database initialized");

    // Wire the pipeline
    let topics = Arc::new(FeedTopicSource::new(&config).context("Failed to build topic source")?);
    let generator =
        Arc::new(ModelDraftGenerator::new(&config).context("Failed to build generator")?);
    let pipeline = Arc::new(Pipeline::new(&config, topics, generator, db));

    // Start the publish scheduler in the background when enabled
    let scheduler_handle = if config.scheduler_enabled {
        let scheduler_pipeline = Arc::clone(&pipeline);
        let scheduler_config = config.clone();
        info!(
            posts_per_day = config.posts_per_day,
            "Publish scheduler enabled"
        );
        Some(tokio::spawn(async move {
            scheduler::run_loop(scheduler_pipeline, scheduler_config).await;
        }))
    } else {
        info!("Publish scheduler disabled");
        None
    };

    // Start the web server in the background
    let web_pipeline = Arc::clone(&pipeline);
    let web_config = config;
    let web_handle = tokio::spawn(async move {
        if let Err(e) = web::serve(web_config, web_pipeline).await {
            error!("Web server error: {e:#}");
        }
    });

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutting down...");

    web_handle.abort();
    if let Some(handle) = scheduler_handle {
        handle.abort();
    }

    info!("Shutdown complete");

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,blogsmith=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        // Pretty-printed logging for development
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
