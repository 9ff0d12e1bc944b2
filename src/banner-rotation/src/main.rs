//! Banner rotation service — adaptive banner selection with engagement
//! tracking.
//!
//! Main entry point that initializes storage, the notification channel and
//! the API server.

use clap::Parser;
use rotation_api::ApiServer;
use rotation_core::config::AppConfig;
use rotation_core::notify::{self, NotificationSink};
use rotation_engine::RotationService;
use rotation_notifier::NatsNotifier;
use rotation_storage::PgStorage;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "banner-rotation")]
#[command(about = "Adaptive banner rotation with UCB1 engagement tracking")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "BANNER_ROTATION__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "BANNER_ROTATION__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Postgres connection URL (overrides config)
    #[arg(long, env = "BANNER_ROTATION__DATABASE__URL")]
    database_url: Option<String>,

    /// Run without the NATS notifier (notifications are dropped)
    #[arg(long, default_value_t = false)]
    no_notifier: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "banner_rotation=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Banner rotation service starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        "Configuration loaded"
    );

    // Connect to Postgres and bring the schema up to date. The statistics
    // store is the system of record, so this failure is fatal.
    let storage = Arc::new(PgStorage::connect(&config.database).await?);
    storage.migrate().await?;

    // Connect the notification channel. Engagement recording must not
    // depend on the broker, so failures degrade to a no-op sink.
    let notifier: Arc<dyn NotificationSink> = if cli.no_notifier {
        info!("Running without notifier (--no-notifier)");
        notify::noop_sink()
    } else {
        match NatsNotifier::connect(&config.nats).await {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                error!(error = %e, "Failed to connect to NATS, notifications disabled");
                notify::noop_sink()
            }
        }
    };

    let service = Arc::new(RotationService::new(
        storage.clone(),
        storage.clone(),
        storage,
        notifier,
    ));

    // Start API server
    let api_server = ApiServer::new(config, service);

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("Banner rotation service is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
