use clap::Parser;
use dotenv::dotenv;
use sea_orm::{ConnectOptions, Database};
use std::env;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use recipebox::db::schema::setup_schema;
use recipebox::server::config::ServerConfig;
use recipebox::server::db_ready::wait_for_db;
use recipebox::web::create_axum_router;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Override the listen address from the environment.
    #[arg(long)]
    bind: Option<String>,
}

fn init_logging() {
    // File: JSON, daily rotation. Stdout: human-readable.
    let file_appender = rolling::daily("logs", "server.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    init_logging();
    dotenv().ok();

    let config = match ServerConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Failed to load server configuration: {}", e);
            return Err(e.into());
        }
    };

    let database_url =
        env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set in the environment")?;

    let db_pool = wait_for_db(
        || {
            let mut opt = ConnectOptions::new(database_url.clone());
            opt.max_connections(10);
            Database::connect(opt)
        },
        Duration::from_secs(1),
    )
    .await;

    setup_schema(&db_pool).await?;

    let bind_addr = args.bind.unwrap_or_else(|| config.bind_addr.clone());
    let app = create_axum_router(db_pool, config);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("recipebox listening on {}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
