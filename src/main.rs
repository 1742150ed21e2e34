use std::sync::Arc;

use dotenvy::dotenv;
use snafu::ResultExt;

use posts_statistics::api::{self, App};
use posts_statistics::config::Config;
use posts_statistics::database::Database;
use posts_statistics::error::*;
use posts_statistics::logger;
use posts_statistics::model::SystemClock;

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = Config::from_env().context(ConfigLoadSnafu)?;

    let _guard = logger::init(&config)?;

    let database = Database::connect(&config.database, Arc::new(SystemClock))
        .await
        .context(ConnectDatabaseSnafu)?;

    let router = api::create_router(App::new(database));

    let listener = tokio::net::TcpListener::bind(config.host)
        .await
        .context(BindAddressSnafu {
            address: config.host,
        })?;

    tracing::info!(address = %config.host, "serving posts statistics");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context(WebServerSnafu)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for the shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }

    tracing::info!("shutting down");
}
