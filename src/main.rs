// src/main.rs
mod api;
mod config;
mod diagnosis;
mod geometry;
mod ledger;
mod logging;
mod model;
mod optimizer;
mod ordering;
mod pool;
mod service;
mod types;

use config::AppConfig;

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();
    logging::init();

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            tracing::warn!("Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let pool = match app_config.pool.build_pool() {
        Ok(pool) => pool,
        Err(err) => {
            tracing::error!("Container pool unavailable: {}", err);
            std::process::exit(1);
        }
    };

    tracing::info!("Load planner starting...");
    api::start_api_server(app_config.api, app_config.engine, pool).await;
}
