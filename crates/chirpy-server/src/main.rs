mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use chirpy_api::{AppState, AppStateInner};
use chirpy_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "chirpy_server=debug,chirpy_api=debug,chirpy_db=debug,chirpy_auth=debug,tower_http=debug".into()
                }),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {e}");
            eprintln!("       Set JWT_SECRET and POLKA_SECRET in your .env file and restart.");
            std::process::exit(1);
        }
    };

    // Init document store
    let db = if config.keep_db {
        Database::open(&config.db_path)?
    } else {
        Database::initialize(&config.db_path)?
    };

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret,
        polka_key: config.polka_key,
    });

    let app = chirpy_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Chirpy server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
