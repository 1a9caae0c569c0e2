use std::{net::SocketAddr, sync::Arc};

use axum::http::HeaderValue;
use configs::{AppConfig, CorsConfig};
use dotenvy::dotenv;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use service::collections::{repo::seaorm::SeaOrmCollectionRepository, CollectionService, CollectionStore};

use crate::errors::StartupError;
use crate::routes::{self, HttpOptions};
use crate::state::ServerState;

pub fn build_cors(cfg: &CorsConfig) -> CorsLayer {
    if cfg.is_permissive() {
        return CorsLayer::very_permissive();
    }
    let origins: Vec<HeaderValue> = cfg
        .origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::very_permissive().allow_origin(AllowOrigin::list(origins))
}

/// Connect, migrate, seed the registered collections and wrap it all in handler state.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<ServerState> {
    let db = models::db::connect_and_migrate(&cfg.database).await?;
    let store = CollectionStore::new(Arc::new(SeaOrmCollectionRepository { db }));
    CollectionService::new(store.clone()).seed().await?;

    if cfg.auth.uses_dev_secret() {
        warn!("JWT_SECRET is not set; using the development secret");
    }
    if !cfg.auth.enforce {
        info!("auth.enforce is off; collection routes accept anonymous callers");
    }
    Ok(ServerState::new(store, &cfg.auth))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(err = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                warn!(err = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

/// Serve `cfg` until a shutdown signal arrives.
pub async fn serve(cfg: AppConfig) -> anyhow::Result<()> {
    common::env::ensure_env(cfg.server.frontend_dir.as_deref(), &cfg.server.data_dir)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let state = build_state(&cfg).await?;
    let opts = HttpOptions {
        cors: build_cors(&cfg.cors),
        body_limit_bytes: cfg.server.body_limit_bytes,
        frontend_dir: cfg.server.frontend_dir.clone(),
    };
    let app = routes::build_router(state, opts);

    let addr: SocketAddr = cfg
        .server
        .bind_addr()
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, sqlite = cfg.database.is_sqlite(), "spa console api listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

/// Public entry: load configuration and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    serve(cfg).await
}
