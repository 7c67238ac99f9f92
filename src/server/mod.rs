//! JSON HTTP API over a [`Store`].

pub mod error;
mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, patch};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

pub fn router(store: Arc<dyn Store>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route(
            "/tasks/{id}",
            patch(handlers::update_task).delete(handlers::delete_task),
        )
        .route("/notes", get(handlers::get_notes).put(handlers::put_notes))
        .route("/actions", get(handlers::list_actions))
        .with_state(AppState { store })
        .layer(cors)
}

#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub bind: String,
    /// Directory of static files served for any path the API does not claim.
    pub assets: Option<PathBuf>,
}

/// Bind and serve until Ctrl-C. The store must already be initialized.
pub async fn serve(store: Arc<dyn Store>, options: ServeOptions) -> Result<()> {
    let mut app = router(store);
    if let Some(dir) = &options.assets {
        if !dir.is_dir() {
            anyhow::bail!("assets directory {} does not exist", dir.display());
        }
        app = app.fallback_service(ServeDir::new(dir));
    }

    let listener = tokio::net::TcpListener::bind(&options.bind)
        .await
        .with_context(|| format!("failed to bind {}", options.bind))?;
    log::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    log::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("shutdown requested");
}
