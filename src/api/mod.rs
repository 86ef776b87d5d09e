//! HTTP front-end
//!
//! An axum router exposing the scraped records in the Stack Exchange API
//! shape:
//! - `GET /questions`
//! - `GET /questions/{ids}`
//! - `GET /questions/{ids}/answers`
//! - `GET /answers/{ids}`
//! - `GET /collectives`
//!
//! Ids are `;`-separated. Unknown routes answer 404 `no_method`.

mod error;
mod handlers;
pub mod params;

pub use error::ApiError;

use crate::config::Config;
use crate::crawler::Coordinator;
use axum::{routing::get, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    /// Where responses are dumped, if anywhere
    pub dump_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(coordinator: Coordinator, config: &Config) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            dump_dir: config.output.dump_dir.as_ref().map(PathBuf::from),
        }
    }
}

/// Builds the router with every endpoint
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(handlers::questions))
        .route("/questions/:ids", get(handlers::questions_by_ids))
        .route("/questions/:ids/answers", get(handlers::answers_of_questions))
        .route("/answers/:ids", get(handlers::answers_by_ids))
        .route("/collectives", get(handlers::collectives))
        .fallback(handlers::no_method)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the API on an already bound listener until the task is dropped
pub async fn serve_on(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Listening on http://{}", addr);
    }
    axum::serve(listener, router(state)).await
}

/// Binds `host:port` from the configuration (with `port` overriding it)
/// and serves the API over HTTP
pub async fn serve(config: &Config, port: u16) -> anyhow::Result<()> {
    let coordinator = Coordinator::from_config(config)?;
    let state = AppState::new(coordinator, config);

    let addr = format!("{}:{}", config.server.host, port);
    let listener = TcpListener::bind(&addr).await?;
    serve_on(listener, state).await?;
    Ok(())
}
