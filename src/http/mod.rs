//! HTTP surface: JSON API, downloads and the bundled front-end

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::Request;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Level};

use crate::app::{AppContainer, InfoInteractor, SearchInteractor, TrimInteractor};

pub mod error;
mod route;

pub use error::ApiError;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Clone)]
pub struct AppState {
    pub trim: Arc<TrimInteractor>,
    pub info: Arc<InfoInteractor>,
    pub search: Arc<SearchInteractor>,
    pub downloads_dir: PathBuf,
    pub dist_dir: PathBuf,
    pub youtube_api_configured: bool,
}

impl AppState {
    pub fn new(container: &dyn AppContainer, dist_dir: PathBuf, youtube_api_configured: bool) -> Self {
        Self {
            trim: container.trim_interactor(),
            info: container.info_interactor(),
            search: container.search_interactor(),
            downloads_dir: container.settings().downloads_dir.clone(),
            dist_dir,
            youtube_api_configured,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let downloads = ServeDir::new(&state.downloads_dir);
    let dist_dir = state.dist_dir.clone();

    let app = Router::new()
        .merge(route::video::route())
        .merge(route::download::route())
        .merge(route::search::route())
        .merge(route::player::route())
        .route("/health", get(route::health))
        .nest_service("/downloads", downloads)
        .with_state(state);

    with_frontend(app, &dist_dir)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    info_span!(
                        "http_request",
                        uri = ?request.uri(),
                        method = ?request.method(),
                    )
                })
                .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::INFO))
                .on_failure(tower_http::trace::DefaultOnFailure::new().level(Level::INFO)),
        )
}

/// SPA fallback: static files from `dist_dir`, `index.html` for unknown paths
fn with_frontend(app: Router, dist_dir: &Path) -> Router {
    let index = dist_dir.join("index.html");
    if index.is_file() {
        app.fallback_service(ServeDir::new(dist_dir).fallback(ServeFile::new(index)))
    } else {
        info!("No front-end at {}, serving the API only", dist_dir.display());
        app.fallback(route::frontend_missing)
    }
}

pub async fn serve<F>(listener: TcpListener, state: AppState, signal: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("InkCut server listening on http://{}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(signal)
        .await
}
