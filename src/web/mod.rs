//! The greeting form and the actions behind its buttons.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tokio::signal;
use tower_sessions::{Expiry, SessionManagerLayer};
use tracing::{error, info};

use crate::compositor::GreetingFonts;
use crate::config::AppConfig;
use crate::constants::{MAX_UPLOAD_BYTES, SESSION_IDLE_MINUTES, SESSION_SWEEP_SECS};
use crate::gemini::TextGenerator;

mod actions;
mod csrf;
mod flash;
mod output;
mod prelude;
mod session;
mod store;
mod views;

use actions::{confirm_handler, generate_handler, image_handler};
use output::{download_handler, output_image_handler};
use store::SweepingStore;
use views::{home_handler, roles_handler, styles_handler};

#[derive(Clone)]
pub(crate) struct AppState {
    generator: Arc<dyn TextGenerator>,
    fonts: Arc<GreetingFonts>,
    output_path: Arc<PathBuf>,
}

impl AppState {
    fn new(generator: Arc<dyn TextGenerator>, fonts: GreetingFonts, output_path: PathBuf) -> Self {
        Self {
            generator,
            fonts: Arc::new(fonts),
            output_path: Arc::new(output_path),
        }
    }
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::get(home_handler))
        .route("/static/styles.css", axum::routing::get(styles_handler))
        .route("/roles", axum::routing::get(roles_handler))
        .route("/generate", axum::routing::post(generate_handler))
        .route("/confirm", axum::routing::post(confirm_handler))
        .route("/image", axum::routing::post(image_handler))
        .route("/image/output.png", axum::routing::get(output_image_handler))
        .route("/download", axum::routing::get(download_handler))
}

fn build_app(state: AppState, store: SweepingStore, upload_limit: usize) -> Router {
    let session_layer = SessionManagerLayer::new(store)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            SESSION_IDLE_MINUTES,
        )));

    create_router()
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(session_layer)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        return;
    }
    info!("Shutting down");
}

/// Binds the listener and serves the form until ctrl-c.
pub async fn setup_server(
    config: &AppConfig,
    fonts: GreetingFonts,
    generator: Arc<dyn TextGenerator>,
) -> Result<(), anyhow::Error> {
    let state = AppState::new(generator, fonts, config.output_path.clone());
    let store = SweepingStore::default();
    tokio::spawn(
        store
            .clone()
            .sweep_every(Duration::from_secs(SESSION_SWEEP_SECS)),
    );
    let app = build_app(state, store, MAX_UPLOAD_BYTES);

    let addr = format!("{}:{}", config.listen_address, config.port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}
