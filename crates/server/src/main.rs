mod config;
mod http;
mod state;

use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::info;

use config::Settings;
use http::router::build_router;
use state::AppState;
use storage::Db;
use workflow::{
    BatchImporter, BulkOperator, OpenAiResponder, ReviewSource, ReviewTracker, StatusWorkflow,
    WordPressSource,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let settings = Settings::new().context("Failed to load configuration")?;

    let db = Db::new(&settings.database.url).await?;

    let auth = match (&settings.source.username, &settings.source.app_password) {
        (Some(user), Some(password)) => Some((user.clone(), password.clone())),
        _ => None,
    };
    let source: Arc<dyn ReviewSource> =
        Arc::new(WordPressSource::new(&settings.source.base_url, auth));

    let state = AppState {
        workflow: StatusWorkflow::new(db.clone(), source.clone()),
        bulk: BulkOperator::new(db.clone(), source.clone()),
        importer: BatchImporter::new(db.clone(), source.clone()),
        tracker: ReviewTracker::new(db.clone()),
        responder: Arc::new(OpenAiResponder::new(
            &settings.responder.api_base,
            &settings.responder.model,
            db.clone(),
        )),
        db,
        admin_token: settings.security.admin_token.clone(),
    };

    let app = build_router(state, &settings.server.cors_origins);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
