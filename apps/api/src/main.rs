use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use assessment_cell::{AssessmentRepository, ReconcileOutcome};
use shared_config::AppConfig;
use shared_utils::clock::SystemClock;
use shared_utils::poll::Poller;

/// Keep the patient's cached pre-assessment in step with their profile.
fn spawn_reconcile(config: &AppConfig, email: &str) -> JoinHandle<()> {
    let repository = Arc::new(AssessmentRepository::new(config, email, Arc::new(SystemClock)));
    let poller = Poller::new(Duration::from_secs(config.poll_interval_secs.max(1)));

    info!(
        "Reconciling pre-assessment for {} every {}s",
        email,
        poller.interval().as_secs()
    );

    poller.spawn(move || {
        let repository = repository.clone();
        async move {
            match repository.reconcile().await {
                Ok(ReconcileOutcome::InSync) | Ok(ReconcileOutcome::Empty) => {}
                Ok(outcome) => info!("Pre-assessment reconciled: {:?}", outcome),
                Err(e) => warn!("Pre-assessment reconcile failed: {}", e),
            }
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TheraPH portal API server");

    let config = AppConfig::from_env();

    let reconcile = match (&config.patient_email, config.is_configured()) {
        (Some(email), true) => Some(spawn_reconcile(&config, email)),
        (Some(_), false) => {
            warn!("PORTAL_PATIENT_EMAIL set without API_BASE_URL, background reconcile disabled");
            None
        }
        (None, _) => None,
    };

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    let served = axum::serve(listener, app).await;

    if let Some(handle) = reconcile {
        handle.abort();
    }

    served.context("server error")
}
