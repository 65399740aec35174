use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    routing::get,
    serve, Router,
};
use crosstab_utils::{init_logging, AppConfig, ReportGenerator};
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing::{info, warn};

mod handlers;
mod metrics;
mod middleware;
mod routes;

use handlers::{health_check, metrics_handler, SUMMARY_HEADER};
use metrics::Metrics;
use middleware::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration ({}), using defaults", e);
        AppConfig::default()
    });

    // Initialize logging
    init_logging(&config.logging)?;
    info!("Starting Crosstab API Gateway ({})", config.reports.environment);

    config.confirm(confirm_on_terminal)?;

    let app = create_app(&config)?;

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("API Gateway listening on {}", listener.local_addr()?);

    serve(listener, app).await?;

    Ok(())
}

/// Prints the report settings and asks for a yes on stdin.
fn confirm_on_terminal(settings: &[(&'static str, String)]) -> bool {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        warn!("No terminal to confirm the report settings; set reports.auto_approve to start unattended");
        return false;
    }

    println!("Report settings:");
    for (name, value) in settings {
        println!("  {:<20} {}", name, value);
    }
    print!("Continue with these settings? [y/N] ");
    let _ = io::stdout().flush();

    let mut answer = String::new();
    if stdin.lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes" | "s" | "si" | "sí")
}

fn create_app(config: &AppConfig) -> Result<Router> {
    let state = AppState {
        config: Arc::new(config.clone()),
        generator: Arc::new(ReportGenerator::new(config)),
        metrics: Metrics::new()?,
    };

    let app = Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))

        // Upload form and report download
        .merge(routes::create_report_routes())

        // Middleware stack
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST])
                        .allow_headers([header::CONTENT_TYPE])
                        .expose_headers([
                            header::CONTENT_DISPOSITION,
                            HeaderName::from_static(SUMMARY_HEADER),
                            HeaderName::from_static(REQUEST_ID_HEADER),
                        ])
                )
                .layer(DefaultBodyLimit::max(config.server.max_request_size))
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(axum::middleware::from_fn(error_handling_middleware))
        )

        // Application state
        .with_state(state);

    Ok(app)
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub generator: Arc<ReportGenerator>,
    pub metrics: Metrics,
}
