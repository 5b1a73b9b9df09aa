use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use panel_optimizer::{CutRequest, CuttingPlan, OptimizeError, optimize};
use serde::Serialize;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Serialize)]
struct ErrorResponse {
    kind: &'static str,
    details: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, kind: &'static str, details: String) -> ApiError {
    (status, Json(ErrorResponse { kind, details }))
}

impl From<OptimizeError> for ErrorResponse {
    fn from(e: OptimizeError) -> Self {
        Self {
            kind: e.kind(),
            details: e.to_string(),
        }
    }
}

async fn optimize_handler(Json(req): Json<CutRequest>) -> Result<Json<CuttingPlan>, ApiError> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /optimize"
    );

    let plan = tokio::task::spawn_blocking(move || optimize(&req))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "optimizer task failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "optimizer task failed".to_string(),
            )
        })?
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(ErrorResponse::from(e))))?;

    if plan.is_partial() {
        tracing::warn!(
            unplaced = plan.unplaced.iter().map(|u| u.count).sum::<u32>(),
            "returning partial plan"
        );
    }
    Ok(Json(plan))
}

fn main() {
    // Sentry must be initialised before the async runtime starts.
    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("failed to open development.log: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = runtime.block_on(serve()) {
        eprintln!("server error: {e}");
        std::process::exit(1);
    }
}

async fn serve() -> std::io::Result<()> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/optimize", post(optimize_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!("Listening on {addr}");
    tracing::info!(%addr, "server started");
    axum::serve(listener, app).await
}
