//! Spendcast Web Server
//!
//! Axum-based REST API for the Spendcast expense prediction engine.
//!
//! Routes (all JSON):
//! - `POST /api/users/:user_id/predictions/train`
//! - `POST /api/users/:user_id/predictions/expenses`
//! - `GET  /api/users/:user_id/predictions/insights`
//! - `GET  /api/users/:user_id/predictions/model`
//! - `GET  /api/users`
//! - `GET  /api/health`
//!
//! Errors that are not the caller's fault are logged in full and returned
//! as a generic 500.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info};

use spendcast_core::{Database, ForecastConfig, Forecaster};

mod handlers;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub forecaster: Forecaster,
}

/// Create the application router
pub fn create_router(db: Database, forecaster: Forecaster, config: ServerConfig) -> Router {
    let cors = build_cors(&config);

    let state = Arc::new(AppState { db, forecaster });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/users", get(handlers::list_users))
        .route(
            "/users/:user_id/predictions/train",
            post(handlers::train_model),
        )
        .route(
            "/users/:user_id/predictions/expenses",
            post(handlers::predict_expenses),
        )
        .route(
            "/users/:user_id/predictions/insights",
            get(handlers::list_insights),
        )
        .route(
            "/users/:user_id/predictions/model",
            get(handlers::model_status),
        );

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        ))
}

fn build_cors(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        cors
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Start the server
pub async fn serve(
    db: Database,
    forecast_config: ForecastConfig,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    serve_with_config(db, forecast_config, host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    forecast_config: ForecastConfig,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    let forecaster = Forecaster::new(db.clone(), forecast_config)?;
    info!(
        backend = forecaster.store().backend_name(),
        window_days = forecaster.config().training.window_days,
        "Forecaster ready"
    );

    let app = create_router(db, forecaster, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
