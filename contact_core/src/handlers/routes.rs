//! HTTP routes for the contact and newsletter forms

use crate::{
    error::{AppError, Result},
    models::ApiResponse,
    submission::{Delivery, HtmlFormFallback, SubmissionForm, SubmitError},
    validation::{ContactFields, NewsletterFields},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::info;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handle_health))
        .route("/metrics", get(handle_metrics))
        .route("/api/contact", post(handle_contact))
        .route("/api/newsletter", post(handle_newsletter))
}

async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(serde_json::json!({
        "status": "healthy",
        "app": state.app_name,
        "version": state.version,
        "timestamp": chrono::Utc::now().timestamp(),
    })))
}

async fn handle_metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(state.metrics.get_snapshot()))
}

async fn handle_contact(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    payload: std::result::Result<Json<ContactFields>, JsonRejection>,
) -> Result<Response> {
    let Json(form) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    info!(client = %addr.ip(), "POST /api/contact");
    submit_form(&state, addr, form).await
}

async fn handle_newsletter(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    payload: std::result::Result<Json<NewsletterFields>, JsonRejection>,
) -> Result<Response> {
    let Json(form) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    info!(client = %addr.ip(), "POST /api/newsletter");
    submit_form(&state, addr, form).await
}

/// Runs one submission. A primary delivery answers with JSON; a fallback
/// answers with the auto-posting HTML document. A client with a submission
/// still running gets 409.
async fn submit_form<F>(state: &AppState, addr: SocketAddr, mut form: F) -> Result<Response>
where
    F: SubmissionForm,
{
    let _claim = state
        .in_flight
        .claim(addr.ip())
        .ok_or_else(|| AppError::from(SubmitError::InFlight))?;

    let fallback = Arc::new(HtmlFormFallback::new());
    let orchestrator = state.orchestrator_for(addr.ip(), fallback.clone());

    match orchestrator.submit(&mut form).await {
        Ok(Delivery::Primary) => Ok(Json(ApiResponse::success(
            serde_json::json!({ "delivery": Delivery::Primary }),
        ))
        .into_response()),
        Ok(Delivery::Fallback) => fallback
            .take_document()
            .map(|document| Html(document).into_response())
            .ok_or(AppError::InternalServerError),
        Err(SubmitError::RateLimited(message)) => Err(AppError::RateLimited {
            message,
            retry_after_seconds: orchestrator
                .rate_limiter()
                .retry_after()
                .map(|wait| wait.as_secs().max(1)),
        }),
        Err(err) => Err(err.into()),
    }
}
