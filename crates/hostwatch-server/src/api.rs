use crate::logging::TraceId;
use crate::query::{self, DataResponse, EventsResponse, HealthReport, StatsResponse};
use crate::state::AppState;
use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hostwatch_alert::Rule;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

/// Error body.
#[derive(Serialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub err_code: i32,
    pub err_msg: String,
    /// Trace id of the request
    pub trace_id: String,
}

/// Response envelope shared by every endpoint.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    /// 0 on success
    pub err_code: i32,
    /// `success` on success
    pub err_msg: String,
    pub trace_id: String,
    pub data: Option<T>,
}

pub fn success_response<T>(status: StatusCode, trace_id: &str, data: T) -> Response
where
    T: Serialize,
{
    (
        status,
        Json(ApiResponse {
            err_code: 0,
            err_msg: "success".to_string(),
            trace_id: trace_id.to_string(),
            data: Some(data),
        }),
    )
        .into_response()
}

fn to_custom_error_code(code: &str) -> i32 {
    match code {
        "bad_request" => 1001,
        "not_found" => 1004,
        "invalid_config" => 1201,
        "internal_error" => 1500,
        _ => 1999,
    }
}

pub fn error_response(status: StatusCode, trace_id: &str, code: &str, msg: &str) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            err_code: to_custom_error_code(code),
            err_msg: msg.to_string(),
            trace_id: trace_id.to_string(),
            data: None,
        }),
    )
        .into_response()
}

/// Latest reading of every metric and the full history window, oldest first.
#[utoipa::path(
    get,
    path = "/api/data",
    tag = "Metrics",
    responses(
        (status = 200, description = "Latest values and history", body = DataResponse)
    )
)]
async fn data(Extension(trace_id): Extension<TraceId>, State(state): State<AppState>) -> impl IntoResponse {
    success_response(StatusCode::OK, &trace_id, query::data(&state))
}

/// Count, average and maximum per metric over the history window.
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "Metrics",
    responses(
        (status = 200, description = "Window statistics", body = StatsResponse)
    )
)]
async fn stats(Extension(trace_id): Extension<TraceId>, State(state): State<AppState>) -> impl IntoResponse {
    success_response(StatusCode::OK, &trace_id, query::stats(&state))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventsParams {
    /// Maximum number of events to return (default 50)
    #[param(required = false)]
    pub limit: Option<usize>,
}

/// Most recent alert events, newest first.
#[utoipa::path(
    get,
    path = "/api/events",
    tag = "Alerts",
    params(EventsParams),
    responses(
        (status = 200, description = "Recent alert events", body = EventsResponse)
    )
)]
async fn events(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<EventsParams>,
) -> impl IntoResponse {
    success_response(StatusCode::OK, &trace_id, query::events(&state, params.limit))
}

/// Sampler liveness, uptime and event buffer usage.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service health", body = HealthReport)
    )
)]
async fn health(Extension(trace_id): Extension<TraceId>, State(state): State<AppState>) -> impl IntoResponse {
    success_response(StatusCode::OK, &trace_id, query::health(&state))
}

/// Active alert rules in evaluation order.
#[utoipa::path(
    get,
    path = "/api/rules",
    tag = "Alerts",
    responses(
        (status = 200, description = "Active rules", body = Vec<Rule>)
    )
)]
async fn list_rules(Extension(trace_id): Extension<TraceId>, State(state): State<AppState>) -> impl IntoResponse {
    success_response(StatusCode::OK, &trace_id, query::rules(&state))
}

/// Re-reads the configuration file and rebuilds the rule set.
/// Streaks and cooldowns of all rules start over.
#[utoipa::path(
    post,
    path = "/api/rules/reload",
    tag = "Alerts",
    responses(
        (status = 200, description = "Rules reloaded", body = Vec<Rule>),
        (status = 400, description = "Configuration could not be loaded", body = ApiError)
    )
)]
async fn reload_rules(Extension(trace_id): Extension<TraceId>, State(state): State<AppState>) -> impl IntoResponse {
    match state.reload_rules() {
        Ok(count) => {
            tracing::info!(rule_count = count, "Rules reloaded via API");
            success_response(StatusCode::OK, &trace_id, query::rules(&state))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload rules");
            error_response(
                StatusCode::BAD_REQUEST,
                &trace_id,
                "invalid_config",
                &format!("{e:#}"),
            )
        }
    }
}

/// Effective configuration.
#[utoipa::path(
    get,
    path = "/api/config",
    tag = "System",
    responses(
        (status = 200, description = "Effective configuration")
    )
)]
async fn get_config(Extension(trace_id): Extension<TraceId>, State(state): State<AppState>) -> impl IntoResponse {
    success_response(StatusCode::OK, &trace_id, state.config())
}

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(data))
        .routes(routes!(stats))
        .routes(routes!(events))
        .routes(routes!(health))
        .routes(routes!(list_rules))
        .routes(routes!(reload_rules))
        .routes(routes!(get_config))
}
