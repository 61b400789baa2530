use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde_json::Value;
use tracing::debug;
use utoipa::OpenApi;

use super::{
    dto::{
        AnalyticsDto, ControlRequest, ControlResponse, CurrentReadingDto, Figure, NoDataDto,
        RangeParams, ReadingDto,
    },
    errors::AppError,
    AppState,
};
use crate::{
    analytics,
    db::{models::TimeRange, readings},
};

/// Query-string errors answer with the same `{error}` body as everything else.
fn time_range(params: Result<Query<RangeParams>, QueryRejection>) -> Result<TimeRange, AppError> {
    params
        .map(|Query(p)| p.into())
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// Latest reading: the cached value if any, otherwise the newest stored row.
#[utoipa::path(
    get,
    path = "/api/data",
    responses(
        (status = 200, description = "Latest reading, or a no-data message", body = CurrentReadingDto),
        (status = 500, description = "Internal server error"),
    ),
    tag = "energy"
)]
pub async fn get_current_reading(
    State(state): State<AppState>,
) -> Result<Json<CurrentReadingDto>, AppError> {
    if let Some(reading) = state.cache.get().await {
        return Ok(Json(CurrentReadingDto::Reading(reading.into())));
    }

    debug!("Cache empty; falling back to store");
    match readings::latest(&state.pool).await? {
        Some(reading) => {
            if state.cache.fill_if_empty(reading.clone()).await {
                debug!(timestamp = reading.timestamp, "Cache primed from store");
            }
            Ok(Json(CurrentReadingDto::Reading(reading.into())))
        }
        None => Ok(Json(CurrentReadingDto::no_data())),
    }
}

/// Stored readings, newest first. Pass both `startDate` and `endDate` to filter.
#[utoipa::path(
    get,
    path = "/api/history",
    params(RangeParams),
    responses(
        (status = 200, description = "Readings ordered by timestamp descending", body = Vec<ReadingDto>),
        (status = 400, description = "Non-integer startDate/endDate; empty values count as absent"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "energy"
)]
pub async fn get_history(
    State(state): State<AppState>,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<Vec<ReadingDto>>, AppError> {
    let rows = readings::range(&state.pool, time_range(params)?).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Energy total, cost and average power over the same window as `/api/history`.
#[utoipa::path(
    get,
    path = "/api/analytics",
    params(RangeParams),
    responses(
        (status = 200, description = "Aggregates over the selected readings", body = AnalyticsDto),
        (status = 400, description = "Non-integer startDate/endDate; empty values count as absent"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "energy"
)]
pub async fn get_analytics(
    State(state): State<AppState>,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<AnalyticsDto>, AppError> {
    let rows = readings::range(&state.pool, time_range(params)?).await?;
    let summary = analytics::summarize(&rows, state.energy_cost_rate);
    Ok(Json(summary.into()))
}

// ---------------------------------------------------------------------------
// Control
// ---------------------------------------------------------------------------

/// Switch the meter's relay. The response echoes the request; it does not
/// confirm that the device changed state.
#[utoipa::path(
    post,
    path = "/api/control",
    request_body = ControlRequest,
    responses(
        (status = 200, description = "Command handed to the MQTT client", body = ControlResponse),
        (status = 400, description = "`relay` missing or not a boolean"),
        (status = 500, description = "MQTT client unavailable"),
    ),
    tag = "control"
)]
pub async fn set_relay(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ControlResponse>, AppError> {
    let relay = payload
        .ok()
        .and_then(|Json(body)| body.get("relay").and_then(Value::as_bool))
        .ok_or_else(|| AppError::Validation("Invalid relay state".to_owned()))?;

    state.control.publish(relay).await.map_err(AppError::Bus)?;

    Ok(Json(ControlResponse {
        success: true,
        relay,
    }))
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(get_current_reading, get_history, get_analytics, set_relay, health),
    components(schemas(
        ReadingDto,
        NoDataDto,
        CurrentReadingDto,
        ControlRequest,
        ControlResponse,
        AnalyticsDto,
        Figure
    )),
    tags(
        (name = "energy",  description = "Meter readings and analytics"),
        (name = "control", description = "Relay control"),
        (name = "system",  description = "System endpoints"),
    ),
    info(
        title = "Smart Energy API",
        version = "0.1.0",
        description = "REST API for smart energy meter telemetry and relay control"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
