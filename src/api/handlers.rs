use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use utoipa::OpenApi;

use super::{
    dto::ReadingDto,
    errors::AppError,
    params::RangeParams,
    AppState,
};
use crate::control::LightCommand;

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// List every device id that has at least one stored reading, ascending.
#[utoipa::path(
    get,
    path = "/sensors",
    responses(
        (status = 200, description = "Known device ids", body = Vec<i32>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn list_sensors(State(state): State<AppState>) -> Result<Json<Vec<i32>>, AppError> {
    Ok(Json(state.store.list_device_ids().await?))
}

/// Latest reading for a device. A device with no readings yields a
/// zero-valued reading rather than 404.
#[utoipa::path(
    get,
    path = "/sensors/{id}",
    params(
        ("id" = i32, Path, description = "Device id"),
    ),
    responses(
        (status = 200, description = "Latest reading, zero-valued when none exists", body = ReadingDto),
        (status = 400, description = "Device id is not an integer"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn get_latest_reading(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ReadingDto>, AppError> {
    let reading = state.store.latest_reading(id).await?;
    Ok(Json(reading.map(Into::into).unwrap_or_default()))
}

/// Switch a device's light on or off. The command is published and
/// forgotten; the response says nothing about whether the device obeyed.
#[utoipa::path(
    post,
    path = "/sensors/{id}",
    params(
        ("id" = i32, Path, description = "Device id"),
    ),
    request_body = LightCommand,
    responses(
        (status = 200, description = "Command published"),
        (status = 400, description = "Malformed command body"),
        (status = 503, description = "MQTT client not accepting publishes"),
    ),
    tag = "sensors"
)]
pub async fn send_command(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    body: Result<Json<LightCommand>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(command) = body?;
    state.commands.send(id, command)?;
    Ok(StatusCode::OK)
}

/// Readings for a device between `start` and `end` (both inclusive),
/// ordered by timestamp ascending.
#[utoipa::path(
    get,
    path = "/sensors/{id}/readings",
    params(
        ("id" = i32, Path, description = "Device id"),
        RangeParams,
    ),
    responses(
        (status = 200, description = "Readings in range", body = Vec<ReadingDto>),
        (status = 400, description = "Invalid device id or date"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn get_readings(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Vec<ReadingDto>>, AppError> {
    let (start, end) = params.bounds()?;
    let rows = state.store.range_readings(id, start, end).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
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
// OpenAPI document
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(list_sensors, get_latest_reading, send_command, get_readings, health),
    components(schemas(ReadingDto, LightCommand)),
    tags(
        (name = "sensors", description = "Device readings and light commands"),
        (name = "system",  description = "System endpoints"),
    ),
    info(
        title = "Sensor Telemetry API",
        version = "0.1.0",
        description = "Query stored environmental telemetry and send light commands to devices"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
