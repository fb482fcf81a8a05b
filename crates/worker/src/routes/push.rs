// SPDX-License-Identifier: MIT

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cw_core::{ErrorCode, PushDevice, PushEnvironment, PushPlatform};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

/// `platform`/`environment` are parsed against the closed enums directly,
/// so an unknown value is a deserialize failure the body extractor
/// already turns into `400 INVALID_JSON` — these helpers exist only to
/// produce the more specific `INVALID_PUSH_PLATFORM`/
/// `INVALID_PUSH_ENVIRONMENT` codes.
fn parse_platform(raw: &str) -> Result<PushPlatform, ApiError> {
    match raw {
        "ios" => Ok(PushPlatform::Ios),
        "android" => Ok(PushPlatform::Android),
        other => Err(ApiError::new(ErrorCode::InvalidPushPlatform, format!("unknown push platform: {other}"))),
    }
}

fn parse_environment(raw: &str) -> Result<PushEnvironment, ApiError> {
    match raw {
        "sandbox" => Ok(PushEnvironment::Sandbox),
        "production" => Ok(PushEnvironment::Production),
        other => Err(ApiError::new(ErrorCode::InvalidPushEnvironment, format!("unknown push environment: {other}"))),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceBody {
    token: String,
    platform: String,
    bundle_id: String,
    environment: String,
    #[serde(default)]
    device_name: Option<String>,
}

pub async fn register_device(State(state): State<AppState>, Json(body): Json<RegisterDeviceBody>) -> Result<impl IntoResponse, ApiError> {
    if body.token.trim().is_empty() {
        return Err(ApiError::new(ErrorCode::InvalidPushToken, "token must not be empty"));
    }
    let platform = parse_platform(&body.platform)?;
    let environment = parse_environment(&body.environment)?;

    let existing = state.engine.store.list_push_devices().await.map_err(cw_engine::EngineError::from)?;
    let device = match existing.into_iter().find(|d| d.token == body.token) {
        Some(mut device) => {
            device.touch(platform, body.bundle_id, environment, body.device_name);
            device
        }
        None => PushDevice::new(body.token, platform, body.bundle_id, environment, body.device_name),
    };

    state.engine.store.upsert_push_device(device.clone()).await.map_err(cw_engine::EngineError::from)?;
    Ok((StatusCode::OK, Json(device)))
}

#[derive(Deserialize)]
pub struct UnregisterDeviceBody {
    token: String,
}

pub async fn unregister_device(State(state): State<AppState>, Json(body): Json<UnregisterDeviceBody>) -> Result<StatusCode, ApiError> {
    state.engine.store.remove_push_device(body.token).await.map_err(cw_engine::EngineError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
