//! Device identity extractor.
//!
//! The authentication gate the engine sits behind: every command must
//! arrive from a provisioned kiosk or register. The extractor resolves
//! `X-Device-Token` against the configured registry and rejects unknown
//! or disabled tokens with `DEVICE_DISABLED` before any engine code runs.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use frontdesk_core::error::CoreError;

use crate::config::DeviceKind;
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the provisioned device token.
pub const DEVICE_TOKEN_HEADER: &str = "x-device-token";

/// The resolved identity of the requesting device.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub kind: DeviceKind,
    /// The lane this device is bound to.
    pub lane: String,
}

impl FromRequestParts<AppState> for DeviceIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(DEVICE_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Core(CoreError::DeviceDisabled))?;

        let entry = state
            .config
            .devices
            .get(token)
            .ok_or(AppError::Core(CoreError::DeviceDisabled))?;

        if entry.disabled {
            tracing::warn!(lane = %entry.lane, "Rejected disabled device token");
            return Err(AppError::Core(CoreError::DeviceDisabled));
        }

        Ok(DeviceIdentity {
            kind: entry.kind,
            lane: entry.lane.clone(),
        })
    }
}
