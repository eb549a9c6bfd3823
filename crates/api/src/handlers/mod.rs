//! HTTP handlers.
//!
//! Handlers stay thin: device gate, path/body extraction, one engine
//! call, and the `{ "data": ... }` envelope. All state transitions and
//! inventory logic live in [`crate::engine`].

pub mod availability;
pub mod session;
pub mod waitlist;

use frontdesk_core::error::CoreError;

use crate::config::DeviceKind;
use crate::error::{AppError, AppResult};
use crate::middleware::device::DeviceIdentity;

/// Kiosks may only act on their provisioned lane; registers are staff
/// devices and may drive any lane.
pub(crate) fn ensure_lane_access(device: &DeviceIdentity, lane: &str) -> AppResult<()> {
    if device.kind == DeviceKind::Kiosk && device.lane != lane {
        tracing::warn!(bound = %device.lane, requested = %lane, "Kiosk addressed a foreign lane");
        return Err(AppError::Core(CoreError::DeviceDisabled));
    }
    Ok(())
}
