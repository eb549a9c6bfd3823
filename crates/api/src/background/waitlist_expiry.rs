//! Stale-demand backstop sweep.
//!
//! Waitlist demand should die with its visit, but checkouts and block
//! expirations happen outside the engine's transactions. Every tick (60s
//! by default) this sweep expires open entries whose linked block has
//! ended or whose visit has ended, releasing any hold they were carrying,
//! so phantom demand never shields clean units indefinitely.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use frontdesk_core::waitlist::{ReleaseReason, WaitlistStatus};
use frontdesk_db::repositories::{ReservationRepo, WaitlistRepo};
use frontdesk_db::DbPool;
use frontdesk_events::{CheckinEvent, EventBus};

use crate::engine::allocator;

/// Run the stale-demand sweep loop until `cancel` is triggered.
pub async fn run(
    pool: DbPool,
    event_bus: Arc<EventBus>,
    sweep_secs: u64,
    cancel: CancellationToken,
) {
    tracing::info!(sweep_secs, "Waitlist expiry sweep started");

    let mut interval = tokio::time::interval(Duration::from_secs(sweep_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Waitlist expiry sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep(&pool, &event_bus).await {
                    Ok(0) => tracing::debug!("Waitlist expiry sweep: nothing stale"),
                    Ok(expired) => tracing::info!(expired, "Waitlist expiry sweep: expired stale entries"),
                    Err(e) => tracing::error!(error = %e, "Waitlist expiry sweep failed"),
                }
            }
        }
    }
}

/// Expire every open entry whose underlying demand is gone. Returns the
/// number of entries expired.
pub async fn sweep(pool: &DbPool, event_bus: &EventBus) -> Result<usize, sqlx::Error> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    let stale = WaitlistRepo::lock_stale_open(&mut *tx, now).await?;

    let mut expired = Vec::new();
    for entry in stale {
        if WaitlistRepo::expire(&mut *tx, entry.id).await? {
            ReservationRepo::release_for_waitlist(&mut *tx, entry.id, ReleaseReason::Expired)
                .await?;
            expired.push(entry);
        }
    }
    tx.commit().await?;

    for entry in &expired {
        event_bus.publish(CheckinEvent::WaitlistUpdated {
            waitlist_id: entry.id,
            desired_tier: entry.desired_tier,
            status: WaitlistStatus::Expired,
        });
    }

    // Shielded units just became plain availability.
    if !expired.is_empty() {
        if let Ok(availability) = allocator::availability_snapshot(pool).await {
            event_bus.publish(CheckinEvent::InventoryUpdated { availability });
        }
    }

    Ok(expired.len())
}
