//! Upgrade-hold scheduler.
//!
//! Every tick (5s by default) this sweep does two things, in order:
//!
//! 1. Expires overdue offers: the entry reverts to ACTIVE at the front of
//!    its tier's queue and the unit's hold is released.
//! 2. Makes new offers, strictly oldest-entry-first per tier: for each
//!    ACTIVE entry with an eligible clean unit, it reserves the unit and
//!    flips the entry to OFFERED with a fresh expiry window.
//!
//! Both halves lock their rows with `SKIP LOCKED`, so a second scheduler
//! instance or a racing allocator never blocks or double-processes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use frontdesk_core::tier::ALL_TIERS;
use frontdesk_core::waitlist::{ReleaseReason, WaitlistStatus};
use frontdesk_db::repositories::{ReservationRepo, ResourceRepo, WaitlistRepo};
use frontdesk_db::DbPool;
use frontdesk_events::{CheckinEvent, EventBus};

use crate::config::ServerConfig;

/// Run the upgrade-hold scheduler loop until `cancel` is triggered.
pub async fn run(
    pool: DbPool,
    event_bus: Arc<EventBus>,
    config: Arc<ServerConfig>,
    cancel: CancellationToken,
) {
    tracing::info!(
        tick_secs = config.hold_tick_secs,
        offer_window_secs = config.offer_window_secs,
        "Upgrade-hold scheduler started"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(config.hold_tick_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Upgrade-hold scheduler stopping");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = expire_overdue_offers(&pool, &event_bus).await {
                    tracing::error!(error = %e, "Upgrade-hold sweep: offer expiry failed");
                }
                if let Err(e) = make_offers(&pool, &event_bus, &config).await {
                    tracing::error!(error = %e, "Upgrade-hold sweep: offer creation failed");
                }
            }
        }
    }
}

/// Revert every lapsed offer to ACTIVE and release its hold.
pub async fn expire_overdue_offers(pool: &DbPool, event_bus: &EventBus) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    let overdue = WaitlistRepo::lock_overdue_offers(&mut *tx, now).await?;

    let mut expired = Vec::new();
    for entry in overdue {
        if WaitlistRepo::revert_offer(&mut *tx, entry.id).await? {
            ReservationRepo::release_for_waitlist(&mut *tx, entry.id, ReleaseReason::Expired)
                .await?;
            expired.push(entry);
        }
    }
    tx.commit().await?;

    for entry in expired {
        tracing::info!(
            waitlist_id = entry.id,
            tier = %entry.desired_tier,
            "Upgrade offer lapsed, entry back to ACTIVE"
        );
        event_bus.publish(CheckinEvent::UpgradeOfferExpired {
            waitlist_id: entry.id,
            resource_id: entry.resource_id.unwrap_or_default(),
            rental_type: entry.desired_tier,
        });
        event_bus.publish(CheckinEvent::WaitlistUpdated {
            waitlist_id: entry.id,
            desired_tier: entry.desired_tier,
            status: WaitlistStatus::Active,
        });
    }
    Ok(())
}

/// Offer eligible units to waiting entries, oldest first per tier.
pub async fn make_offers(
    pool: &DbPool,
    event_bus: &EventBus,
    config: &ServerConfig,
) -> Result<(), sqlx::Error> {
    for tier in ALL_TIERS {
        loop {
            let mut tx = pool.begin().await?;
            let Some(entry) = WaitlistRepo::lock_oldest_active(&mut *tx, tier).await? else {
                break;
            };
            let Some(resource) = ResourceRepo::pick_candidate_for_hold(&mut *tx, tier).await?
            else {
                // No free unit for this tier; the entry stays ACTIVE.
                break;
            };

            let expires_at = Utc::now() + chrono::Duration::seconds(config.offer_window_secs);
            ReservationRepo::create_upgrade_hold(&mut *tx, resource.id, entry.id, expires_at)
                .await?;
            WaitlistRepo::mark_offered(&mut *tx, entry.id, resource.id, expires_at).await?;
            tx.commit().await?;

            tracing::info!(
                waitlist_id = entry.id,
                unit = resource.number,
                tier = %tier,
                "Upgrade hold offered"
            );
            event_bus.publish(CheckinEvent::UpgradeHoldAvailable {
                waitlist_id: entry.id,
                resource_id: resource.id,
                rental_type: tier,
                offer_expires_at: expires_at,
            });
            event_bus.publish(CheckinEvent::WaitlistUpdated {
                waitlist_id: entry.id,
                desired_tier: entry.desired_tier,
                status: WaitlistStatus::Offered,
            });
        }
    }
    Ok(())
}
