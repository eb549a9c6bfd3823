//! Pricing seam.
//!
//! Pricing is an external collaborator: the engine consumes it as a pure
//! function of rental type, customer age, check-in time, and membership.
//! [`FlatRatePricing`] is the table-driven default used until a real rate
//! card service is wired in.

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::tier::RentalType;
use crate::types::Timestamp;

/// Membership level as resolved from the customer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Membership {
    None,
    Member,
}

/// A computed price for one check-in block. All amounts are cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub rental_fee_cents: i64,
    pub membership_fee_cents: i64,
    pub total_cents: i64,
}

/// Quote computation seam, injected into the API state.
pub trait PriceQuoter: Send + Sync {
    fn quote(
        &self,
        rental_type: RentalType,
        customer_age: i32,
        checkin_time: Timestamp,
        membership: Membership,
    ) -> PriceQuote;
}

/// Flat rate card: base fee per tier, a late-night surcharge, a day-use
/// membership fee for non-members, and a youth discount.
pub struct FlatRatePricing;

impl FlatRatePricing {
    fn base_fee(tier: RentalType) -> i64 {
        match tier {
            RentalType::Locker => 3200,
            RentalType::GymLocker => 2400,
            RentalType::Standard => 5600,
            RentalType::Double => 7800,
            RentalType::Special => 9400,
        }
    }
}

impl PriceQuoter for FlatRatePricing {
    fn quote(
        &self,
        rental_type: RentalType,
        customer_age: i32,
        checkin_time: Timestamp,
        membership: Membership,
    ) -> PriceQuote {
        let mut rental_fee_cents = Self::base_fee(rental_type);

        // Late-night surcharge between midnight and 05:00.
        if checkin_time.hour() < 5 {
            rental_fee_cents += 1000;
        }

        // Youth discount (under 25).
        if customer_age < 25 {
            rental_fee_cents -= 400;
        }

        let membership_fee_cents = match membership {
            Membership::Member => 0,
            Membership::None => 1500,
        };

        PriceQuote {
            rental_fee_cents,
            membership_fee_cents,
            total_cents: rental_fee_cents + membership_fee_cents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_hour(hour: u32) -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2025, 6, 14, hour, 30, 0).unwrap()
    }

    #[test]
    fn member_pays_no_membership_fee() {
        let quote = FlatRatePricing.quote(RentalType::Standard, 40, at_hour(14), Membership::Member);
        assert_eq!(quote.membership_fee_cents, 0);
        assert_eq!(quote.total_cents, quote.rental_fee_cents);
    }

    #[test]
    fn late_night_surcharge_applies_before_five() {
        let day = FlatRatePricing.quote(RentalType::Locker, 40, at_hour(14), Membership::Member);
        let night = FlatRatePricing.quote(RentalType::Locker, 40, at_hour(2), Membership::Member);
        assert_eq!(night.rental_fee_cents - day.rental_fee_cents, 1000);
    }

    #[test]
    fn youth_discount_applies_under_25() {
        let adult = FlatRatePricing.quote(RentalType::Double, 30, at_hour(14), Membership::None);
        let youth = FlatRatePricing.quote(RentalType::Double, 21, at_hour(14), Membership::None);
        assert_eq!(adult.rental_fee_cents - youth.rental_fee_cents, 400);
    }

    #[test]
    fn total_is_rental_plus_membership() {
        let quote = FlatRatePricing.quote(RentalType::Special, 50, at_hour(10), Membership::None);
        assert_eq!(
            quote.total_cents,
            quote.rental_fee_cents + quote.membership_fee_cents
        );
    }
}
