//! Classification of reservation release attempts

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use types::ids::OrderId;

/// Outcome class of a `can_free` probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FreeStatus {
    /// The release is valid as probed
    Freeable,
    /// Explicit positive amount, but no reservation under that order id
    NonexistentReservation,
    /// No reservation and no amount given
    NonexistentReservationAndAmount,
    /// No reservation, and the given amount is not even positive
    NonexistentReservationAndNegativeAmount,
    /// Amount exceeds the recorded reservation
    AmountExceedsReservation,
    /// Negative amount against an existing reservation
    NegativeAmount,
}

/// Verdict of [`Balance::can_free`](crate::Balance::can_free)
///
/// Carries everything needed to render a diagnostic: the probed order id,
/// the (rounded) requested amount and the recorded reservation, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeInfo {
    pub order_id: OrderId,
    pub amount: Option<Decimal>,
    pub reservation: Option<Decimal>,
    pub status: FreeStatus,
}

impl FreeInfo {
    pub fn is_freeable(&self) -> bool {
        self.status == FreeStatus::Freeable
    }
}

impl fmt::Display for FreeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.amount.unwrap_or_default();
        match self.status {
            FreeStatus::Freeable => {
                write!(f, "Order #{} is freeable for {}", self.order_id, amount)
            }
            FreeStatus::NegativeAmount => write!(
                f,
                "Attempt freeing negative amount of {} for order #{}",
                amount, self.order_id
            ),
            FreeStatus::AmountExceedsReservation => write!(
                f,
                "Attempt freeing amount of {} exceeding reservation of {} for order #{}",
                amount,
                self.reservation.unwrap_or_default(),
                self.order_id
            ),
            FreeStatus::NonexistentReservation => write!(
                f,
                "Attempt freeing {} for nonexistent order #{}",
                amount, self.order_id
            ),
            FreeStatus::NonexistentReservationAndAmount => write!(
                f,
                "Nonexistent reservation for order #{} and empty amount",
                self.order_id
            ),
            FreeStatus::NonexistentReservationAndNegativeAmount => write!(
                f,
                "Attempt freeing negative amount of {} for nonexistent reservation #{}",
                amount, self.order_id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display_freeable() {
        let info = FreeInfo {
            order_id: OrderId::new(7),
            amount: Some(dec!(12.5)),
            reservation: Some(dec!(20)),
            status: FreeStatus::Freeable,
        };
        assert_eq!(info.to_string(), "Order #7 is freeable for 12.5");
        assert!(info.is_freeable());
    }

    #[test]
    fn test_display_exceeds() {
        let info = FreeInfo {
            order_id: OrderId::new(3),
            amount: Some(dec!(30)),
            reservation: Some(dec!(20)),
            status: FreeStatus::AmountExceedsReservation,
        };
        assert_eq!(
            info.to_string(),
            "Attempt freeing amount of 30 exceeding reservation of 20 for order #3"
        );
        assert!(!info.is_freeable());
    }
}
