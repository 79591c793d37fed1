//! Rejection taxonomy
//!
//! A rejected placement is a pure no-op: no book or ledger state changes.
//! These are recoverable domain conditions, returned as `Err` values;
//! broken internal invariants are panics, not variants here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of placement rejection causes
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    #[error("Agent has no account on this book")]
    NonexistentAccount,

    #[error("No such book")]
    NonexistentBook,

    #[error("Insufficient free base balance")]
    InsufficientBase,

    #[error("Insufficient free quote balance")]
    InsufficientQuote,

    #[error("Market order against an empty book side")]
    EmptyBook,

    #[error("Requested loan exceeds the per-order cap")]
    ExceedingLoan,

    #[error("Leverage is negative or above the maximum")]
    InvalidLeverage,

    #[error("Volume must be positive")]
    InvalidVolume,

    #[error("Price must be positive and on the price grid")]
    InvalidPrice,

    #[error("Order size below the minimum")]
    MinimumOrderSize,

    #[error("Time-in-force cannot be satisfied")]
    TimeInForceUnsatisfiable,

    #[error("Post-only order would cross the book")]
    PostOnlyWouldCross,

    #[error("Agent has too many open orders on this book")]
    ExceedingMaxOrders,
}
