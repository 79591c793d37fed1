//! Single-asset balance with per-order reservations
//!
//! Amounts are rounded to the balance's `rounding_decimals` before every
//! comparison and every arithmetic step, so two balances that went through
//! the same operation sequence are bit-identical regardless of the scale
//! of intermediate values.

use crate::free_info::{FreeInfo, FreeStatus};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};
use types::ids::{BookId, OrderId};
use types::numeric::round;

/// Recoverable ledger conditions
///
/// Everything here leaves the balance untouched. Invariant breaks are not
/// represented: those panic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Initial balance must be non-negative, was {0}")]
    NegativeTotal(Decimal),

    #[error("Reservation amount for order #{order_id} cannot be negative: {amount}")]
    NegativeReservation { order_id: OrderId, amount: Decimal },

    #[error("Cannot reserve {amount} for order #{order_id} with only {free} free")]
    CannotReserve {
        order_id: OrderId,
        amount: Decimal,
        free: Decimal,
    },

    #[error("{0}")]
    Free(FreeInfo),
}

/// Declarative balance setup, as read from a simulation config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceConfig {
    pub total: Decimal,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Lossless checkpoint image of a [`Balance`]
///
/// Decimals serialize as strings, so a snapshot round-trips bit-exact.
/// Reservation keys are stringified order ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub initial: Decimal,
    pub free: Decimal,
    pub reserved: Decimal,
    pub total: Decimal,
    pub symbol: Option<String>,
    pub rounding_decimals: u32,
    pub reservations: BTreeMap<String, Decimal>,
}

/// One asset of one agent on one book
///
/// `total == free + reserved` and `sum(reservations) == reserved` hold
/// after every operation; both are re-checked on every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Balance {
    initial: Decimal,
    free: Decimal,
    reserved: Decimal,
    total: Decimal,
    reservations: BTreeMap<OrderId, Decimal>,
    symbol: Option<String>,
    rounding_decimals: u32,
}

impl Balance {
    pub fn new(
        total: Decimal,
        symbol: Option<String>,
        rounding_decimals: u32,
    ) -> Result<Self, LedgerError> {
        let total = round(total, rounding_decimals);
        if total < Decimal::ZERO {
            return Err(LedgerError::NegativeTotal(total));
        }
        Ok(Self {
            initial: total,
            free: total,
            reserved: Decimal::ZERO,
            total,
            reservations: BTreeMap::new(),
            symbol,
            rounding_decimals,
        })
    }

    pub fn from_config(config: &BalanceConfig, rounding_decimals: u32) -> Result<Self, LedgerError> {
        Self::new(config.total, config.symbol.clone(), rounding_decimals)
    }

    // -- accessors ---------------------------------------------------------

    pub fn initial(&self) -> Decimal {
        self.initial
    }

    pub fn free(&self) -> Decimal {
        self.free
    }

    pub fn reserved(&self) -> Decimal {
        self.reserved
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn rounding_decimals(&self) -> u32 {
        self.rounding_decimals
    }

    pub fn reservation(&self, id: OrderId) -> Option<Decimal> {
        self.reservations.get(&id).copied()
    }

    pub fn reservations(&self) -> &BTreeMap<OrderId, Decimal> {
        &self.reservations
    }

    // -- probes ------------------------------------------------------------

    pub fn can_reserve(&self, amount: Decimal) -> bool {
        let amount = self.round_amount(amount);
        amount >= Decimal::ZERO && amount <= self.free
    }

    /// Classify a release attempt without mutating anything.
    pub fn can_free(&self, id: OrderId, amount: Option<Decimal>) -> FreeInfo {
        let amount = self.round_opt(amount);
        let Some(&reservation) = self.reservations.get(&id) else {
            return FreeInfo {
                order_id: id,
                amount,
                reservation: None,
                status: match amount {
                    Some(a) if a > Decimal::ZERO => FreeStatus::NonexistentReservation,
                    Some(_) => FreeStatus::NonexistentReservationAndNegativeAmount,
                    None => FreeStatus::NonexistentReservationAndAmount,
                },
            };
        };
        let status = match amount {
            Some(a) if a > reservation => FreeStatus::AmountExceedsReservation,
            Some(a) if a < Decimal::ZERO => FreeStatus::NegativeAmount,
            _ => FreeStatus::Freeable,
        };
        FreeInfo { order_id: id, amount, reservation: Some(reservation), status }
    }

    // -- mutation entry points ---------------------------------------------

    /// Add to both `free` and `total`.
    pub fn deposit(&mut self, amount: Decimal) {
        let amount = self.round_amount(amount);
        self.free += amount;
        self.total += amount;
        trace!(%amount, balance = %self, "deposit");
        self.check_consistency("deposit");
    }

    /// Move `amount` from `free` into a reservation keyed by `id`.
    ///
    /// Zero (after rounding) is a no-op. Returns the rounded amount
    /// actually reserved.
    ///
    /// # Panics
    /// Panics if a reservation for `id` already exists, or if the ledger
    /// invariants fail to hold afterwards.
    pub fn make_reservation(
        &mut self,
        id: OrderId,
        amount: Decimal,
        book_id: BookId,
    ) -> Result<Decimal, LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeReservation { order_id: id, amount });
        }
        let amount = self.round_amount(amount);
        if amount.is_zero() {
            return Ok(Decimal::ZERO);
        }
        if !self.can_reserve(amount) {
            return Err(LedgerError::CannotReserve { order_id: id, amount, free: self.free });
        }
        if self.reservations.contains_key(&id) {
            panic!(
                "make_reservation: BOOK {book_id} | duplicate reservation for order #{id} | {self}"
            );
        }

        self.free -= amount;
        self.reserved += amount;
        self.reservations.insert(id, amount);

        trace!(book = %book_id, order = %id, %amount, balance = %self, "reserve");
        self.check_consistency("make_reservation");
        self.check_reservation_sum("make_reservation", book_id);
        Ok(amount)
    }

    /// Release a reservation (or part of it) back into `free`.
    ///
    /// With `amount = None` the entire reservation is released; if it is
    /// the only one, the whole `reserved` bucket is released so rounding
    /// residue cannot survive the last reservation. Returns the amount
    /// freed.
    ///
    /// # Panics
    /// Panics if the release drives a reservation negative or leaves
    /// `reserved` positive with no reservations behind it.
    pub fn free_reservation(
        &mut self,
        id: OrderId,
        book_id: BookId,
        amount: Option<Decimal>,
    ) -> Result<Decimal, LedgerError> {
        let amount = self.round_opt(amount);

        let info = self.can_free(id, amount);
        if !info.is_freeable() {
            debug!(book = %book_id, order = %id, %info, "free refused");
            return Err(LedgerError::Free(info));
        }

        let freed = match amount {
            None => {
                // Last reservation takes the whole reserved bucket with it.
                let freed = if self.reservations.len() == 1 {
                    self.reserved
                } else {
                    self.reservations[&id]
                };
                self.reservations.remove(&id);
                freed
            }
            Some(amount) => {
                let reservation = self
                    .reservations
                    .get_mut(&id)
                    .unwrap_or_else(|| unreachable!("can_free verified presence"));
                *reservation -= amount;
                let remaining = *reservation;
                if remaining < Decimal::ZERO {
                    panic!(
                        "free_reservation: BOOK {book_id} | negative reservation {remaining} \
                         for order #{id} by amount {amount} | {self}"
                    );
                }
                if remaining.is_zero() {
                    self.reservations.remove(&id);
                }
                amount
            }
        };

        self.free += freed;
        self.reserved -= freed;

        if self.reserved > Decimal::ZERO && self.reservations.is_empty() {
            panic!(
                "free_reservation: BOOK {book_id} | no reservations left for order #{id} \
                 but reserved is still {} | {self}",
                self.reserved
            );
        }

        trace!(book = %book_id, order = %id, %freed, balance = %self, "free");
        self.check_consistency("free_reservation");
        Ok(freed)
    }

    /// [`Self::free_reservation`] that treats a refused release as freeing
    /// nothing. Invariant panics still propagate.
    pub fn try_free_reservation(
        &mut self,
        id: OrderId,
        book_id: BookId,
        amount: Option<Decimal>,
    ) -> Decimal {
        match self.free_reservation(id, book_id, amount) {
            Ok(freed) => freed,
            Err(LedgerError::Free(_)) => Decimal::ZERO,
            Err(other) => {
                unreachable!("free_reservation returned unexpected error: {other}")
            }
        }
    }

    /// Destroy (part of) a reservation: the funds leave the balance
    /// entirely instead of returning to `free`. The settlement-side exit.
    ///
    /// A missing reservation is a no-op. Returns the amount voided.
    pub fn void_reservation(
        &mut self,
        id: OrderId,
        book_id: BookId,
        amount: Option<Decimal>,
    ) -> Result<Decimal, LedgerError> {
        if self.reservation(id).is_none() {
            return Ok(Decimal::ZERO);
        }
        let freed = self.free_reservation(id, book_id, amount)?;
        self.free -= freed;
        self.total -= freed;
        trace!(book = %book_id, order = %id, voided = %freed, balance = %self, "void");
        self.check_consistency("void_reservation");
        Ok(freed)
    }

    // -- serialization -----------------------------------------------------

    /// Lossless checkpoint image; [`Self::from_snapshot`] restores it
    /// bit-exact.
    pub fn snapshot(&self) -> BalanceSnapshot {
        BalanceSnapshot {
            initial: self.initial,
            free: self.free,
            reserved: self.reserved,
            total: self.total,
            symbol: self.symbol.clone(),
            rounding_decimals: self.rounding_decimals,
            reservations: self
                .reservations
                .iter()
                .map(|(id, amount)| (id.to_string(), *amount))
                .collect(),
        }
    }

    /// # Panics
    /// Panics if the snapshot violates the ledger invariants or contains
    /// an unparseable reservation key.
    pub fn from_snapshot(snapshot: &BalanceSnapshot) -> Self {
        let balance = Self {
            initial: snapshot.initial,
            free: snapshot.free,
            reserved: snapshot.reserved,
            total: snapshot.total,
            symbol: snapshot.symbol.clone(),
            rounding_decimals: snapshot.rounding_decimals,
            reservations: snapshot
                .reservations
                .iter()
                .map(|(key, amount)| {
                    let raw = key
                        .parse::<u64>()
                        .unwrap_or_else(|e| panic!("bad reservation key {key:?}: {e}"));
                    (OrderId::new(raw), *amount)
                })
                .collect(),
        };
        balance.check_consistency("from_snapshot");
        balance
    }

    /// Lossy human-readable rendering (floats), for logs and reports only.
    pub fn display_json(&self) -> serde_json::Value {
        serde_json::json!({
            "initial": self.initial.to_f64(),
            "free": self.free.to_f64(),
            "reserved": self.reserved.to_f64(),
            "total": self.total.to_f64(),
            "symbol": self.symbol,
            "roundingDecimals": self.rounding_decimals,
        })
    }

    // -- internals ---------------------------------------------------------

    fn round_amount(&self, amount: Decimal) -> Decimal {
        round(amount, self.rounding_decimals)
    }

    fn round_opt(&self, amount: Option<Decimal>) -> Option<Decimal> {
        amount.map(|a| self.round_amount(a))
    }

    fn check_consistency(&self, ctx: &str) {
        if self.total != self.free + self.reserved {
            panic!(
                "{ctx}: inconsistent accounting, total {} != free {} + reserved {}",
                self.total, self.free, self.reserved
            );
        }
        if self.total < Decimal::ZERO || self.free < Decimal::ZERO || self.reserved < Decimal::ZERO {
            panic!(
                "{ctx}: negative values in accounting {} ({} | {})",
                self.total, self.free, self.reserved
            );
        }
    }

    fn check_reservation_sum(&self, ctx: &str, book_id: BookId) {
        let sum: Decimal = self.reservations.values().copied().sum();
        if sum != self.reserved {
            panic!(
                "{ctx}: BOOK {book_id} | reserved {} does not match sum of reservations {} | {self}",
                self.reserved, sum
            );
        }
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} | {})", self.total, self.free, self.reserved)
    }
}
