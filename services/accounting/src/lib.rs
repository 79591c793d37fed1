//! Reservation-based balance ledger
//!
//! Each [`Balance`] tracks one asset for one agent on one book, split into
//! a free and a reserved part. Funds committed to open orders are held as
//! per-order reservations; settlement consumes reservations and deposits
//! proceeds. All fund movement goes through four entry points:
//! [`Balance::make_reservation`], [`Balance::free_reservation`] (and its
//! non-throwing sibling [`Balance::try_free_reservation`]),
//! [`Balance::void_reservation`] and [`Balance::deposit`].
//!
//! Recoverable conditions (insufficient funds, unknown reservation) are
//! `Err` values; a broken ledger invariant is a panic with full context.

pub mod account;
pub mod balance;
pub mod free_info;

pub use account::{
    Account, AccountRegistry, AccountSnapshot, Balances, BalancesSnapshot, RegistrySnapshot,
};
pub use balance::{Balance, BalanceConfig, BalanceSnapshot, LedgerError};
pub use free_info::{FreeInfo, FreeStatus};
