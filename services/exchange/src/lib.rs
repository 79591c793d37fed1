//! Exchange service
//!
//! Glues the matching engine to the accounting ledger. Placements are
//! validated and fully funded (reservation made) before they reach a book;
//! every event a book emits settles synchronously against the ledger.
//!
//! **Key invariants:**
//! - A rejected placement mutates nothing
//! - Every live order is backed by exactly one reservation
//! - Without fees and leverage, trading conserves total funds

pub mod clearing;
pub mod exchange;
pub mod validator;

pub use clearing::{ClearingManager, SettlementSink};
pub use exchange::Exchange;
pub use validator::{OrderPlacementValidator, Validation, ValidatorParams};
