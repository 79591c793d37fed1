//! Matching engine
//!
//! Price-time-priority order book with synchronous event notification.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced
//! - Trades execute at the resting order's price
//! - Deterministic: same placement sequence, same trades and ids
//! - Self-trade prevention honored before any volume moves

pub mod book;
pub mod events;

pub use book::{Book, BookParams, OrderContainer, PriceLevel};
pub use events::{BookEvent, BookEventHandler, NullHandler, RecordingHandler, TradeSideInfo};
