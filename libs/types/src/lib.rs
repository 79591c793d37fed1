//! Types library for the exchange simulator
//!
//! This library provides all core type definitions shared across the
//! simulator, ensuring type safety and deterministic behavior.
//!
//! # Modules
//! - `ids`: Unique identifiers (OrderId, TradeId, AgentId, BookId)
//! - `numeric`: Fixed-precision rounding helpers
//! - `order`: Order lifecycle types
//! - `trade`: Trade execution types
//! - `fee`: Fee calculation types
//! - `errors`: Rejection taxonomy

pub mod errors;
pub mod fee;
pub mod ids;
pub mod numeric;
pub mod order;
pub mod trade;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::*;
    pub use crate::fee::*;
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::trade::*;
}
