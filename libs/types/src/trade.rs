//! Trade execution types

use crate::ids::{AgentId, BookId, OrderId, TradeId};
use crate::numeric::Timestamp;
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An atomic exchange between an aggressing and a resting order
///
/// Executed at the resting order's price. Trade ids are a per-book
/// monotonic sequence, so the trade stream of a book is totally ordered
/// and identical across replays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub book_id: BookId,

    /// Side of the aggressing (taker) order
    pub taker_side: Side,

    // Order references
    pub aggressing_order_id: OrderId,
    pub resting_order_id: OrderId,

    // Account references
    pub aggressing_agent_id: AgentId,
    pub resting_agent_id: AgentId,

    /// Base volume exchanged (leveraged exposure units)
    pub volume: Decimal,
    /// Execution price, always the resting order's limit price
    pub price: Decimal,

    pub timestamp: Timestamp,
}

impl Trade {
    /// Quote notional (price × volume)
    pub fn notional(&self) -> Decimal {
        self.price * self.volume
    }

    /// True when both sides belong to the same agent
    pub fn is_self_trade(&self) -> bool {
        self.aggressing_agent_id == self.resting_agent_id
    }
}
