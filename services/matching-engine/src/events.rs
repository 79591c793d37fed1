//! Events emitted by a book while it mutates
//!
//! Events are delivered synchronously, in exact state-change order, to the
//! [`BookEventHandler`] passed into the mutating call. The handler may
//! mutate the ledger, but it holds no reference to the emitting book, so
//! re-entrant book mutation is impossible by construction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::{AgentId, BookId, OrderId};
use types::numeric::Timestamp;
use types::order::{CancelReason, Side};
use types::trade::Trade;

/// Per-side context of a trade, everything settlement needs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeSideInfo {
    pub order_id: OrderId,
    pub agent_id: AgentId,
    pub side: Side,
    pub leverage: Decimal,
    /// True when this trade consumed the order's last remaining volume
    pub fully_filled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BookEvent {
    /// A match executed at the resting order's price
    Trade {
        trade: Trade,
        taker: TradeSideInfo,
        maker: TradeSideInfo,
    },

    /// Volume left the book without trading
    ///
    /// `remaining_volume` is the order's own volume after the cancel; zero
    /// means the order is gone. `price` is `None` for market orders.
    Cancelled {
        book_id: BookId,
        order_id: OrderId,
        agent_id: AgentId,
        side: Side,
        price: Option<Decimal>,
        leverage: Decimal,
        reason: CancelReason,
        cancelled_volume: Decimal,
        remaining_volume: Decimal,
        timestamp: Timestamp,
    },

    /// A limit order came to rest in the book
    Registered {
        book_id: BookId,
        order_id: OrderId,
        agent_id: AgentId,
        side: Side,
        price: Decimal,
        volume: Decimal,
        timestamp: Timestamp,
    },

    /// A resting order left the book (filled, cancelled or expired)
    Unregistered {
        book_id: BookId,
        order_id: OrderId,
        agent_id: AgentId,
    },

    /// Top-of-book or depth changed
    DepthChanged {
        book_id: BookId,
        timestamp: Timestamp,
    },
}

/// Synchronous sink for [`BookEvent`]s
///
/// Passed as `&mut dyn BookEventHandler` into every mutating book call.
pub trait BookEventHandler {
    fn on_event(&mut self, event: &BookEvent);
}

/// Sink that drops everything (queries, tests)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHandler;

impl BookEventHandler for NullHandler {
    fn on_event(&mut self, _event: &BookEvent) {}
}

/// Sink that records everything (tests, event-log capture)
#[derive(Debug, Default, Clone)]
pub struct RecordingHandler {
    pub events: Vec<BookEvent>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trades(&self) -> impl Iterator<Item = &Trade> {
        self.events.iter().filter_map(|e| match e {
            BookEvent::Trade { trade, .. } => Some(trade),
            _ => None,
        })
    }
}

impl BookEventHandler for RecordingHandler {
    fn on_event(&mut self, event: &BookEvent) {
        self.events.push(event.clone());
    }
}
