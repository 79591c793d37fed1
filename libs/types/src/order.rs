//! Order lifecycle types
//!
//! Payloads describe what a client asked for; [`LimitOrder`] is the record
//! the book keeps for a resting order. Volumes are always expressed in the
//! base asset once an order reaches a book; quote-denominated requests are
//! converted during validation.

use crate::errors::RejectReason;
use crate::ids::{AgentId, OrderId};
use crate::numeric::{dec1p, round, Timestamp};
use crate::trade::Trade;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Side::Buy)
    }
}

/// Time-in-force policy for limit orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum TimeInForce {
    /// Good-Till-Cancel: remains until filled or explicitly canceled
    GTC,
    /// Immediate-Or-Cancel: match immediately, cancel remainder
    IOC,
    /// Fill-Or-Kill: full immediate match or reject entirely
    FOK,
    /// Good-Till-Time: expire at the given logical timestamp
    GTT(Timestamp),
}

/// Self-trade prevention policy of an incoming order
///
/// Applied when the incoming order would match a resting order of the same
/// agent. Prevented matches never produce trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StpFlag {
    /// No prevention, self-trades execute normally
    None,
    /// Cancel the resting (older) order, keep matching
    CancelOldest,
    /// Cancel the incoming (newer) order's remainder
    CancelNewest,
    /// Cancel both orders
    CancelBoth,
}

/// Settlement method selector
///
/// FIFO (price-time) is the only supported policy; the flag exists so the
/// wire format has room for others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettleFlag {
    Fifo,
}

impl Default for SettleFlag {
    fn default() -> Self {
        SettleFlag::Fifo
    }
}

/// Denomination of a requested volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Base,
    Quote,
}

/// Client context the book keeps per live order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderClientContext {
    pub agent_id: AgentId,
    pub client_order_id: Option<u64>,
}

impl OrderClientContext {
    pub fn new(agent_id: AgentId) -> Self {
        Self { agent_id, client_order_id: None }
    }

    pub fn with_client_order_id(agent_id: AgentId, client_order_id: u64) -> Self {
        Self { agent_id, client_order_id: Some(client_order_id) }
    }
}

/// Market order placement request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOrderPayload {
    pub side: Side,
    pub volume: Decimal,
    pub leverage: Decimal,
    pub currency: Currency,
    pub stp: StpFlag,
    pub settle: SettleFlag,
    pub timestamp: Timestamp,
}

impl MarketOrderPayload {
    /// Plain unleveraged base-denominated market order
    pub fn simple(side: Side, volume: Decimal, timestamp: Timestamp) -> Self {
        Self {
            side,
            volume,
            leverage: Decimal::ZERO,
            currency: Currency::Base,
            stp: StpFlag::None,
            settle: SettleFlag::Fifo,
            timestamp,
        }
    }
}

/// Limit order placement request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrderPayload {
    pub side: Side,
    pub volume: Decimal,
    pub price: Decimal,
    pub leverage: Decimal,
    pub currency: Currency,
    pub post_only: bool,
    pub time_in_force: TimeInForce,
    pub stp: StpFlag,
    pub settle: SettleFlag,
    pub timestamp: Timestamp,
}

impl LimitOrderPayload {
    /// Plain unleveraged GTC limit order
    pub fn simple(side: Side, volume: Decimal, price: Decimal, timestamp: Timestamp) -> Self {
        Self {
            side,
            volume,
            price,
            leverage: Decimal::ZERO,
            currency: Currency::Base,
            post_only: false,
            time_in_force: TimeInForce::GTC,
            stp: StpFlag::None,
            settle: SettleFlag::Fifo,
            timestamp,
        }
    }
}

/// A resting limit order as kept by the book
///
/// `volume` is the remaining own (unleveraged) base volume; it only shrinks.
/// Matching works on [`Self::total_volume`], the leveraged exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrder {
    pub id: OrderId,
    pub side: Side,
    pub price: Decimal,
    volume: Decimal,
    leverage: Decimal,
    pub stp: StpFlag,
    pub settle: SettleFlag,
    pub post_only: bool,
    pub time_in_force: TimeInForce,
    pub timestamp: Timestamp,
}

impl LimitOrder {
    pub fn new(
        id: OrderId,
        side: Side,
        price: Decimal,
        volume: Decimal,
        leverage: Decimal,
        payload: &LimitOrderPayload,
    ) -> Self {
        Self {
            id,
            side,
            price,
            volume,
            leverage,
            stp: payload.stp,
            settle: payload.settle,
            post_only: payload.post_only,
            time_in_force: payload.time_in_force,
            timestamp: payload.timestamp,
        }
    }

    pub fn volume(&self) -> Decimal {
        self.volume
    }

    pub fn leverage(&self) -> Decimal {
        self.leverage
    }

    /// Leveraged exposure, `volume * (1 + leverage)`
    pub fn total_volume(&self) -> Decimal {
        self.volume * dec1p(self.leverage)
    }

    /// Consume `used` units of leveraged volume after a match.
    ///
    /// The own volume shrinks by `used / (1 + leverage)` and is re-rounded
    /// to `decimals` so repeated partial fills cannot accumulate dust.
    pub fn remove_leveraged_volume(&mut self, used: Decimal, decimals: u32) {
        self.volume = round(self.volume - used / dec1p(self.leverage), decimals);
    }

    /// Reduce own volume directly (partial cancel, STP).
    pub fn remove_volume(&mut self, amount: Decimal, decimals: u32) {
        self.volume = round(self.volume - amount, decimals);
    }

    /// True once the remaining leveraged volume rounds to zero.
    pub fn is_spent(&self, decimals: u32) -> bool {
        round(self.total_volume(), decimals).is_zero()
    }

    /// GTT expiry timestamp, if any
    pub fn expiry(&self) -> Option<Timestamp> {
        match self.time_in_force {
            TimeInForce::GTT(t) => Some(t),
            _ => None,
        }
    }
}

/// Reason a live order was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelReason {
    UserRequested,
    SelfTrade,
    ImmediateOrCancel,
    Expired,
}

/// Observable state an order placement can end in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason")]
pub enum OrderStatus {
    /// Resting in the book, nothing filled yet
    #[serde(rename = "RESTING")]
    Resting,

    /// Partially matched, remainder resting
    #[serde(rename = "PARTIAL")]
    PartiallyFilled,

    /// Completely matched (terminal)
    #[serde(rename = "FILLED")]
    Filled,

    /// Cancelled (terminal); partial fills may have happened first
    #[serde(rename = "CANCELLED")]
    Cancelled(CancelReason),

    /// Failed validation, no state was mutated (terminal)
    #[serde(rename = "REJECTED")]
    Rejected(RejectReason),
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled(_) | OrderStatus::Rejected(_)
        )
    }
}

/// Outcome of a placement, returned to the caller synchronously
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementReport {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub trades: Vec<Trade>,
    /// Quote notional processed by immediate matching
    pub processed_quote: Decimal,
}
