//! Price-time-priority order book
//!
//! One [`Book`] per traded instrument. Placement walks the opposite side
//! best level outward, trading at each resting order's price, then lets
//! time-in-force decide what happens to the remainder. The book performs
//! no validation and touches no ledger: it assumes placements were
//! admitted upstream and reports everything it does through the event
//! sink.

pub mod container;
pub mod price_level;

pub use container::OrderContainer;
pub use price_level::PriceLevel;

use crate::events::{BookEvent, BookEventHandler, TradeSideInfo};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, trace};
use types::ids::{AgentId, BookId, IdAllocator, OrderId};
use types::numeric::{dec1p, round, Timestamp};
use types::order::{
    CancelReason, LimitOrder, LimitOrderPayload, MarketOrderPayload, OrderClientContext,
    OrderStatus, PlacementReport, Side, StpFlag, TimeInForce,
};
use types::trade::Trade;

/// Fixed-precision parameters of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookParams {
    pub price_decimals: u32,
    pub volume_decimals: u32,
}

impl Default for BookParams {
    fn default() -> Self {
        Self { price_decimals: 4, volume_decimals: 8 }
    }
}

/// Mutable state of the incoming order during a matching walk
#[derive(Debug, Clone)]
struct Taker {
    id: OrderId,
    agent_id: AgentId,
    side: Side,
    volume: Decimal,
    leverage: Decimal,
    stp: StpFlag,
    timestamp: Timestamp,
}

impl Taker {
    fn total_volume(&self) -> Decimal {
        self.volume * dec1p(self.leverage)
    }

    fn remove_leveraged_volume(&mut self, used: Decimal, decimals: u32) {
        self.volume = round(self.volume - used / dec1p(self.leverage), decimals);
    }
}

#[derive(Debug, Default)]
struct WalkOutcome {
    processed_quote: Decimal,
    trades: Vec<Trade>,
    /// The incoming order's remainder was killed by self-trade prevention
    incoming_cancelled: bool,
}

/// One instrument's order book
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    id: BookId,
    params: BookParams,
    bids: OrderContainer,
    asks: OrderContainer,
    /// Live order -> (side, resting price) for O(1) lookup and cancel
    index: HashMap<OrderId, (Side, Decimal)>,
    /// Client context of live orders
    ctx: HashMap<OrderId, OrderClientContext>,
    /// GTT orders ordered by expiry
    expiries: BTreeSet<(Timestamp, OrderId)>,
    order_ids: IdAllocator,
    trade_ids: IdAllocator,
}

impl Book {
    pub fn new(id: BookId, params: BookParams) -> Self {
        Self {
            id,
            params,
            bids: OrderContainer::new(Side::Buy, params.volume_decimals),
            asks: OrderContainer::new(Side::Sell, params.volume_decimals),
            index: HashMap::new(),
            ctx: HashMap::new(),
            expiries: BTreeSet::new(),
            order_ids: IdAllocator::new(),
            trade_ids: IdAllocator::new(),
        }
    }

    // -- queries -----------------------------------------------------------

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn params(&self) -> BookParams {
        self.params
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.best_price()
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.best_price()
    }

    /// Midpoint of the touch; `None` while either side is empty.
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::TWO),
            _ => None,
        }
    }

    pub fn contains(&self, id: OrderId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn order(&self, id: OrderId) -> Option<&LimitOrder> {
        let (side, price) = *self.index.get(&id)?;
        self.container(side).level(price)?.order(id)
    }

    pub fn client_context(&self, id: OrderId) -> Option<&OrderClientContext> {
        self.ctx.get(&id)
    }

    /// Number of live orders an agent has on this book
    pub fn open_orders(&self, agent: AgentId) -> usize {
        self.ctx.values().filter(|c| c.agent_id == agent).count()
    }

    /// Leveraged volume on `side` matchable within an optional price bound
    pub fn fillable_volume(&self, side: Side, bound: Option<Decimal>) -> Decimal {
        self.container(side).fillable_volume(bound)
    }

    pub fn depth_snapshot(&self, side: Side, depth: usize) -> Vec<(Decimal, Decimal)> {
        self.container(side).depth_snapshot(depth)
    }

    /// Depth on `side` with `agent`'s own resting orders left out, best
    /// level first.
    ///
    /// What an incoming cancel-oldest order from `agent` can actually
    /// trade against: its own resting orders are cancelled on contact,
    /// never matched.
    pub fn depth_snapshot_excluding(&self, side: Side, agent: AgentId) -> Vec<(Decimal, Decimal)> {
        let dp = self.params.volume_decimals;
        let mut levels: Vec<(Decimal, Decimal)> = self
            .container(side)
            .iter_levels()
            .filter_map(|level| {
                let volume = level
                    .iter()
                    .filter(|o| self.ctx.get(&o.id).map_or(true, |c| c.agent_id != agent))
                    .fold(Decimal::ZERO, |acc, o| acc + o.total_volume());
                let volume = round(volume, dp);
                (volume > Decimal::ZERO).then_some((level.price(), volume))
            })
            .collect();
        if side == Side::Buy {
            levels.reverse();
        }
        levels
    }

    /// Id the next placement on this book will be assigned.
    ///
    /// Lets clearing key a reservation before handing the order over.
    pub fn next_order_id(&self) -> OrderId {
        OrderId::new(self.order_ids.peek())
    }

    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    fn container(&self, side: Side) -> &OrderContainer {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    // -- placement ---------------------------------------------------------

    /// Place a pre-validated market order.
    ///
    /// Walks the opposite side unbounded by price; any remainder when the
    /// opposite side runs dry is cancelled, a market order never rests.
    pub fn place_market_order(
        &mut self,
        payload: &MarketOrderPayload,
        ctx: OrderClientContext,
        sink: &mut dyn BookEventHandler,
    ) -> PlacementReport {
        let dp = self.params.volume_decimals;
        let id = self.order_ids.next_order_id();
        self.ctx.insert(id, ctx);

        let mut taker = Taker {
            id,
            agent_id: ctx.agent_id,
            side: payload.side,
            volume: round(payload.volume, dp),
            leverage: round(payload.leverage, dp),
            stp: payload.stp,
            timestamp: payload.timestamp,
        };

        let outcome = self.match_incoming(&mut taker, None, sink);
        self.ctx.remove(&id);

        let remaining = round(taker.volume, dp);
        let status = if outcome.incoming_cancelled {
            OrderStatus::Cancelled(CancelReason::SelfTrade)
        } else if remaining > Decimal::ZERO {
            // Opposite side ran dry.
            sink.on_event(&BookEvent::Cancelled {
                book_id: self.id,
                order_id: id,
                agent_id: taker.agent_id,
                side: taker.side,
                price: None,
                leverage: taker.leverage,
                reason: CancelReason::ImmediateOrCancel,
                cancelled_volume: remaining,
                remaining_volume: Decimal::ZERO,
                timestamp: taker.timestamp,
            });
            OrderStatus::Cancelled(CancelReason::ImmediateOrCancel)
        } else {
            OrderStatus::Filled
        };

        if !outcome.trades.is_empty() {
            sink.on_event(&BookEvent::DepthChanged { book_id: self.id, timestamp: taker.timestamp });
        }
        debug!(book = %self.id, order = %id, ?status, trades = outcome.trades.len(), "market order processed");

        PlacementReport {
            order_id: id,
            status,
            trades: outcome.trades,
            processed_quote: outcome.processed_quote,
        }
    }

    /// Place a pre-validated limit order.
    ///
    /// If it crosses, it first matches within its limit price; the
    /// remainder then rests (GTC/GTT), is cancelled (IOC), or must not
    /// exist at all (FOK, guaranteed fillable by admission).
    pub fn place_limit_order(
        &mut self,
        payload: &LimitOrderPayload,
        ctx: OrderClientContext,
        sink: &mut dyn BookEventHandler,
    ) -> PlacementReport {
        let dp = self.params.volume_decimals;
        let price = round(payload.price, self.params.price_decimals);
        let id = self.order_ids.next_order_id();
        self.ctx.insert(id, ctx);

        let mut taker = Taker {
            id,
            agent_id: ctx.agent_id,
            side: payload.side,
            volume: round(payload.volume, dp),
            leverage: round(payload.leverage, dp),
            stp: payload.stp,
            timestamp: payload.timestamp,
        };

        let crosses = match payload.side {
            Side::Buy => self.best_ask().is_some_and(|ask| ask <= price),
            Side::Sell => self.best_bid().is_some_and(|bid| bid >= price),
        };
        let outcome = if crosses {
            self.match_incoming(&mut taker, Some(price), sink)
        } else {
            WalkOutcome::default()
        };

        let remaining = round(taker.volume, dp);
        let status = if outcome.incoming_cancelled {
            self.ctx.remove(&id);
            OrderStatus::Cancelled(CancelReason::SelfTrade)
        } else if remaining > Decimal::ZERO {
            match payload.time_in_force {
                TimeInForce::GTC | TimeInForce::GTT(_) => {
                    let order =
                        LimitOrder::new(id, payload.side, price, remaining, taker.leverage, payload);
                    if let Some(expiry) = order.expiry() {
                        self.expiries.insert((expiry, id));
                    }
                    self.index.insert(id, (payload.side, price));
                    sink.on_event(&BookEvent::Registered {
                        book_id: self.id,
                        order_id: id,
                        agent_id: taker.agent_id,
                        side: payload.side,
                        price,
                        volume: remaining,
                        timestamp: payload.timestamp,
                    });
                    match payload.side {
                        Side::Buy => self.bids.register(order),
                        Side::Sell => self.asks.register(order),
                    }
                    if outcome.trades.is_empty() {
                        OrderStatus::Resting
                    } else {
                        OrderStatus::PartiallyFilled
                    }
                }
                TimeInForce::IOC => {
                    self.ctx.remove(&id);
                    sink.on_event(&BookEvent::Cancelled {
                        book_id: self.id,
                        order_id: id,
                        agent_id: taker.agent_id,
                        side: taker.side,
                        price: Some(price),
                        leverage: taker.leverage,
                        reason: CancelReason::ImmediateOrCancel,
                        cancelled_volume: remaining,
                        remaining_volume: Decimal::ZERO,
                        timestamp: taker.timestamp,
                    });
                    OrderStatus::Cancelled(CancelReason::ImmediateOrCancel)
                }
                TimeInForce::FOK => {
                    // Self-trade prevention can starve the walk even when
                    // admission saw enough depth; the remainder is killed,
                    // never rested.
                    self.ctx.remove(&id);
                    sink.on_event(&BookEvent::Cancelled {
                        book_id: self.id,
                        order_id: id,
                        agent_id: taker.agent_id,
                        side: taker.side,
                        price: Some(price),
                        leverage: taker.leverage,
                        reason: CancelReason::ImmediateOrCancel,
                        cancelled_volume: remaining,
                        remaining_volume: Decimal::ZERO,
                        timestamp: taker.timestamp,
                    });
                    OrderStatus::Cancelled(CancelReason::ImmediateOrCancel)
                }
            }
        } else {
            self.ctx.remove(&id);
            OrderStatus::Filled
        };

        sink.on_event(&BookEvent::DepthChanged { book_id: self.id, timestamp: taker.timestamp });
        debug!(book = %self.id, order = %id, ?status, trades = outcome.trades.len(), "limit order processed");

        PlacementReport {
            order_id: id,
            status,
            trades: outcome.trades,
            processed_quote: outcome.processed_quote,
        }
    }

    // -- cancellation ------------------------------------------------------

    /// Cancel up to `volume` of a live order (all of it when `None`).
    ///
    /// Returns false for unknown or already-gone orders; cancelling is
    /// idempotent. Requesting more than remains clamps to the remainder.
    pub fn cancel_order(
        &mut self,
        id: OrderId,
        volume: Option<Decimal>,
        timestamp: Timestamp,
        sink: &mut dyn BookEventHandler,
    ) -> bool {
        let dp = self.params.volume_decimals;
        let Some(&(side, price)) = self.index.get(&id) else {
            return false;
        };

        let remaining = match self.container(side).level(price).and_then(|l| l.order(id)) {
            Some(order) => order.volume(),
            None => return false,
        };
        let to_cancel = match volume {
            Some(v) => round(v, dp).min(remaining),
            None => remaining,
        };
        if to_cancel <= Decimal::ZERO {
            return false;
        }

        if to_cancel >= remaining {
            self.cancel_resting(id, CancelReason::UserRequested, timestamp, sink);
        } else {
            let container = match side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            let level = container.level_mut(price).expect("indexed level exists");
            let order = level.order_mut(id).expect("indexed order exists");
            order.remove_volume(to_cancel, dp);
            let leverage = order.leverage();
            let left = order.volume();
            level.reduce_volume(to_cancel * dec1p(leverage), dp);
            let agent_id = self.ctx[&id].agent_id;
            sink.on_event(&BookEvent::Cancelled {
                book_id: self.id,
                order_id: id,
                agent_id,
                side,
                price: Some(price),
                leverage,
                reason: CancelReason::UserRequested,
                cancelled_volume: to_cancel,
                remaining_volume: left,
                timestamp,
            });
        }
        sink.on_event(&BookEvent::DepthChanged { book_id: self.id, timestamp });
        true
    }

    /// Cancel every GTT order whose expiry is at or before `now`.
    ///
    /// Returns the number of orders expired.
    pub fn expire_due(&mut self, now: Timestamp, sink: &mut dyn BookEventHandler) -> usize {
        let mut expired = 0;
        while let Some(&(expiry, id)) = self.expiries.iter().next() {
            if expiry > now {
                break;
            }
            self.expiries.remove(&(expiry, id));
            if self.cancel_resting(id, CancelReason::Expired, now, sink) {
                expired += 1;
            }
        }
        if expired > 0 {
            sink.on_event(&BookEvent::DepthChanged { book_id: self.id, timestamp: now });
        }
        expired
    }

    /// Remove a resting order entirely, emitting Cancelled + Unregistered.
    fn cancel_resting(
        &mut self,
        id: OrderId,
        reason: CancelReason,
        timestamp: Timestamp,
        sink: &mut dyn BookEventHandler,
    ) -> bool {
        let Some(&(side, price)) = self.index.get(&id) else {
            return false;
        };
        let container = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let Some(order) = container.unregister(id, price) else {
            return false;
        };
        let agent_id = self.forget(&order);
        trace!(book = %self.id, order = %id, ?reason, "cancelled resting order");
        sink.on_event(&BookEvent::Cancelled {
            book_id: self.id,
            order_id: id,
            agent_id,
            side,
            price: Some(price),
            leverage: order.leverage(),
            reason,
            cancelled_volume: order.volume(),
            remaining_volume: Decimal::ZERO,
            timestamp,
        });
        sink.on_event(&BookEvent::Unregistered { book_id: self.id, order_id: id, agent_id });
        true
    }

    /// Drop all tracking for an order that left the book.
    fn forget(&mut self, order: &LimitOrder) -> AgentId {
        self.index.remove(&order.id);
        if let Some(expiry) = order.expiry() {
            self.expiries.remove(&(expiry, order.id));
        }
        self.ctx
            .remove(&order.id)
            .map(|c| c.agent_id)
            .unwrap_or_else(|| panic!("BOOK {} | no client context for order #{}", self.id, order.id))
    }

    // -- matching ----------------------------------------------------------

    /// Walk the opposite side best level outward within `bound`.
    ///
    /// Trades execute at each resting order's price for
    /// `min(incoming remaining, resting remaining)` leveraged units.
    fn match_incoming(
        &mut self,
        taker: &mut Taker,
        bound: Option<Decimal>,
        sink: &mut dyn BookEventHandler,
    ) -> WalkOutcome {
        let dp = self.params.volume_decimals;
        let mut out = WalkOutcome::default();

        loop {
            if round(taker.total_volume(), dp) <= Decimal::ZERO {
                break;
            }
            let opposite = match taker.side {
                Side::Buy => &self.asks,
                Side::Sell => &self.bids,
            };
            let Some(best_price) = opposite.best_price() else {
                break;
            };
            let within = match (taker.side, bound) {
                (_, None) => true,
                (Side::Buy, Some(max)) => best_price <= max,
                (Side::Sell, Some(min)) => best_price >= min,
            };
            if !within {
                break;
            }

            let front = opposite
                .level(best_price)
                .and_then(PriceLevel::front)
                .expect("best level is never empty");
            let resting_id = front.id;
            let resting_total = round(front.total_volume(), dp);
            let resting_agent = self.ctx[&resting_id].agent_id;

            // Self-trade prevention happens before any volume moves.
            if resting_agent == taker.agent_id && taker.stp != StpFlag::None {
                let stp = taker.stp;
                if matches!(stp, StpFlag::CancelNewest | StpFlag::CancelBoth) {
                    sink.on_event(&BookEvent::Cancelled {
                        book_id: self.id,
                        order_id: taker.id,
                        agent_id: taker.agent_id,
                        side: taker.side,
                        price: bound,
                        leverage: taker.leverage,
                        reason: CancelReason::SelfTrade,
                        cancelled_volume: taker.volume,
                        remaining_volume: Decimal::ZERO,
                        timestamp: taker.timestamp,
                    });
                    taker.volume = Decimal::ZERO;
                    out.incoming_cancelled = true;
                }
                if matches!(stp, StpFlag::CancelOldest | StpFlag::CancelBoth) {
                    self.cancel_resting(resting_id, CancelReason::SelfTrade, taker.timestamp, sink);
                }
                if matches!(stp, StpFlag::CancelNewest | StpFlag::CancelBoth) {
                    break;
                }
                continue;
            }

            if resting_total.is_zero() {
                // Dust order, drop it and move on.
                self.cancel_resting(resting_id, CancelReason::UserRequested, taker.timestamp, sink);
                continue;
            }

            let used = resting_total.min(round(taker.total_volume(), dp));
            out.processed_quote += used * best_price;

            let opposite = match taker.side {
                Side::Buy => &mut self.asks,
                Side::Sell => &mut self.bids,
            };
            let level = opposite.level_mut(best_price).expect("best level exists");
            let (maker_leverage, maker_spent) = {
                let front = level.front_mut().expect("front exists");
                front.remove_leveraged_volume(used, dp);
                (front.leverage(), front.is_spent(dp))
            };
            level.reduce_volume(used, dp);
            let maker_done = if maker_spent { level.pop_front(dp) } else { None };
            if maker_spent {
                opposite.prune_best();
            }

            taker.remove_leveraged_volume(used, dp);
            let taker_spent = round(taker.total_volume(), dp).is_zero();

            let trade = Trade {
                trade_id: self.trade_ids.next_trade_id(),
                book_id: self.id,
                taker_side: taker.side,
                aggressing_order_id: taker.id,
                resting_order_id: resting_id,
                aggressing_agent_id: taker.agent_id,
                resting_agent_id: resting_agent,
                volume: used,
                price: best_price,
                timestamp: taker.timestamp,
            };
            trace!(
                book = %self.id,
                trade = %trade.trade_id,
                price = %best_price,
                volume = %used,
                taker = %taker.id,
                maker = %resting_id,
                "trade"
            );
            sink.on_event(&BookEvent::Trade {
                trade: trade.clone(),
                taker: TradeSideInfo {
                    order_id: taker.id,
                    agent_id: taker.agent_id,
                    side: taker.side,
                    leverage: taker.leverage,
                    fully_filled: taker_spent,
                },
                maker: TradeSideInfo {
                    order_id: resting_id,
                    agent_id: resting_agent,
                    side: taker.side.opposite(),
                    leverage: maker_leverage,
                    fully_filled: maker_spent,
                },
            });
            out.trades.push(trade);

            if let Some(order) = maker_done {
                let agent_id = self.forget(&order);
                sink.on_event(&BookEvent::Unregistered {
                    book_id: self.id,
                    order_id: order.id,
                    agent_id,
                });
            }
        }
        out
    }
}
