//! Price level: FIFO queue of resting orders at one price
//!
//! Orders are kept in arrival order to enforce time priority. The level
//! caches the sum of its orders' leveraged volumes so depth queries do not
//! rescan the queue.

use rust_decimal::Decimal;
use std::collections::VecDeque;
use types::ids::OrderId;
use types::numeric::round;
use types::order::LimitOrder;

/// All resting orders at a specific price, FIFO by arrival
#[derive(Debug, Clone, PartialEq)]
pub struct PriceLevel {
    price: Decimal,
    orders: VecDeque<LimitOrder>,
    /// Cached sum of leveraged volumes, rounded to volume precision
    volume: Decimal,
}

impl PriceLevel {
    pub fn new(price: Decimal) -> Self {
        Self { price, orders: VecDeque::new(), volume: Decimal::ZERO }
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Leveraged volume resting at this level
    pub fn volume(&self) -> Decimal {
        self.volume
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Append at the back of the queue (time priority).
    pub fn push_back(&mut self, order: LimitOrder, decimals: u32) {
        self.volume = round(self.volume + order.total_volume(), decimals);
        self.orders.push_back(order);
    }

    pub fn front(&self) -> Option<&LimitOrder> {
        self.orders.front()
    }

    pub fn front_mut(&mut self) -> Option<&mut LimitOrder> {
        self.orders.front_mut()
    }

    /// Pop the front order, dropping its remaining volume from the cache.
    pub fn pop_front(&mut self, decimals: u32) -> Option<LimitOrder> {
        let order = self.orders.pop_front()?;
        self.volume = round(self.volume - order.total_volume(), decimals).max(Decimal::ZERO);
        Some(order)
    }

    /// Remove an order anywhere in the queue by id.
    pub fn remove(&mut self, id: OrderId, decimals: u32) -> Option<LimitOrder> {
        let position = self.orders.iter().position(|o| o.id == id)?;
        let order = self.orders.remove(position)?;
        self.volume = round(self.volume - order.total_volume(), decimals).max(Decimal::ZERO);
        Some(order)
    }

    pub fn order(&self, id: OrderId) -> Option<&LimitOrder> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn order_mut(&mut self, id: OrderId) -> Option<&mut LimitOrder> {
        self.orders.iter_mut().find(|o| o.id == id)
    }

    /// Drop `used` units of leveraged volume from the cache after a fill
    /// or partial cancel. The affected order must be adjusted separately.
    pub fn reduce_volume(&mut self, used: Decimal, decimals: u32) {
        self.volume = round(self.volume - used, decimals).max(Decimal::ZERO);
    }

    pub fn iter(&self) -> impl Iterator<Item = &LimitOrder> {
        self.orders.iter()
    }
}
