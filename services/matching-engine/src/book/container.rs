//! One side of a book: price levels ordered by priority
//!
//! A `BTreeMap` keyed by price keeps iteration deterministic; the best
//! level is the highest key for bids and the lowest for asks.

use super::price_level::PriceLevel;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use types::ids::OrderId;
use types::order::{LimitOrder, Side};

/// All resting orders of one side
#[derive(Debug, Clone, PartialEq)]
pub struct OrderContainer {
    side: Side,
    levels: BTreeMap<Decimal, PriceLevel>,
    decimals: u32,
}

impl OrderContainer {
    pub fn new(side: Side, decimals: u32) -> Self {
        Self { side, levels: BTreeMap::new(), decimals }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of resting orders across all levels
    pub fn len(&self) -> usize {
        self.levels.values().map(PriceLevel::len).sum()
    }

    pub fn best_price(&self) -> Option<Decimal> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    pub fn best_level_mut(&mut self) -> Option<&mut PriceLevel> {
        match self.side {
            Side::Buy => self.levels.values_mut().next_back(),
            Side::Sell => self.levels.values_mut().next(),
        }
    }

    pub fn level(&self, price: Decimal) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    pub fn level_mut(&mut self, price: Decimal) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Put a limit order to rest at its price level.
    pub fn register(&mut self, order: LimitOrder) {
        let decimals = self.decimals;
        self.levels
            .entry(order.price)
            .or_insert_with(|| PriceLevel::new(order.price))
            .push_back(order, decimals);
    }

    /// Remove an order from its level, pruning the level if it empties.
    pub fn unregister(&mut self, id: OrderId, price: Decimal) -> Option<LimitOrder> {
        let level = self.levels.get_mut(&price)?;
        let order = level.remove(id, self.decimals)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some(order)
    }

    /// Drop the best level if it has no orders left.
    pub fn prune_best(&mut self) {
        if let Some(price) = self.best_price() {
            if self.levels[&price].is_empty() {
                self.levels.remove(&price);
            }
        }
    }

    /// Leveraged volume matchable within an optional price bound
    ///
    /// The bound is the incoming order's limit price: a maximum when this
    /// is the sell side, a minimum when this is the buy side.
    pub fn fillable_volume(&self, bound: Option<Decimal>) -> Decimal {
        let within = |price: &Decimal| match (self.side, bound) {
            (_, None) => true,
            (Side::Buy, Some(min)) => *price >= min,
            (Side::Sell, Some(max)) => *price <= max,
        };
        self.levels
            .iter()
            .filter(|(price, _)| within(price))
            .map(|(_, level)| level.volume())
            .sum()
    }

    /// Total leveraged volume resting on this side
    pub fn volume(&self) -> Decimal {
        self.levels.values().map(PriceLevel::volume).sum()
    }

    /// Top `depth` levels, best first
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Decimal, Decimal)> {
        let take = |iter: &mut dyn Iterator<Item = (&Decimal, &PriceLevel)>| {
            iter.take(depth).map(|(p, l)| (*p, l.volume())).collect()
        };
        match self.side {
            Side::Buy => take(&mut self.levels.iter().rev()),
            Side::Sell => take(&mut self.levels.iter()),
        }
    }

    pub fn iter_levels(&self) -> impl Iterator<Item = &PriceLevel> {
        self.levels.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use types::order::LimitOrderPayload;

    const DP: u32 = 8;

    fn order(id: u64, side: Side, price: Decimal, volume: Decimal) -> LimitOrder {
        let payload = LimitOrderPayload::simple(side, volume, price, 0);
        LimitOrder::new(OrderId::new(id), side, price, volume, dec!(0), &payload)
    }

    fn ask_container() -> OrderContainer {
        let mut c = OrderContainer::new(Side::Sell, DP);
        c.register(order(1, Side::Sell, dec!(101), dec!(1)));
        c.register(order(2, Side::Sell, dec!(100), dec!(2)));
        c.register(order(3, Side::Sell, dec!(102), dec!(3)));
        c
    }

    #[test]
    fn test_best_price_per_side() {
        let asks = ask_container();
        assert_eq!(asks.best_price(), Some(dec!(100)));

        let mut bids = OrderContainer::new(Side::Buy, DP);
        bids.register(order(4, Side::Buy, dec!(99), dec!(1)));
        bids.register(order(5, Side::Buy, dec!(98), dec!(1)));
        assert_eq!(bids.best_price(), Some(dec!(99)));
    }

    #[test]
    fn test_unregister_prunes_empty_level() {
        let mut asks = ask_container();
        assert!(asks.unregister(OrderId::new(2), dec!(100)).is_some());
        assert_eq!(asks.best_price(), Some(dec!(101)));
        assert_eq!(asks.len(), 2);
        assert!(asks.unregister(OrderId::new(2), dec!(100)).is_none());
    }

    #[test]
    fn test_fillable_volume_with_bound() {
        let asks = ask_container();
        // A buy limit at 101 can reach the levels at 100 and 101.
        assert_eq!(asks.fillable_volume(Some(dec!(101))), dec!(3));
        assert_eq!(asks.fillable_volume(Some(dec!(99))), dec!(0));
        assert_eq!(asks.fillable_volume(None), dec!(6));
    }

    #[test]
    fn test_depth_snapshot_best_first() {
        let asks = ask_container();
        let depth = asks.depth_snapshot(2);
        assert_eq!(depth, vec![(dec!(100), dec!(2)), (dec!(101), dec!(1))]);
    }
}
