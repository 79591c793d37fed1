//! Deterministic multi-agent driver
//!
//! Feeds a seeded stream of placements and cancels into an [`Exchange`]
//! under a logical clock. All randomness comes from one ChaCha8 stream, so
//! a (seed, config) pair fully determines every trade and the final
//! ledger state.

use accounting::{BalanceConfig, RegistrySnapshot};
use exchange::Exchange;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use types::ids::{AgentId, BookId, OrderId};
use types::numeric::{round, Timestamp};
use types::order::{
    LimitOrderPayload, MarketOrderPayload, OrderStatus, Side, StpFlag, TimeInForce,
};
use types::trade::Trade;

use crate::config::SimConfig;

/// Aggregate counters of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStats {
    pub steps: u64,
    pub limit_orders: u64,
    pub market_orders: u64,
    pub rejected: u64,
    pub trades: u64,
    pub cancels_requested: u64,
    pub cancelled: u64,
    pub expired: u64,
}

/// Everything a finished run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimOutcome {
    pub stats: SimStats,
    pub trades: Vec<Trade>,
    pub accounts: RegistrySnapshot,
}

pub struct Simulation {
    config: SimConfig,
    exchange: Exchange,
    rng: ChaCha8Rng,
    clock: Timestamp,
    books: Vec<BookId>,
    agents: Vec<AgentId>,
    live_orders: Vec<(BookId, OrderId)>,
    trades: Vec<Trade>,
    stats: SimStats,
}

impl Simulation {
    pub fn new(config: SimConfig) -> anyhow::Result<Self> {
        let mut exchange =
            Exchange::new(config.validator, config.book_params(), config.fee_policy());

        let books: Vec<BookId> = (0..config.books).map(|_| exchange.add_book()).collect();
        let agents: Vec<AgentId> = (1..=config.agents).map(AgentId::new).collect();
        for &agent in &agents {
            for &book in &books {
                exchange.open_account(
                    agent,
                    book,
                    &BalanceConfig {
                        total: config.initial_base,
                        symbol: Some(config.base_symbol.clone()),
                    },
                    &BalanceConfig {
                        total: config.initial_quote,
                        symbol: Some(config.quote_symbol.clone()),
                    },
                )?;
            }
        }

        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            exchange,
            rng,
            clock: 0,
            books,
            agents,
            live_orders: Vec::new(),
            trades: Vec::new(),
            stats: SimStats::default(),
        })
    }

    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    /// Run the configured number of steps and hand back the outcome.
    pub fn run(mut self) -> SimOutcome {
        for _ in 0..self.config.steps {
            self.step();
        }
        info!(
            steps = self.stats.steps,
            trades = self.stats.trades,
            rejected = self.stats.rejected,
            expired = self.stats.expired,
            "simulation finished"
        );
        SimOutcome {
            stats: self.stats,
            trades: self.trades,
            accounts: self.exchange.snapshot_accounts(),
        }
    }

    fn step(&mut self) {
        self.clock += 1;
        self.stats.steps += 1;

        let book = self.books[self.rng.gen_range(0..self.books.len())];
        let agent = self.agents[self.rng.gen_range(0..self.agents.len())];

        match self.rng.gen_range(0u32..100) {
            0..=59 => self.place_limit(book, agent),
            60..=74 => self.place_market(book, agent),
            _ => self.cancel_random(),
        }

        self.stats.expired += self.exchange.advance_time(self.clock) as u64;
    }

    fn place_limit(&mut self, book: BookId, agent: AgentId) {
        let price = self.pick_price(book);
        let volume = self.pick_volume();

        let mut payload = LimitOrderPayload::simple(self.pick_side(), volume, price, self.clock);
        payload.leverage = self.pick_leverage();
        payload.time_in_force = match self.rng.gen_range(0u32..100) {
            0..=84 => TimeInForce::GTC,
            85..=94 => TimeInForce::IOC,
            _ => TimeInForce::GTT(self.clock + self.rng.gen_range(5..50)),
        };
        payload.post_only = self.rng.gen_range(0u32..10) == 0;
        payload.stp = if self.rng.gen_range(0u32..10) == 0 {
            StpFlag::CancelOldest
        } else {
            StpFlag::None
        };

        self.stats.limit_orders += 1;
        match self.exchange.place_limit_order(book, agent, &payload) {
            Ok(report) => self.absorb(book, report),
            Err(reason) => {
                self.stats.rejected += 1;
                debug!(%book, %agent, %reason, "limit placement rejected");
            }
        }
    }

    fn place_market(&mut self, book: BookId, agent: AgentId) {
        let volume = round(self.pick_volume() / dec!(4), self.config.volume_decimals);
        if volume < self.config.validator.min_order_size {
            return;
        }
        let payload = MarketOrderPayload::simple(self.pick_side(), volume, self.clock);

        self.stats.market_orders += 1;
        match self.exchange.place_market_order(book, agent, &payload) {
            Ok(report) => self.absorb(book, report),
            Err(reason) => {
                self.stats.rejected += 1;
                debug!(%book, %agent, %reason, "market placement rejected");
            }
        }
    }

    fn cancel_random(&mut self) {
        if self.live_orders.is_empty() {
            return;
        }
        let idx = self.rng.gen_range(0..self.live_orders.len());
        let (book, order) = self.live_orders.swap_remove(idx);
        self.stats.cancels_requested += 1;
        // May already be filled or expired; a miss is fine.
        if self.exchange.cancel_order(book, order, None, self.clock) {
            self.stats.cancelled += 1;
        }
    }

    fn absorb(&mut self, book: BookId, report: types::order::PlacementReport) {
        self.stats.trades += report.trades.len() as u64;
        self.trades.extend(report.trades);
        if matches!(report.status, OrderStatus::Resting | OrderStatus::PartiallyFilled) {
            self.live_orders.push((book, report.order_id));
        }
    }

    fn pick_side(&mut self) -> Side {
        if self.rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    /// Price near the current mid (or the configured anchor on an empty
    /// book), within ±3%.
    fn pick_price(&mut self, book: BookId) -> Decimal {
        let anchor = self.exchange.mid_price(book).unwrap_or(self.config.initial_price);
        let offset = Decimal::from(self.rng.gen_range(-30i64..=30)) / dec!(1000);
        let price = round(anchor * (Decimal::ONE + offset), self.config.price_decimals);
        price.max(Decimal::new(1, self.config.price_decimals))
    }

    fn pick_volume(&mut self) -> Decimal {
        Decimal::from(self.rng.gen_range(1u32..=500)) / dec!(100)
    }

    fn pick_leverage(&mut self) -> Decimal {
        match self.rng.gen_range(0u32..10) {
            0 => Decimal::ONE,
            1 => Decimal::TWO,
            _ => Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimConfig {
        SimConfig { steps: 300, agents: 4, books: 1, ..SimConfig::default() }
    }

    #[test]
    fn test_run_produces_activity() {
        let outcome = Simulation::new(small_config()).unwrap().run();
        assert_eq!(outcome.stats.steps, 300);
        assert!(outcome.stats.limit_orders > 0);
        assert!(outcome.stats.trades > 0);
        assert_eq!(outcome.trades.len() as u64, outcome.stats.trades);
    }

    #[test]
    fn test_every_agent_keeps_consistent_ledgers() {
        let outcome = Simulation::new(small_config()).unwrap().run();
        for account in outcome.accounts.accounts.values() {
            for balances in account.holdings.values() {
                assert_eq!(balances.base.free + balances.base.reserved, balances.base.total);
                assert_eq!(balances.quote.free + balances.quote.reserved, balances.quote.total);
                assert!(balances.base.free >= Decimal::ZERO);
                assert!(balances.quote.free >= Decimal::ZERO);
            }
        }
    }
}
