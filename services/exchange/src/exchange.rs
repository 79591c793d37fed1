//! Exchange facade: books plus clearing under one roof
//!
//! Routes placements through validation and reservation before the book
//! sees them, settles every book event against the ledger as it happens,
//! and fans the event stream out to registered observers afterwards. All
//! of it synchronous: when a placement call returns, every balance move it
//! caused is visible.

use std::collections::BTreeMap;

use accounting::{BalanceConfig, LedgerError, RegistrySnapshot};
use matching_engine::{Book, BookEvent, BookParams};
use rust_decimal::Decimal;
use tracing::debug;
use types::errors::RejectReason;
use types::fee::FeePolicy;
use types::ids::{AgentId, BookId, OrderId};
use types::numeric::Timestamp;
use types::order::{Currency, LimitOrderPayload, MarketOrderPayload, PlacementReport};

use crate::clearing::ClearingManager;
use crate::validator::ValidatorParams;

type Observer = Box<dyn FnMut(&BookEvent)>;

pub struct Exchange {
    books: BTreeMap<BookId, Book>,
    book_params: BookParams,
    clearing: ClearingManager,
    observers: Vec<Observer>,
}

impl Exchange {
    pub fn new(params: ValidatorParams, book_params: BookParams, fee_policy: FeePolicy) -> Self {
        Self {
            books: BTreeMap::new(),
            book_params,
            clearing: ClearingManager::new(params, fee_policy),
            observers: Vec::new(),
        }
    }

    /// Create the next book. Ids are sequential from zero.
    pub fn add_book(&mut self) -> BookId {
        let id = BookId::new(self.books.len() as u32);
        self.books.insert(id, Book::new(id, self.book_params));
        debug!(book = %id, "book added");
        id
    }

    pub fn book(&self, id: BookId) -> Option<&Book> {
        self.books.get(&id)
    }

    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    pub fn clearing(&self) -> &ClearingManager {
        &self.clearing
    }

    pub fn open_account(
        &mut self,
        agent: AgentId,
        book: BookId,
        base: &BalanceConfig,
        quote: &BalanceConfig,
    ) -> Result<(), LedgerError> {
        self.clearing.accounts_mut().open(agent, book, base, quote)
    }

    pub fn deposit(
        &mut self,
        agent: AgentId,
        book: BookId,
        currency: Currency,
        amount: Decimal,
    ) -> bool {
        self.clearing.accounts_mut().deposit(agent, book, currency, amount)
    }

    /// Register an event observer. Observers see every event of every book
    /// after its settlement has completed, in emission order.
    pub fn add_observer(&mut self, observer: impl FnMut(&BookEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Validate, reserve, and execute a market order.
    ///
    /// On rejection no book or ledger state changes.
    pub fn place_market_order(
        &mut self,
        book_id: BookId,
        agent: AgentId,
        payload: &MarketOrderPayload,
    ) -> Result<PlacementReport, RejectReason> {
        let book = self.books.get(&book_id).ok_or(RejectReason::NonexistentBook)?;
        let (normalized, _) = self.clearing.admit_market_order(book, agent, payload)?;

        let book = self.books.get_mut(&book_id).expect("book vanished mid-placement");
        let mut sink = self.clearing.settlement_sink();
        let report = book.place_market_order(&normalized, types::order::OrderClientContext::new(agent), &mut sink);
        let events = sink.into_events();
        self.notify(&events);
        debug!(
            book = %book_id,
            agent = %agent,
            order = %report.order_id,
            status = ?report.status,
            trades = report.trades.len(),
            "market order placed"
        );
        Ok(report)
    }

    /// Limit-order counterpart of [`Self::place_market_order`].
    pub fn place_limit_order(
        &mut self,
        book_id: BookId,
        agent: AgentId,
        payload: &LimitOrderPayload,
    ) -> Result<PlacementReport, RejectReason> {
        let book = self.books.get(&book_id).ok_or(RejectReason::NonexistentBook)?;
        let (normalized, _) = self.clearing.admit_limit_order(book, agent, payload)?;

        let book = self.books.get_mut(&book_id).expect("book vanished mid-placement");
        let mut sink = self.clearing.settlement_sink();
        let report = book.place_limit_order(&normalized, types::order::OrderClientContext::new(agent), &mut sink);
        let events = sink.into_events();
        self.notify(&events);
        debug!(
            book = %book_id,
            agent = %agent,
            order = %report.order_id,
            status = ?report.status,
            trades = report.trades.len(),
            "limit order placed"
        );
        Ok(report)
    }

    /// Cancel a live order, fully (`volume` = None) or partially.
    ///
    /// Returns false when the order is not live on that book.
    pub fn cancel_order(
        &mut self,
        book_id: BookId,
        order_id: OrderId,
        volume: Option<Decimal>,
        timestamp: Timestamp,
    ) -> bool {
        let Some(book) = self.books.get_mut(&book_id) else {
            return false;
        };
        let mut sink = self.clearing.settlement_sink();
        let cancelled = book.cancel_order(order_id, volume, timestamp, &mut sink);
        let events = sink.into_events();
        self.notify(&events);
        cancelled
    }

    /// Expire every due GTT order across all books. Returns the number of
    /// orders expired. Book iteration order is fixed, so replays expire in
    /// the same sequence.
    pub fn advance_time(&mut self, now: Timestamp) -> usize {
        let mut expired = 0;
        let mut events = Vec::new();
        for book in self.books.values_mut() {
            let mut sink = self.clearing.settlement_sink();
            expired += book.expire_due(now, &mut sink);
            events.extend(sink.into_events());
        }
        self.notify(&events);
        if expired > 0 {
            debug!(now, expired, "expired due orders");
        }
        expired
    }

    pub fn best_bid(&self, book_id: BookId) -> Option<Decimal> {
        self.books.get(&book_id).and_then(Book::best_bid)
    }

    pub fn best_ask(&self, book_id: BookId) -> Option<Decimal> {
        self.books.get(&book_id).and_then(Book::best_ask)
    }

    pub fn mid_price(&self, book_id: BookId) -> Option<Decimal> {
        self.books.get(&book_id).and_then(Book::mid_price)
    }

    pub fn balances(&self, agent: AgentId, book: BookId) -> Option<&accounting::Balances> {
        self.clearing.accounts().balances(agent, book)
    }

    /// Lossless checkpoint of every ledger.
    pub fn snapshot_accounts(&self) -> RegistrySnapshot {
        self.clearing.accounts().snapshot()
    }

    pub fn restore_accounts(&mut self, snapshot: &RegistrySnapshot) {
        *self.clearing.accounts_mut() = accounting::AccountRegistry::from_snapshot(snapshot);
    }

    fn notify(&mut self, events: &[BookEvent]) {
        for event in events {
            for observer in &mut self.observers {
                observer(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::cell::RefCell;
    use std::rc::Rc;
    use types::order::{OrderStatus, Side, StpFlag, TimeInForce};

    const SELLER: AgentId = AgentId::new(1);
    const BUYER: AgentId = AgentId::new(2);

    fn funded_exchange() -> (Exchange, BookId) {
        let params = ValidatorParams { min_order_size: dec!(0.01), ..ValidatorParams::default() };
        let mut exchange = Exchange::new(params, BookParams::default(), FeePolicy::zero());
        let book = exchange.add_book();
        for agent in [SELLER, BUYER] {
            exchange
                .open_account(
                    agent,
                    book,
                    &BalanceConfig { total: dec!(100), symbol: Some("BTC".into()) },
                    &BalanceConfig { total: dec!(10000), symbol: Some("USD".into()) },
                )
                .unwrap();
        }
        (exchange, book)
    }

    #[test]
    fn test_full_flow_moves_balances() {
        let (mut exchange, book) = funded_exchange();

        let report = exchange
            .place_limit_order(book, SELLER, &LimitOrderPayload::simple(Side::Sell, dec!(2), dec!(100), 1))
            .unwrap();
        assert_eq!(report.status, OrderStatus::Resting);
        assert_eq!(exchange.balances(SELLER, book).unwrap().base.reserved(), dec!(2));

        let report = exchange
            .place_market_order(book, BUYER, &MarketOrderPayload::simple(Side::Buy, dec!(2), 2))
            .unwrap();
        assert_eq!(report.status, OrderStatus::Filled);
        assert_eq!(report.trades.len(), 1);

        let seller = exchange.balances(SELLER, book).unwrap();
        assert_eq!(seller.base.total(), dec!(98));
        assert_eq!(seller.base.reserved(), dec!(0));
        assert_eq!(seller.quote.total(), dec!(10200));

        let buyer = exchange.balances(BUYER, book).unwrap();
        assert_eq!(buyer.base.total(), dec!(102));
        assert_eq!(buyer.quote.total(), dec!(9800));
        assert_eq!(buyer.quote.reserved(), dec!(0));
    }

    #[test]
    fn test_rejected_placement_mutates_nothing() {
        let (mut exchange, book) = funded_exchange();
        exchange
            .place_limit_order(book, SELLER, &LimitOrderPayload::simple(Side::Sell, dec!(1), dec!(100), 1))
            .unwrap();

        let accounts_before = exchange.snapshot_accounts();
        let book_before = exchange.book(book).unwrap().clone();

        let mut payload = LimitOrderPayload::simple(Side::Buy, dec!(5), dec!(100), 2);
        payload.time_in_force = TimeInForce::FOK;
        let err = exchange.place_limit_order(book, BUYER, &payload).unwrap_err();
        assert_eq!(err, RejectReason::TimeInForceUnsatisfiable);

        assert_eq!(exchange.snapshot_accounts(), accounts_before);
        assert_eq!(*exchange.book(book).unwrap(), book_before);
    }

    #[test]
    fn test_fok_against_only_own_liquidity_rejects_without_mutation() {
        let (mut exchange, book) = funded_exchange();
        exchange
            .place_limit_order(book, SELLER, &LimitOrderPayload::simple(Side::Sell, dec!(5), dec!(100), 1))
            .unwrap();

        let accounts_before = exchange.snapshot_accounts();
        let book_before = exchange.book(book).unwrap().clone();

        // All crossable depth is the agent's own ask; cancel-oldest would
        // cancel it instead of trading, so fill-or-kill cannot be honoured.
        let mut payload = LimitOrderPayload::simple(Side::Buy, dec!(5), dec!(100), 2);
        payload.time_in_force = TimeInForce::FOK;
        payload.stp = StpFlag::CancelOldest;
        let err = exchange.place_limit_order(book, SELLER, &payload).unwrap_err();
        assert_eq!(err, RejectReason::TimeInForceUnsatisfiable);

        assert_eq!(exchange.snapshot_accounts(), accounts_before);
        assert_eq!(*exchange.book(book).unwrap(), book_before);
    }

    #[test]
    fn test_cancel_oldest_self_cross_frees_old_reservation_keeps_new() {
        let (mut exchange, book) = funded_exchange();
        exchange
            .place_limit_order(book, SELLER, &LimitOrderPayload::simple(Side::Sell, dec!(5), dec!(100), 1))
            .unwrap();
        assert_eq!(exchange.balances(SELLER, book).unwrap().base.reserved(), dec!(5));

        let mut payload = LimitOrderPayload::simple(Side::Buy, dec!(5), dec!(100), 2);
        payload.stp = StpFlag::CancelOldest;
        let report = exchange.place_limit_order(book, SELLER, &payload).unwrap();
        assert_eq!(report.status, OrderStatus::Resting);
        assert!(report.trades.is_empty());

        // The cancelled ask gave its base back; the resting bid keeps its
        // full quote reservation.
        let seller = exchange.balances(SELLER, book).unwrap();
        assert_eq!(seller.base.reserved(), dec!(0));
        assert_eq!(seller.base.free(), dec!(100));
        assert_eq!(seller.quote.reserved(), dec!(500));
        assert_eq!(exchange.best_ask(book), None);
        assert_eq!(exchange.best_bid(book), Some(dec!(100)));
    }

    #[test]
    fn test_unknown_book_is_rejected() {
        let (mut exchange, _) = funded_exchange();
        let err = exchange
            .place_market_order(BookId::new(42), BUYER, &MarketOrderPayload::simple(Side::Buy, dec!(1), 1))
            .unwrap_err();
        assert_eq!(err, RejectReason::NonexistentBook);
    }

    #[test]
    fn test_cancel_frees_funds() {
        let (mut exchange, book) = funded_exchange();
        let report = exchange
            .place_limit_order(book, BUYER, &LimitOrderPayload::simple(Side::Buy, dec!(2), dec!(50), 1))
            .unwrap();
        assert_eq!(exchange.balances(BUYER, book).unwrap().quote.reserved(), dec!(100));

        assert!(exchange.cancel_order(book, report.order_id, None, 2));
        let buyer = exchange.balances(BUYER, book).unwrap();
        assert_eq!(buyer.quote.reserved(), dec!(0));
        assert_eq!(buyer.quote.free(), dec!(10000));

        // Already gone.
        assert!(!exchange.cancel_order(book, report.order_id, None, 3));
    }

    #[test]
    fn test_partial_fill_then_cancel_returns_remainder() {
        let (mut exchange, book) = funded_exchange();
        let report = exchange
            .place_limit_order(book, SELLER, &LimitOrderPayload::simple(Side::Sell, dec!(5), dec!(100), 1))
            .unwrap();
        exchange
            .place_market_order(book, BUYER, &MarketOrderPayload::simple(Side::Buy, dec!(2), 2))
            .unwrap();

        let seller = exchange.balances(SELLER, book).unwrap();
        assert_eq!(seller.base.reserved(), dec!(3));
        assert_eq!(seller.quote.total(), dec!(10200));

        assert!(exchange.cancel_order(book, report.order_id, None, 3));
        let seller = exchange.balances(SELLER, book).unwrap();
        assert_eq!(seller.base.reserved(), dec!(0));
        assert_eq!(seller.base.total(), dec!(98));
    }

    #[test]
    fn test_advance_time_expires_and_frees() {
        let (mut exchange, book) = funded_exchange();
        let mut payload = LimitOrderPayload::simple(Side::Sell, dec!(1), dec!(100), 1);
        payload.time_in_force = TimeInForce::GTT(1_000);
        exchange.place_limit_order(book, SELLER, &payload).unwrap();
        assert_eq!(exchange.balances(SELLER, book).unwrap().base.reserved(), dec!(1));

        assert_eq!(exchange.advance_time(999), 0);
        assert_eq!(exchange.advance_time(1_000), 1);
        let seller = exchange.balances(SELLER, book).unwrap();
        assert_eq!(seller.base.reserved(), dec!(0));
        assert_eq!(seller.base.free(), dec!(100));
        assert!(exchange.book(book).unwrap().is_empty());
    }

    #[test]
    fn test_observers_see_settled_events() {
        let (mut exchange, book) = funded_exchange();
        let seen: Rc<RefCell<Vec<String>>> = Rc::default();
        let sink = seen.clone();
        exchange.add_observer(move |event| {
            let kind = match event {
                BookEvent::Trade { .. } => "trade",
                BookEvent::Registered { .. } => "registered",
                BookEvent::Unregistered { .. } => "unregistered",
                BookEvent::Cancelled { .. } => "cancelled",
                BookEvent::DepthChanged { .. } => "depth",
            };
            sink.borrow_mut().push(kind.to_string());
        });

        exchange
            .place_limit_order(book, SELLER, &LimitOrderPayload::simple(Side::Sell, dec!(1), dec!(100), 1))
            .unwrap();
        exchange
            .place_market_order(book, BUYER, &MarketOrderPayload::simple(Side::Buy, dec!(1), 2))
            .unwrap();

        assert_eq!(
            *seen.borrow(),
            vec!["registered", "depth", "trade", "unregistered", "depth"]
        );
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let (mut exchange, book) = funded_exchange();
        exchange
            .place_limit_order(book, SELLER, &LimitOrderPayload::simple(Side::Sell, dec!(1), dec!(100), 1))
            .unwrap();
        let snapshot = exchange.snapshot_accounts();

        exchange.deposit(SELLER, book, Currency::Quote, dec!(500));
        assert_ne!(exchange.snapshot_accounts(), snapshot);

        exchange.restore_accounts(&snapshot);
        assert_eq!(exchange.snapshot_accounts(), snapshot);
    }

    proptest! {
        /// Unleveraged, fee-free trading never creates or destroys funds.
        #[test]
        fn prop_funds_conserved_without_fees(
            prices in proptest::collection::vec(90u32..110, 1..12),
            volumes in proptest::collection::vec(1u32..40, 1..12),
        ) {
            let (mut exchange, book) = funded_exchange();
            let mut ts = 0;
            for (i, (&p, &v)) in prices.iter().zip(volumes.iter()).enumerate() {
                ts += 1;
                let price = Decimal::from(p);
                let volume = Decimal::from(v) / dec!(10);
                let (agent, side) = if i % 2 == 0 {
                    (SELLER, Side::Sell)
                } else {
                    (BUYER, Side::Buy)
                };
                // Ignore rejections (insufficient funds) and keep going.
                let _ = exchange.place_limit_order(
                    book,
                    agent,
                    &LimitOrderPayload::simple(side, volume, price, ts),
                );
            }

            let seller = exchange.balances(SELLER, book).unwrap();
            let buyer = exchange.balances(BUYER, book).unwrap();
            prop_assert_eq!(seller.base.total() + buyer.base.total(), dec!(200));
            prop_assert_eq!(seller.quote.total() + buyer.quote.total(), dec!(20000));
        }
    }
}
