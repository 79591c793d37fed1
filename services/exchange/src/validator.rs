//! Pre-placement admission checks
//!
//! Every order is validated against the placing account's balances and the
//! current book state before any reservation is made; a rejection is a
//! strict no-op. On acceptance the validator reports the exact amount the
//! clearing layer must reserve (fee-inclusive, de-leveraged) and the base
//! volume the book will actually match.

use accounting::Balances;
use matching_engine::Book;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use types::errors::RejectReason;
use types::fee::FeeRates;
use types::ids::AgentId;
use types::numeric::{dec1p, round};
use types::order::{Currency, LimitOrderPayload, MarketOrderPayload, Side, StpFlag, TimeInForce};

/// Precision grid and hard limits applied to every placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorParams {
    pub price_decimals: u32,
    pub volume_decimals: u32,
    pub base_decimals: u32,
    pub quote_decimals: u32,
    pub min_order_size: Decimal,
    pub max_leverage: Decimal,
    pub max_loan: Decimal,
    pub max_open_orders: usize,
}

impl Default for ValidatorParams {
    fn default() -> Self {
        Self {
            price_decimals: 4,
            volume_decimals: 8,
            base_decimals: 8,
            quote_decimals: 4,
            min_order_size: dec!(0.0001),
            max_leverage: dec!(10),
            max_loan: dec!(1000000000),
            max_open_orders: 64,
        }
    }
}

/// Accepted-placement verdict
///
/// `amount` is what gets reserved on the committed side (quote for buys,
/// base for sells), `order_size` the own base volume the book matches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Validation {
    pub side: Side,
    pub amount: Decimal,
    pub leverage: Decimal,
    pub order_size: Decimal,
    /// The order would cross immediately at the current book state
    pub instant_trade: bool,
}

#[derive(Debug, Clone)]
pub struct OrderPlacementValidator {
    params: ValidatorParams,
}

impl OrderPlacementValidator {
    pub fn new(params: ValidatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ValidatorParams {
        &self.params
    }

    /// Validate a market order against balances and current depth.
    pub fn validate_market(
        &self,
        balances: &Balances,
        book: &Book,
        payload: &MarketOrderPayload,
        rates: FeeRates,
    ) -> Result<Validation, RejectReason> {
        let p = &self.params;
        if payload.leverage < Decimal::ZERO || payload.leverage > p.max_leverage {
            return Err(RejectReason::InvalidLeverage);
        }
        if payload.volume <= Decimal::ZERO {
            return Err(RejectReason::InvalidVolume);
        }

        let amount_decimals = self.amount_decimals(payload.currency);
        let volume = round(payload.volume, amount_decimals);
        let leverage = round(payload.leverage, p.volume_decimals);
        if volume <= Decimal::ZERO {
            return Err(RejectReason::InvalidVolume);
        }
        if payload.currency == Currency::Base && volume < p.min_order_size {
            return Err(RejectReason::MinimumOrderSize);
        }
        let total = round(volume * dec1p(leverage), amount_decimals);

        let depth = book.depth_snapshot(payload.side.opposite(), usize::MAX);
        if depth.is_empty() {
            return Err(RejectReason::EmptyBook);
        }

        match payload.side {
            Side::Buy => {
                // Fee-inclusive quote cost of collecting the requested exposure
                let mut cost = Decimal::ZERO;
                let order_size;
                match payload.currency {
                    Currency::Base => {
                        let mut wanted = total;
                        for &(price, level_volume) in &depth {
                            if wanted <= Decimal::ZERO {
                                break;
                            }
                            let used = level_volume.min(wanted);
                            cost += round(price * used * dec1p(rates.taker), p.quote_decimals);
                            wanted -= used;
                        }
                        order_size = volume;
                    }
                    Currency::Quote => {
                        let (spent, collected) = spendable(&depth, total, p.quote_decimals, p.base_decimals);
                        if collected < p.min_order_size {
                            return Err(RejectReason::MinimumOrderSize);
                        }
                        cost = round(spent * dec1p(rates.taker), p.quote_decimals);
                        order_size = round(collected / dec1p(leverage), p.base_decimals);
                    }
                }
                let amount = round(cost, p.quote_decimals);
                let instant_trade = amount > Decimal::ZERO;
                let amount = self.check_quote_funds(balances, amount, leverage)?;
                Ok(Validation { side: Side::Buy, amount, leverage, order_size, instant_trade })
            }
            Side::Sell => {
                let commit;
                let order_size;
                let instant_trade;
                match payload.currency {
                    Currency::Base => {
                        commit = total;
                        order_size = volume;
                        instant_trade = true;
                    }
                    Currency::Quote => {
                        let (_, collected) = spendable(&depth, total, p.quote_decimals, p.base_decimals);
                        if collected < p.min_order_size {
                            return Err(RejectReason::MinimumOrderSize);
                        }
                        commit = round(collected, p.base_decimals);
                        order_size = round(collected / dec1p(leverage), p.base_decimals);
                        instant_trade = commit > Decimal::ZERO;
                    }
                }
                let best_bid = depth[0].0;
                let amount = self.check_base_funds(balances, commit, leverage, best_bid)?;
                Ok(Validation { side: Side::Sell, amount, leverage, order_size, instant_trade })
            }
        }
    }

    /// Validate a limit order: sanity, admission (TIF, post-only, open-order
    /// cap), minimum size, then funds for the fee-inclusive commitment.
    pub fn validate_limit(
        &self,
        balances: &Balances,
        book: &Book,
        agent: AgentId,
        open_orders: usize,
        payload: &LimitOrderPayload,
        rates: FeeRates,
    ) -> Result<Validation, RejectReason> {
        let p = &self.params;
        if payload.leverage < Decimal::ZERO || payload.leverage > p.max_leverage {
            return Err(RejectReason::InvalidLeverage);
        }
        if payload.volume <= Decimal::ZERO {
            return Err(RejectReason::InvalidVolume);
        }
        if payload.price <= Decimal::ZERO {
            return Err(RejectReason::InvalidPrice);
        }
        if open_orders >= p.max_open_orders {
            return Err(RejectReason::ExceedingMaxOrders);
        }

        let amount_decimals = self.amount_decimals(payload.currency);
        let price = round(payload.price, p.price_decimals);
        let volume = round(payload.volume, amount_decimals);
        let leverage = round(payload.leverage, p.volume_decimals);
        if volume <= Decimal::ZERO {
            return Err(RejectReason::InvalidVolume);
        }
        if price <= Decimal::ZERO {
            return Err(RejectReason::InvalidPrice);
        }
        let total = round(volume * dec1p(leverage), amount_decimals);

        let min_ok = match payload.currency {
            Currency::Base => total >= p.min_order_size,
            Currency::Quote => round(total / price, p.volume_decimals) >= p.min_order_size,
        };
        if !min_ok {
            return Err(RejectReason::MinimumOrderSize);
        }

        // Depth reachable within the limit price, best first.
        let depth: Vec<(Decimal, Decimal)> = book
            .depth_snapshot(payload.side.opposite(), usize::MAX)
            .into_iter()
            .take_while(|&(level, _)| match payload.side {
                Side::Buy => level <= price,
                Side::Sell => level >= price,
            })
            .collect();
        let crossable: Decimal = depth.iter().map(|&(_, v)| v).sum();

        match payload.time_in_force {
            TimeInForce::IOC => {
                if payload.post_only {
                    return Err(RejectReason::PostOnlyWouldCross);
                }
                if crossable <= Decimal::ZERO {
                    return Err(RejectReason::TimeInForceUnsatisfiable);
                }
            }
            TimeInForce::FOK => {
                if payload.post_only {
                    return Err(RejectReason::PostOnlyWouldCross);
                }
                // Under cancel-oldest the agent's own resting orders are
                // cancelled on contact instead of trading, so they must not
                // count towards fill-or-kill depth.
                let reachable: Vec<(Decimal, Decimal)> = if payload.stp == StpFlag::CancelOldest {
                    book.depth_snapshot_excluding(payload.side.opposite(), agent)
                        .into_iter()
                        .take_while(|&(level, _)| match payload.side {
                            Side::Buy => level <= price,
                            Side::Sell => level >= price,
                        })
                        .collect()
                } else {
                    depth.clone()
                };
                let fillable = match payload.currency {
                    Currency::Base => {
                        let base: Decimal = reachable.iter().map(|&(_, v)| v).sum();
                        base >= total
                    }
                    Currency::Quote => {
                        let quote: Decimal = reachable
                            .iter()
                            .map(|&(level, v)| round(level * v, p.quote_decimals))
                            .sum();
                        quote >= total
                    }
                };
                if !fillable {
                    return Err(RejectReason::TimeInForceUnsatisfiable);
                }
            }
            TimeInForce::GTT(expiry) => {
                if expiry <= payload.timestamp {
                    return Err(RejectReason::TimeInForceUnsatisfiable);
                }
            }
            TimeInForce::GTC => {}
        }
        if payload.post_only && crossable > Decimal::ZERO {
            return Err(RejectReason::PostOnlyWouldCross);
        }

        match payload.side {
            Side::Buy => {
                let amount;
                let order_size;
                let instant_trade;
                match payload.currency {
                    Currency::Base => {
                        // Taker part costed level by level, maker remainder at
                        // the limit price with the maker rate.
                        let mut taker_cost = Decimal::ZERO;
                        let mut wanted = total;
                        for &(level, level_volume) in &depth {
                            if wanted <= Decimal::ZERO {
                                break;
                            }
                            let used = level_volume.min(wanted);
                            taker_cost += round(level * used * dec1p(rates.taker), p.quote_decimals);
                            wanted -= used;
                        }
                        let maker_cost =
                            round(price * wanted * dec1p(rates.maker), p.quote_decimals);
                        amount = round(taker_cost + maker_cost, p.quote_decimals);
                        order_size = volume;
                        instant_trade = wanted < total;
                    }
                    Currency::Quote => {
                        let (spent, collected) = spendable(&depth, total, p.quote_decimals, p.base_decimals);
                        let maker_quote = round(total - spent, p.quote_decimals);
                        let maker_volume = round(maker_quote / price, p.base_decimals);
                        amount = round(
                            spent * dec1p(rates.taker) + maker_quote * dec1p(rates.maker),
                            p.quote_decimals,
                        );
                        order_size =
                            round((collected + maker_volume) / dec1p(leverage), p.base_decimals);
                        instant_trade = collected > Decimal::ZERO;
                    }
                }
                let amount = self.check_quote_funds(balances, amount, leverage)?;
                Ok(Validation { side: Side::Buy, amount, leverage, order_size, instant_trade })
            }
            Side::Sell => {
                let commit;
                let order_size;
                let instant_trade;
                match payload.currency {
                    Currency::Base => {
                        commit = round(total, p.base_decimals);
                        order_size = volume;
                        instant_trade = crossable > Decimal::ZERO;
                    }
                    Currency::Quote => {
                        let (spent, collected) = spendable(&depth, total, p.quote_decimals, p.base_decimals);
                        let maker_volume = round((total - spent) / price, p.base_decimals);
                        commit = round(collected + maker_volume, p.base_decimals);
                        order_size = round(commit / dec1p(leverage), p.base_decimals);
                        instant_trade = collected > Decimal::ZERO;
                    }
                }
                let amount = self.check_base_funds(balances, commit, leverage, price)?;
                Ok(Validation { side: Side::Sell, amount, leverage, order_size, instant_trade })
            }
        }
    }

    fn amount_decimals(&self, currency: Currency) -> u32 {
        match currency {
            Currency::Base => self.params.volume_decimals,
            Currency::Quote => self.params.quote_decimals,
        }
    }

    /// De-leverage the quote commitment, cap the implied loan, and check
    /// the quote balance can cover the own share.
    fn check_quote_funds(
        &self,
        balances: &Balances,
        amount: Decimal,
        leverage: Decimal,
    ) -> Result<Decimal, RejectReason> {
        let p = &self.params;
        if leverage.is_zero() {
            if !balances.quote.can_reserve(amount) {
                return Err(RejectReason::InsufficientQuote);
            }
            return Ok(amount);
        }
        let amount = round(amount / dec1p(leverage), p.quote_decimals);
        if amount <= Decimal::ZERO {
            return Err(RejectReason::InvalidVolume);
        }
        if round(amount * leverage, p.quote_decimals) > p.max_loan {
            return Err(RejectReason::ExceedingLoan);
        }
        if !balances.quote.can_reserve(amount) {
            return Err(RejectReason::InsufficientQuote);
        }
        Ok(amount)
    }

    /// Same for the base commitment of a sell; the loan cap is checked in
    /// quote terms at `reference_price`.
    fn check_base_funds(
        &self,
        balances: &Balances,
        amount: Decimal,
        leverage: Decimal,
        reference_price: Decimal,
    ) -> Result<Decimal, RejectReason> {
        let p = &self.params;
        if leverage.is_zero() {
            if !balances.base.can_reserve(amount) {
                return Err(RejectReason::InsufficientBase);
            }
            return Ok(amount);
        }
        let amount = round(amount / dec1p(leverage), p.base_decimals);
        if amount <= Decimal::ZERO {
            return Err(RejectReason::InvalidVolume);
        }
        if round(amount * reference_price * leverage, p.quote_decimals) > p.max_loan {
            return Err(RejectReason::ExceedingLoan);
        }
        if !balances.base.can_reserve(amount) {
            return Err(RejectReason::InsufficientBase);
        }
        Ok(amount)
    }
}

/// Walk `depth` spending up to `budget` quote; returns (quote spent, base
/// collected).
fn spendable(
    depth: &[(Decimal, Decimal)],
    budget: Decimal,
    quote_decimals: u32,
    base_decimals: u32,
) -> (Decimal, Decimal) {
    let mut spent = Decimal::ZERO;
    let mut collected = Decimal::ZERO;
    for &(price, level_volume) in depth {
        if spent >= budget {
            break;
        }
        let level_quote = round(price * level_volume, quote_decimals);
        if spent + level_quote >= budget {
            let partial = budget - spent;
            spent = budget;
            collected += round(partial / price, base_decimals);
        } else {
            spent += level_quote;
            collected += level_volume;
        }
    }
    (spent, collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use accounting::Balance;
    use matching_engine::NullHandler;
    use types::ids::{AgentId, BookId};
    use types::order::OrderClientContext;

    /// The agent placing orders in these tests; liquidity rests under 99.
    const AGENT: AgentId = AgentId::new(7);

    fn params() -> ValidatorParams {
        ValidatorParams { min_order_size: dec!(0.01), ..ValidatorParams::default() }
    }

    fn balances(base: Decimal, quote: Decimal) -> Balances {
        Balances::new(
            Balance::new(base, Some("BTC".into()), 8).unwrap(),
            Balance::new(quote, Some("USD".into()), 4).unwrap(),
        )
    }

    fn book_with_ask(volume: Decimal, price: Decimal) -> Book {
        let mut book = Book::new(BookId::new(0), matching_engine::BookParams::default());
        let payload = LimitOrderPayload::simple(Side::Sell, volume, price, 0);
        book.place_limit_order(
            &payload,
            OrderClientContext::new(AgentId::new(99)),
            &mut NullHandler,
        );
        book
    }

    #[test]
    fn test_market_buy_reserves_fee_inclusive_cost() {
        let validator = OrderPlacementValidator::new(params());
        let book = book_with_ask(dec!(10), dec!(100));
        let rates = FeeRates { maker: dec!(0), taker: dec!(0.001) };

        let payload = MarketOrderPayload::simple(Side::Buy, dec!(2), 1);
        let v = validator
            .validate_market(&balances(dec!(0), dec!(1000)), &book, &payload, rates)
            .unwrap();

        // 2 * 100 * 1.001 = 200.2 quote
        assert_eq!(v.amount, dec!(200.2));
        assert_eq!(v.order_size, dec!(2));
        assert!(v.instant_trade);
    }

    #[test]
    fn test_market_buy_insufficient_quote() {
        let validator = OrderPlacementValidator::new(params());
        let book = book_with_ask(dec!(10), dec!(100));

        let payload = MarketOrderPayload::simple(Side::Buy, dec!(5), 1);
        let err = validator
            .validate_market(&balances(dec!(0), dec!(100)), &book, &payload, FeeRates::zero())
            .unwrap_err();
        assert_eq!(err, RejectReason::InsufficientQuote);
    }

    #[test]
    fn test_market_order_against_empty_book() {
        let validator = OrderPlacementValidator::new(params());
        let book = Book::new(BookId::new(0), matching_engine::BookParams::default());

        let payload = MarketOrderPayload::simple(Side::Buy, dec!(1), 1);
        let err = validator
            .validate_market(&balances(dec!(0), dec!(1000)), &book, &payload, FeeRates::zero())
            .unwrap_err();
        assert_eq!(err, RejectReason::EmptyBook);
    }

    #[test]
    fn test_quote_denominated_market_buy_converts_to_base() {
        let validator = OrderPlacementValidator::new(params());
        let book = book_with_ask(dec!(10), dec!(100));

        let mut payload = MarketOrderPayload::simple(Side::Buy, dec!(300), 1);
        payload.currency = Currency::Quote;
        let v = validator
            .validate_market(&balances(dec!(0), dec!(1000)), &book, &payload, FeeRates::zero())
            .unwrap();
        assert_eq!(v.order_size, dec!(3));
        assert_eq!(v.amount, dec!(300));
    }

    #[test]
    fn test_limit_buy_mixes_taker_and_maker_cost() {
        let validator = OrderPlacementValidator::new(params());
        let book = book_with_ask(dec!(1), dec!(100));
        let rates = FeeRates { maker: dec!(0.001), taker: dec!(0.002) };

        // BUY 3 @ 100: 1 crosses (taker), 2 rest (maker)
        let payload = LimitOrderPayload::simple(Side::Buy, dec!(3), dec!(100), 1);
        let v = validator
            .validate_limit(&balances(dec!(0), dec!(1000)), &book, AGENT, 0, &payload, rates)
            .unwrap();
        // 1*100*1.002 + 2*100*1.001 = 100.2 + 200.2
        assert_eq!(v.amount, dec!(300.4));
        assert!(v.instant_trade);
    }

    #[test]
    fn test_limit_sell_commits_base_volume() {
        let validator = OrderPlacementValidator::new(params());
        let book = Book::new(BookId::new(0), matching_engine::BookParams::default());

        let payload = LimitOrderPayload::simple(Side::Sell, dec!(4), dec!(100), 1);
        let v = validator
            .validate_limit(&balances(dec!(10), dec!(0)), &book, AGENT, 0, &payload, FeeRates::zero())
            .unwrap();
        assert_eq!(v.amount, dec!(4));
        assert_eq!(v.order_size, dec!(4));
        assert!(!v.instant_trade);
    }

    #[test]
    fn test_post_only_rejected_when_crossing() {
        let validator = OrderPlacementValidator::new(params());
        let book = book_with_ask(dec!(1), dec!(100));

        let mut payload = LimitOrderPayload::simple(Side::Buy, dec!(1), dec!(100), 1);
        payload.post_only = true;
        let err = validator
            .validate_limit(&balances(dec!(0), dec!(1000)), &book, AGENT, 0, &payload, FeeRates::zero())
            .unwrap_err();
        assert_eq!(err, RejectReason::PostOnlyWouldCross);

        payload.price = dec!(99);
        assert!(validator
            .validate_limit(&balances(dec!(0), dec!(1000)), &book, AGENT, 0, &payload, FeeRates::zero())
            .is_ok());
    }

    #[test]
    fn test_fok_requires_full_fillability() {
        let validator = OrderPlacementValidator::new(params());
        let book = book_with_ask(dec!(2), dec!(100));

        let mut payload = LimitOrderPayload::simple(Side::Buy, dec!(3), dec!(100), 1);
        payload.time_in_force = TimeInForce::FOK;
        let err = validator
            .validate_limit(&balances(dec!(0), dec!(1000)), &book, AGENT, 0, &payload, FeeRates::zero())
            .unwrap_err();
        assert_eq!(err, RejectReason::TimeInForceUnsatisfiable);

        payload.volume = dec!(2);
        assert!(validator
            .validate_limit(&balances(dec!(0), dec!(1000)), &book, AGENT, 0, &payload, FeeRates::zero())
            .is_ok());
    }

    #[test]
    fn test_fok_cancel_oldest_ignores_own_resting_depth() {
        let validator = OrderPlacementValidator::new(params());
        let mut book = book_with_ask(dec!(2), dec!(100));
        let own_ask = LimitOrderPayload::simple(Side::Sell, dec!(3), dec!(100), 2);
        book.place_limit_order(&own_ask, OrderClientContext::new(AGENT), &mut NullHandler);

        // Five units rest at 100, but three belong to the placing agent and
        // would be cancelled on contact, not traded.
        let mut payload = LimitOrderPayload::simple(Side::Buy, dec!(5), dec!(100), 3);
        payload.time_in_force = TimeInForce::FOK;
        payload.stp = StpFlag::CancelOldest;
        let err = validator
            .validate_limit(&balances(dec!(0), dec!(1000)), &book, AGENT, 0, &payload, FeeRates::zero())
            .unwrap_err();
        assert_eq!(err, RejectReason::TimeInForceUnsatisfiable);

        // The two units resting under another agent are still fillable.
        payload.volume = dec!(2);
        assert!(validator
            .validate_limit(&balances(dec!(0), dec!(1000)), &book, AGENT, 0, &payload, FeeRates::zero())
            .is_ok());
    }

    #[test]
    fn test_ioc_needs_a_crossable_level() {
        let validator = OrderPlacementValidator::new(params());
        let book = book_with_ask(dec!(1), dec!(100));

        let mut payload = LimitOrderPayload::simple(Side::Buy, dec!(1), dec!(99), 1);
        payload.time_in_force = TimeInForce::IOC;
        let err = validator
            .validate_limit(&balances(dec!(0), dec!(1000)), &book, AGENT, 0, &payload, FeeRates::zero())
            .unwrap_err();
        assert_eq!(err, RejectReason::TimeInForceUnsatisfiable);
    }

    #[test]
    fn test_gtt_expiry_must_be_in_the_future() {
        let validator = OrderPlacementValidator::new(params());
        let book = Book::new(BookId::new(0), matching_engine::BookParams::default());

        let mut payload = LimitOrderPayload::simple(Side::Sell, dec!(1), dec!(100), 500);
        payload.time_in_force = TimeInForce::GTT(500);
        let err = validator
            .validate_limit(&balances(dec!(10), dec!(0)), &book, AGENT, 0, &payload, FeeRates::zero())
            .unwrap_err();
        assert_eq!(err, RejectReason::TimeInForceUnsatisfiable);
    }

    #[test]
    fn test_open_order_cap() {
        let validator = OrderPlacementValidator::new(ValidatorParams {
            max_open_orders: 2,
            ..params()
        });
        let book = Book::new(BookId::new(0), matching_engine::BookParams::default());

        let payload = LimitOrderPayload::simple(Side::Sell, dec!(1), dec!(100), 1);
        let err = validator
            .validate_limit(&balances(dec!(10), dec!(0)), &book, AGENT, 2, &payload, FeeRates::zero())
            .unwrap_err();
        assert_eq!(err, RejectReason::ExceedingMaxOrders);
    }

    #[test]
    fn test_leverage_bounds_and_loan_cap() {
        let validator = OrderPlacementValidator::new(ValidatorParams {
            max_leverage: dec!(5),
            max_loan: dec!(500),
            ..params()
        });
        let book = Book::new(BookId::new(0), matching_engine::BookParams::default());

        let mut payload = LimitOrderPayload::simple(Side::Buy, dec!(1), dec!(100), 1);
        payload.leverage = dec!(6);
        assert_eq!(
            validator
                .validate_limit(&balances(dec!(0), dec!(1000)), &book, AGENT, 0, &payload, FeeRates::zero())
                .unwrap_err(),
            RejectReason::InvalidLeverage
        );

        // 1 own volume at 4x leverage exposes 5 base = 500 quote: own share
        // 100, loan 400 ≤ cap. Ten times that breaches the cap.
        payload.leverage = dec!(4);
        assert!(validator
            .validate_limit(&balances(dec!(0), dec!(1000)), &book, AGENT, 0, &payload, FeeRates::zero())
            .is_ok());
        payload.volume = dec!(10);
        assert_eq!(
            validator
                .validate_limit(&balances(dec!(0), dec!(1000)), &book, AGENT, 0, &payload, FeeRates::zero())
                .unwrap_err(),
            RejectReason::ExceedingLoan
        );
    }

    #[test]
    fn test_minimum_order_size() {
        let validator = OrderPlacementValidator::new(params());
        let book = Book::new(BookId::new(0), matching_engine::BookParams::default());

        let payload = LimitOrderPayload::simple(Side::Sell, dec!(0.001), dec!(100), 1);
        assert_eq!(
            validator
                .validate_limit(&balances(dec!(10), dec!(0)), &book, AGENT, 0, &payload, FeeRates::zero())
                .unwrap_err(),
            RejectReason::MinimumOrderSize
        );
    }
}
