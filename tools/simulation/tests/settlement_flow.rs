//! Cross-crate settlement scenarios driven through the exchange facade

use accounting::BalanceConfig;
use exchange::{Exchange, ValidatorParams};
use matching_engine::BookParams;
use rust_decimal_macros::dec;
use types::fee::{FeePolicy, FeeRates};
use types::ids::AgentId;
use types::order::{
    Currency, LimitOrderPayload, MarketOrderPayload, OrderStatus, Side, TimeInForce,
};

const MAKER: AgentId = AgentId::new(1);
const TAKER: AgentId = AgentId::new(2);

fn exchange_with(fee_policy: FeePolicy) -> (Exchange, types::ids::BookId) {
    let params = ValidatorParams { min_order_size: dec!(0.01), ..ValidatorParams::default() };
    let mut exchange = Exchange::new(params, BookParams::default(), fee_policy);
    let book = exchange.add_book();
    for agent in [MAKER, TAKER] {
        exchange
            .open_account(
                agent,
                book,
                &BalanceConfig { total: dec!(50), symbol: Some("BTC".into()) },
                &BalanceConfig { total: dec!(100000), symbol: Some("USD".into()) },
            )
            .unwrap();
    }
    (exchange, book)
}

#[test]
fn multi_level_sweep_settles_each_fill_at_its_price() {
    let (mut exchange, book) = exchange_with(FeePolicy::zero());
    for (i, price) in [dec!(100), dec!(101), dec!(102)].into_iter().enumerate() {
        exchange
            .place_limit_order(
                book,
                MAKER,
                &LimitOrderPayload::simple(Side::Sell, dec!(1), price, i as u64),
            )
            .unwrap();
    }

    let report = exchange
        .place_market_order(book, TAKER, &MarketOrderPayload::simple(Side::Buy, dec!(3), 10))
        .unwrap();
    assert_eq!(report.status, OrderStatus::Filled);
    assert_eq!(report.trades.len(), 3);
    assert_eq!(report.processed_quote, dec!(303));

    let maker = exchange.balances(MAKER, book).unwrap();
    assert_eq!(maker.quote.total(), dec!(100303));
    assert_eq!(maker.base.total(), dec!(47));
    assert_eq!(maker.base.reserved(), dec!(0));

    let taker = exchange.balances(TAKER, book).unwrap();
    assert_eq!(taker.quote.total(), dec!(99697));
    assert_eq!(taker.base.total(), dec!(53));
}

#[test]
fn tiered_fees_follow_rolling_volume() {
    let tiers = vec![
        types::fee::FeeTier {
            volume_threshold: dec!(0),
            maker_rate: dec!(0.01),
            taker_rate: dec!(0.02),
        },
        types::fee::FeeTier {
            volume_threshold: dec!(100),
            maker_rate: dec!(0),
            taker_rate: dec!(0),
        },
    ];
    let (mut exchange, book) = exchange_with(FeePolicy::new(tiers));

    // First trade (100 quote) pays tier-0 rates.
    exchange
        .place_limit_order(book, MAKER, &LimitOrderPayload::simple(Side::Sell, dec!(1), dec!(100), 1))
        .unwrap();
    exchange
        .place_market_order(book, TAKER, &MarketOrderPayload::simple(Side::Buy, dec!(1), 2))
        .unwrap();
    let taker = exchange.balances(TAKER, book).unwrap();
    assert_eq!(taker.quote.total(), dec!(99898));

    // Both agents have now reached the 100 threshold; the second trade is free.
    exchange
        .place_limit_order(book, MAKER, &LimitOrderPayload::simple(Side::Sell, dec!(1), dec!(100), 3))
        .unwrap();
    exchange
        .place_market_order(book, TAKER, &MarketOrderPayload::simple(Side::Buy, dec!(1), 4))
        .unwrap();
    let taker = exchange.balances(TAKER, book).unwrap();
    assert_eq!(taker.quote.total(), dec!(99798));
    let maker = exchange.balances(MAKER, book).unwrap();
    assert_eq!(maker.quote.total(), dec!(100199));
}

#[test]
fn leveraged_buy_commits_own_share_only() {
    let (mut exchange, book) = exchange_with(FeePolicy::zero());
    exchange
        .place_limit_order(book, MAKER, &LimitOrderPayload::simple(Side::Sell, dec!(4), dec!(100), 1))
        .unwrap();

    // 1 own volume at 3x leverage: 4 units of exposure, 100 quote committed.
    let mut payload = MarketOrderPayload::simple(Side::Buy, dec!(1), 2);
    payload.leverage = dec!(3);
    let report = exchange.place_market_order(book, TAKER, &payload).unwrap();
    assert_eq!(report.status, OrderStatus::Filled);
    assert_eq!(report.trades[0].volume, dec!(4));

    let taker = exchange.balances(TAKER, book).unwrap();
    assert_eq!(taker.quote.total(), dec!(99900));
    assert_eq!(taker.quote.reserved(), dec!(0));
    assert_eq!(taker.base.total(), dec!(51));
}

#[test]
fn quote_denominated_buy_converts_through_depth() {
    let (mut exchange, book) = exchange_with(FeePolicy::zero());
    exchange
        .place_limit_order(book, MAKER, &LimitOrderPayload::simple(Side::Sell, dec!(2), dec!(100), 1))
        .unwrap();

    let mut payload = MarketOrderPayload::simple(Side::Buy, dec!(150), 2);
    payload.currency = Currency::Quote;
    let report = exchange.place_market_order(book, TAKER, &payload).unwrap();
    assert_eq!(report.status, OrderStatus::Filled);
    assert_eq!(report.trades[0].volume, dec!(1.5));

    let taker = exchange.balances(TAKER, book).unwrap();
    assert_eq!(taker.base.total(), dec!(51.5));
    assert_eq!(taker.quote.total(), dec!(99850));
}

#[test]
fn expiry_and_cancel_leave_no_residue() {
    let (mut exchange, book) = exchange_with(FeePolicy::flat(FeeRates {
        maker: dec!(0.001),
        taker: dec!(0.002),
    }));

    let mut gtt = LimitOrderPayload::simple(Side::Buy, dec!(1), dec!(90), 1);
    gtt.time_in_force = TimeInForce::GTT(100);
    exchange.place_limit_order(book, TAKER, &gtt).unwrap();

    let cancel_me = exchange
        .place_limit_order(book, TAKER, &LimitOrderPayload::simple(Side::Buy, dec!(2), dec!(95), 2))
        .unwrap();

    assert!(exchange.cancel_order(book, cancel_me.order_id, None, 3));
    assert_eq!(exchange.advance_time(100), 1);

    let taker = exchange.balances(TAKER, book).unwrap();
    assert_eq!(taker.quote.reserved(), dec!(0));
    assert_eq!(taker.quote.free(), dec!(100000));
    assert_eq!(taker.base.total(), dec!(50));
}
