//! Reservation and settlement against the balance ledger
//!
//! `ClearingManager` validates each placement, reserves the committed
//! amount under the id the book is about to assign, and settles the
//! resulting book events through the ledger's mutation entry points. Fees
//! are charged on quote notional and destroyed (exchange revenue is not an
//! account).

use accounting::{Account, AccountRegistry};
use matching_engine::{Book, BookEvent, BookEventHandler, TradeSideInfo};
use rust_decimal::Decimal;
use tracing::debug;
use types::errors::RejectReason;
use types::fee::FeePolicy;
use types::ids::{AgentId, BookId, OrderId};
use types::numeric::{dec1p, round};
use types::order::{Currency, LimitOrderPayload, MarketOrderPayload, Side};
use types::trade::Trade;

use crate::validator::{OrderPlacementValidator, Validation, ValidatorParams};

pub struct ClearingManager {
    accounts: AccountRegistry,
    fee_policy: FeePolicy,
    validator: OrderPlacementValidator,
}

impl ClearingManager {
    pub fn new(params: ValidatorParams, fee_policy: FeePolicy) -> Self {
        Self {
            accounts: AccountRegistry::new(params.base_decimals, params.quote_decimals),
            fee_policy,
            validator: OrderPlacementValidator::new(params),
        }
    }

    pub fn accounts(&self) -> &AccountRegistry {
        &self.accounts
    }

    pub fn accounts_mut(&mut self) -> &mut AccountRegistry {
        &mut self.accounts
    }

    pub fn fee_policy(&self) -> &FeePolicy {
        &self.fee_policy
    }

    pub fn validator(&self) -> &OrderPlacementValidator {
        &self.validator
    }

    /// Validate a market order and reserve its commitment.
    ///
    /// Returns the payload normalized to own base volume, ready for the
    /// book. On rejection nothing is mutated.
    pub fn admit_market_order(
        &mut self,
        book: &Book,
        agent: AgentId,
        payload: &MarketOrderPayload,
    ) -> Result<(MarketOrderPayload, Validation), RejectReason> {
        let account = self.accounts.account(agent).ok_or(RejectReason::NonexistentAccount)?;
        let rates = self.fee_policy.rates_for(account.traded_volume());
        let balances = account.holdings(book.id()).ok_or(RejectReason::NonexistentAccount)?;

        let validation = self.validator.validate_market(balances, book, payload, rates)?;
        self.reserve(agent, book.id(), book.next_order_id(), &validation)?;

        let normalized = MarketOrderPayload {
            volume: validation.order_size,
            currency: Currency::Base,
            ..payload.clone()
        };
        Ok((normalized, validation))
    }

    /// Limit-order counterpart of [`Self::admit_market_order`].
    pub fn admit_limit_order(
        &mut self,
        book: &Book,
        agent: AgentId,
        payload: &LimitOrderPayload,
    ) -> Result<(LimitOrderPayload, Validation), RejectReason> {
        let account = self.accounts.account(agent).ok_or(RejectReason::NonexistentAccount)?;
        let rates = self.fee_policy.rates_for(account.traded_volume());
        let balances = account.holdings(book.id()).ok_or(RejectReason::NonexistentAccount)?;
        let open_orders = book.open_orders(agent);

        let validation = self.validator.validate_limit(balances, book, agent, open_orders, payload, rates)?;
        self.reserve(agent, book.id(), book.next_order_id(), &validation)?;

        let normalized = LimitOrderPayload {
            volume: validation.order_size,
            currency: Currency::Base,
            ..payload.clone()
        };
        Ok((normalized, validation))
    }

    /// Event sink that settles everything the book emits against the
    /// ledger. Holds no reference to the book itself.
    pub fn settlement_sink(&mut self) -> SettlementSink<'_> {
        let base_decimals = self.accounts.base_decimals();
        let quote_decimals = self.accounts.quote_decimals();
        SettlementSink {
            registry: &mut self.accounts,
            fee_policy: &self.fee_policy,
            base_decimals,
            quote_decimals,
            events: Vec::new(),
        }
    }

    fn reserve(
        &mut self,
        agent: AgentId,
        book_id: BookId,
        order_id: OrderId,
        validation: &Validation,
    ) -> Result<(), RejectReason> {
        let balances = self
            .accounts
            .balances_mut(agent, book_id)
            .ok_or(RejectReason::NonexistentAccount)?;
        let (balance, insufficient) = match validation.side {
            Side::Buy => (&mut balances.quote, RejectReason::InsufficientQuote),
            Side::Sell => (&mut balances.base, RejectReason::InsufficientBase),
        };
        balance
            .make_reservation(order_id, validation.amount, book_id)
            .map_err(|_| insufficient)?;
        debug!(
            agent = %agent,
            book = %book_id,
            order = %order_id,
            amount = %validation.amount,
            side = ?validation.side,
            "reservation made"
        );
        Ok(())
    }
}

/// Settles book events into the ledger as they are emitted.
///
/// The buy side of a trade consumes its quote reservation (fee-inclusive)
/// and is credited base; the sell side consumes its base reservation and
/// is credited quote net of its fee. Leveraged legs settle the own
/// (de-leveraged) share only. Cancellations release the matching slice of
/// the reservation back into `free`.
pub struct SettlementSink<'a> {
    registry: &'a mut AccountRegistry,
    fee_policy: &'a FeePolicy,
    base_decimals: u32,
    quote_decimals: u32,
    events: Vec<BookEvent>,
}

impl SettlementSink<'_> {
    /// Events witnessed, in emission order.
    pub fn into_events(self) -> Vec<BookEvent> {
        self.events
    }

    fn settle_trade(&mut self, trade: &Trade, taker: &TradeSideInfo, maker: &TradeSideInfo) {
        self.settle_side(trade, taker, true);
        self.settle_side(trade, maker, false);

        let notional = round(trade.volume * trade.price, self.quote_decimals);
        for agent in [taker.agent_id, maker.agent_id] {
            self.registry
                .account_mut(agent)
                .unwrap_or_else(|| {
                    panic!("BOOK {} | no account for agent #{agent} in trade #{}", trade.book_id, trade.trade_id)
                })
                .record_traded_volume(notional);
        }
    }

    fn settle_side(&mut self, trade: &Trade, info: &TradeSideInfo, is_taker: bool) {
        let rolling = self
            .registry
            .account(info.agent_id)
            .map(Account::traded_volume)
            .unwrap_or_else(|| {
                panic!(
                    "BOOK {} | no account for agent #{} in trade #{}",
                    trade.book_id, info.agent_id, trade.trade_id
                )
            });
        let rates = self.fee_policy.rates_for(rolling);
        let rate = if is_taker { rates.taker } else { rates.maker };
        let own = dec1p(info.leverage);

        let balances = self
            .registry
            .balances_mut(info.agent_id, trade.book_id)
            .unwrap_or_else(|| {
                panic!(
                    "BOOK {} | no balances for agent #{} in trade #{}",
                    trade.book_id, info.agent_id, trade.trade_id
                )
            });

        match info.side {
            Side::Buy => {
                let slice = if info.fully_filled {
                    None
                } else {
                    let held = balances.quote.reservation(info.order_id).unwrap_or_default();
                    let cost =
                        round(trade.volume * trade.price * dec1p(rate) / own, self.quote_decimals);
                    Some(cost.min(held))
                };
                let voided = balances
                    .quote
                    .void_reservation(info.order_id, trade.book_id, slice)
                    .unwrap_or_else(|e| {
                        panic!("BOOK {} | settling trade #{}: {e}", trade.book_id, trade.trade_id)
                    });
                let credit = round(trade.volume / own, self.base_decimals);
                balances.base.deposit(credit);
                debug!(
                    book = %trade.book_id,
                    trade = %trade.trade_id,
                    agent = %info.agent_id,
                    order = %info.order_id,
                    %voided,
                    %credit,
                    "buy leg settled"
                );
            }
            Side::Sell => {
                let slice = if info.fully_filled {
                    None
                } else {
                    let held = balances.base.reservation(info.order_id).unwrap_or_default();
                    Some(round(trade.volume / own, self.base_decimals).min(held))
                };
                let voided = balances
                    .base
                    .void_reservation(info.order_id, trade.book_id, slice)
                    .unwrap_or_else(|e| {
                        panic!("BOOK {} | settling trade #{}: {e}", trade.book_id, trade.trade_id)
                    });
                let proceeds = round(
                    trade.volume * trade.price * (Decimal::ONE - rate) / own,
                    self.quote_decimals,
                );
                balances.quote.deposit(proceeds);
                debug!(
                    book = %trade.book_id,
                    trade = %trade.trade_id,
                    agent = %info.agent_id,
                    order = %info.order_id,
                    %voided,
                    %proceeds,
                    "sell leg settled"
                );
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn release_cancelled(
        &mut self,
        book_id: BookId,
        order_id: OrderId,
        agent_id: AgentId,
        side: Side,
        price: Option<Decimal>,
        cancelled_volume: Decimal,
        remaining_volume: Decimal,
    ) {
        let rolling = self
            .registry
            .account(agent_id)
            .map(Account::traded_volume)
            .unwrap_or_else(|| {
                panic!("BOOK {book_id} | no account for agent #{agent_id} cancelling order #{order_id}")
            });
        let maker_rate = self.fee_policy.rates_for(rolling).maker;

        let balances = self.registry.balances_mut(agent_id, book_id).unwrap_or_else(|| {
            panic!("BOOK {book_id} | no balances for agent #{agent_id} cancelling order #{order_id}")
        });

        match side {
            Side::Buy => {
                let amount = if remaining_volume.is_zero() {
                    None
                } else {
                    // Partial cancels always come from a resting limit order,
                    // so a price is present; its reserved share carries the
                    // maker rate.
                    let level = price.unwrap_or_default();
                    let held = balances.quote.reservation(order_id).unwrap_or_default();
                    Some(
                        round(level * cancelled_volume * dec1p(maker_rate), self.quote_decimals)
                            .min(held),
                    )
                };
                balances.quote.try_free_reservation(order_id, book_id, amount);
            }
            Side::Sell => {
                let amount = if remaining_volume.is_zero() {
                    None
                } else {
                    let held = balances.base.reservation(order_id).unwrap_or_default();
                    Some(round(cancelled_volume, self.base_decimals).min(held))
                };
                balances.base.try_free_reservation(order_id, book_id, amount);
            }
        }
    }

    /// Final mop-up once an order has left the book: any residual
    /// reservation (rounding or fee-rate drift) returns to `free`.
    fn release_residual(&mut self, book_id: BookId, order_id: OrderId, agent_id: AgentId) {
        if let Some(balances) = self.registry.balances_mut(agent_id, book_id) {
            balances.base.try_free_reservation(order_id, book_id, None);
            balances.quote.try_free_reservation(order_id, book_id, None);
        }
    }
}

impl BookEventHandler for SettlementSink<'_> {
    fn on_event(&mut self, event: &BookEvent) {
        match event {
            BookEvent::Trade { trade, taker, maker } => self.settle_trade(trade, taker, maker),
            BookEvent::Cancelled {
                book_id,
                order_id,
                agent_id,
                side,
                price,
                cancelled_volume,
                remaining_volume,
                ..
            } => self.release_cancelled(
                *book_id,
                *order_id,
                *agent_id,
                *side,
                *price,
                *cancelled_volume,
                *remaining_volume,
            ),
            BookEvent::Unregistered { book_id, order_id, agent_id } => {
                self.release_residual(*book_id, *order_id, *agent_id)
            }
            BookEvent::Registered { .. } | BookEvent::DepthChanged { .. } => {}
        }
        self.events.push(event.clone());
    }
}
