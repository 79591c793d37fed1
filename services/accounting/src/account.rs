//! Accounts: per-agent, per-book balance pairs
//!
//! Every agent holds one [`Balances`] pair (base + quote) per book they
//! trade on. The registry is the single owner of all ledgers; everything
//! else borrows.

use crate::balance::{Balance, BalanceConfig, BalanceSnapshot, LedgerError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use types::ids::{AgentId, BookId};
use types::order::Currency;

/// Base/quote balance pair for one agent on one book
#[derive(Debug, Clone, PartialEq)]
pub struct Balances {
    pub base: Balance,
    pub quote: Balance,
}

impl Balances {
    pub fn new(base: Balance, quote: Balance) -> Self {
        Self { base, quote }
    }

    pub fn balance(&self, currency: Currency) -> &Balance {
        match currency {
            Currency::Base => &self.base,
            Currency::Quote => &self.quote,
        }
    }

    pub fn balance_mut(&mut self, currency: Currency) -> &mut Balance {
        match currency {
            Currency::Base => &mut self.base,
            Currency::Quote => &mut self.quote,
        }
    }

    pub fn snapshot(&self) -> BalancesSnapshot {
        BalancesSnapshot { base: self.base.snapshot(), quote: self.quote.snapshot() }
    }

    pub fn from_snapshot(snapshot: &BalancesSnapshot) -> Self {
        Self {
            base: Balance::from_snapshot(&snapshot.base),
            quote: Balance::from_snapshot(&snapshot.quote),
        }
    }
}

/// Checkpoint image of a [`Balances`] pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancesSnapshot {
    pub base: BalanceSnapshot,
    pub quote: BalanceSnapshot,
}

/// One simulated agent's holdings across books
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub agent_id: AgentId,
    holdings: HashMap<BookId, Balances>,
    /// Rolling quote notional traded, drives fee tier selection
    traded_volume: Decimal,
}

impl Account {
    pub fn new(agent_id: AgentId) -> Self {
        Self { agent_id, holdings: HashMap::new(), traded_volume: Decimal::ZERO }
    }

    pub fn holdings(&self, book: BookId) -> Option<&Balances> {
        self.holdings.get(&book)
    }

    pub fn holdings_mut(&mut self, book: BookId) -> Option<&mut Balances> {
        self.holdings.get_mut(&book)
    }

    pub fn books(&self) -> impl Iterator<Item = (&BookId, &Balances)> {
        self.holdings.iter()
    }

    pub fn traded_volume(&self) -> Decimal {
        self.traded_volume
    }

    pub fn record_traded_volume(&mut self, notional: Decimal) {
        self.traded_volume += notional;
    }
}

/// Owner of every ledger in the system
///
/// Keyed by agent, then book. Rounding precision is global: base balances
/// round to `base_decimals`, quote balances to `quote_decimals`.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRegistry {
    accounts: HashMap<AgentId, Account>,
    base_decimals: u32,
    quote_decimals: u32,
}

impl AccountRegistry {
    pub fn new(base_decimals: u32, quote_decimals: u32) -> Self {
        Self { accounts: HashMap::new(), base_decimals, quote_decimals }
    }

    /// Open (or extend) an account with a balance pair on the given book.
    pub fn open(
        &mut self,
        agent: AgentId,
        book: BookId,
        base: &BalanceConfig,
        quote: &BalanceConfig,
    ) -> Result<(), LedgerError> {
        let balances = Balances::new(
            Balance::from_config(base, self.base_decimals)?,
            Balance::from_config(quote, self.quote_decimals)?,
        );
        let account = self.accounts.entry(agent).or_insert_with(|| Account::new(agent));
        account.holdings.insert(book, balances);
        debug!(agent = %agent, book = %book, "account opened");
        Ok(())
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        self.accounts.contains_key(&agent)
    }

    pub fn account(&self, agent: AgentId) -> Option<&Account> {
        self.accounts.get(&agent)
    }

    pub fn account_mut(&mut self, agent: AgentId) -> Option<&mut Account> {
        self.accounts.get_mut(&agent)
    }

    pub fn balances(&self, agent: AgentId, book: BookId) -> Option<&Balances> {
        self.accounts.get(&agent).and_then(|a| a.holdings(book))
    }

    pub fn balances_mut(&mut self, agent: AgentId, book: BookId) -> Option<&mut Balances> {
        self.accounts.get_mut(&agent).and_then(|a| a.holdings_mut(book))
    }

    /// Credit an agent's balance on a book.
    ///
    /// Returns false when the agent has no holdings there.
    pub fn deposit(
        &mut self,
        agent: AgentId,
        book: BookId,
        currency: Currency,
        amount: Decimal,
    ) -> bool {
        match self.balances_mut(agent, book) {
            Some(balances) => {
                balances.balance_mut(currency).deposit(amount);
                true
            }
            None => false,
        }
    }

    pub fn agents(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn base_decimals(&self) -> u32 {
        self.base_decimals
    }

    pub fn quote_decimals(&self) -> u32 {
        self.quote_decimals
    }

    /// Lossless checkpoint of every ledger, deterministically ordered.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            base_decimals: self.base_decimals,
            quote_decimals: self.quote_decimals,
            accounts: self
                .accounts
                .values()
                .map(|account| {
                    (
                        account.agent_id,
                        AccountSnapshot {
                            traded_volume: account.traded_volume,
                            holdings: account
                                .holdings
                                .iter()
                                .map(|(book, balances)| (*book, balances.snapshot()))
                                .collect(),
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn from_snapshot(snapshot: &RegistrySnapshot) -> Self {
        let mut registry = Self::new(snapshot.base_decimals, snapshot.quote_decimals);
        for (agent, account_snap) in &snapshot.accounts {
            let mut account = Account::new(*agent);
            account.traded_volume = account_snap.traded_volume;
            for (book, balances_snap) in &account_snap.holdings {
                account.holdings.insert(*book, Balances::from_snapshot(balances_snap));
            }
            registry.accounts.insert(*agent, account);
        }
        registry
    }
}

/// Checkpoint image of one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub traded_volume: Decimal,
    pub holdings: BTreeMap<BookId, BalancesSnapshot>,
}

/// Checkpoint image of the whole registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub base_decimals: u32,
    pub quote_decimals: u32,
    pub accounts: BTreeMap<AgentId, AccountSnapshot>,
}
