// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{TradeStore, validate_account_name};
use crate::errors::{Error, Result};
use crate::models::{Account, NewAccount, NewTrade, Profile, Trade, TradeFilter, TradeUpdate};
use chrono::Utc;
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct Inner {
    last_account_id: i64,
    last_trade_id: i64,
    accounts: BTreeMap<i64, Account>,
    trades: BTreeMap<i64, Trade>,
    profiles: HashMap<String, Profile>,
}

impl Inner {
    fn owned_account(&self, user_id: &str, account_id: i64) -> Result<&Account> {
        self.accounts
            .get(&account_id)
            .filter(|a| a.user_id == user_id)
            .ok_or_else(|| Error::not_found(format!("Account {}", account_id)))
    }

    fn owned_trade_mut(&mut self, user_id: &str, trade_id: i64) -> Result<&mut Trade> {
        self.trades
            .get_mut(&trade_id)
            .filter(|t| t.user_id == user_id)
            .ok_or_else(|| Error::not_found(format!("Trade {}", trade_id)))
    }
}

/// In-process store with the same ownership rules as the SQLite one.
#[derive(Default)]
pub struct MemoryStore {
    inner: RefCell<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TradeStore for MemoryStore {
    fn fetch_account(&self, user_id: &str, account_id: i64) -> Result<Account> {
        self.inner
            .borrow()
            .owned_account(user_id, account_id)
            .cloned()
    }

    fn fetch_closed_trades(&self, user_id: &str, account_id: i64) -> Result<Vec<Trade>> {
        let inner = self.inner.borrow();
        let mut out: Vec<Trade> = inner
            .trades
            .values()
            .filter(|t| t.user_id == user_id && t.account_id == account_id && t.is_closed())
            .cloned()
            .collect();
        out.sort_by(|a, b| a.exit_date.cmp(&b.exit_date).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    fn list_accounts(&self, user_id: &str) -> Result<Vec<Account>> {
        Ok(self
            .inner
            .borrow()
            .accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    fn create_account(&self, user_id: &str, new_account: NewAccount) -> Result<Account> {
        let name = validate_account_name(&new_account.name)?;
        let mut inner = self.inner.borrow_mut();
        if inner
            .accounts
            .values()
            .any(|a| a.user_id == user_id && a.name == name)
        {
            return Err(Error::invalid(format!("account '{}' already exists", name)));
        }
        inner.last_account_id += 1;
        let account = Account {
            id: inner.last_account_id,
            user_id: user_id.to_string(),
            name,
            initial_balance: new_account.initial_balance,
            created_at: Utc::now(),
        };
        inner.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    fn update_initial_balance(
        &self,
        user_id: &str,
        account_id: i64,
        initial_balance: Decimal,
    ) -> Result<Account> {
        let mut inner = self.inner.borrow_mut();
        inner.owned_account(user_id, account_id)?;
        let account = inner
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| Error::not_found(format!("Account {}", account_id)))?;
        account.initial_balance = initial_balance;
        Ok(account.clone())
    }

    fn delete_account(&self, user_id: &str, account_id: i64) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.owned_account(user_id, account_id)?;
        inner.trades.retain(|_, t| t.account_id != account_id);
        inner.accounts.remove(&account_id);
        Ok(())
    }

    fn list_trades(&self, user_id: &str, filter: &TradeFilter) -> Result<Vec<Trade>> {
        let inner = self.inner.borrow();
        let mut out: Vec<Trade> = inner
            .trades
            .values()
            .filter(|t| t.user_id == user_id && filter.matches(t))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.entry_date.cmp(&a.entry_date).then(b.id.cmp(&a.id)));
        if let Some(limit) = filter.limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    fn get_trade(&self, user_id: &str, trade_id: i64) -> Result<Trade> {
        self.inner
            .borrow()
            .trades
            .get(&trade_id)
            .filter(|t| t.user_id == user_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Trade {}", trade_id)))
    }

    fn create_trade(&self, user_id: &str, new_trade: NewTrade) -> Result<Trade> {
        let mut inner = self.inner.borrow_mut();
        inner.owned_account(user_id, new_trade.account_id)?;
        let mut trade = new_trade.into_trade(user_id, Utc::now())?;
        inner.last_trade_id += 1;
        trade.id = inner.last_trade_id;
        inner.trades.insert(trade.id, trade.clone());
        Ok(trade)
    }

    fn update_trade(&self, user_id: &str, trade_id: i64, update: TradeUpdate) -> Result<Trade> {
        let mut inner = self.inner.borrow_mut();
        let stored = inner.owned_trade_mut(user_id, trade_id)?;
        // apply to a copy so a rejected edit leaves the stored trade intact
        let mut edited = stored.clone();
        edited.apply_update(update, Utc::now())?;
        *stored = edited.clone();
        Ok(edited)
    }

    fn delete_trade(&self, user_id: &str, trade_id: i64) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.owned_trade_mut(user_id, trade_id)?;
        inner.trades.remove(&trade_id);
        Ok(())
    }

    fn get_profile(&self, user_id: &str) -> Result<Profile> {
        Ok(self
            .inner
            .borrow()
            .profiles
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| Profile::empty(user_id)))
    }

    fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        self.inner
            .borrow_mut()
            .profiles
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, TradeStatus};
    use rust_decimal_macros::dec;

    #[test]
    fn rejected_edit_leaves_trade_unchanged() {
        let store = MemoryStore::new();
        let acc = store
            .create_account(
                "u1",
                NewAccount {
                    name: "Main".into(),
                    initial_balance: dec!(1000),
                },
            )
            .unwrap();
        let t = store
            .create_trade(
                "u1",
                NewTrade::open(acc.id, "sol", Direction::Long, dec!(20), dec!(5)),
            )
            .unwrap();
        let err = store
            .update_trade(
                "u1",
                t.id,
                TradeUpdate {
                    exit_price: Some(dec!(25)),
                    size: Some(dec!(-1)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        let stored = store.get_trade("u1", t.id).unwrap();
        assert_eq!(stored.status, TradeStatus::Open);
        assert_eq!(stored.size, dec!(5));
    }

    #[test]
    fn trades_are_owner_scoped() {
        let store = MemoryStore::new();
        let acc = store
            .create_account(
                "u1",
                NewAccount {
                    name: "Main".into(),
                    initial_balance: dec!(1000),
                },
            )
            .unwrap();
        let t = store
            .create_trade(
                "u1",
                NewTrade::open(acc.id, "sol", Direction::Long, dec!(20), dec!(5)),
            )
            .unwrap();
        assert!(store.get_trade("u2", t.id).unwrap_err().is_not_found());
        assert!(
            store
                .update_trade("u2", t.id, TradeUpdate::default())
                .unwrap_err()
                .is_not_found()
        );
        assert!(store.delete_account("u2", acc.id).unwrap_err().is_not_found());
        assert!(store.list_trades("u2", &TradeFilter::default()).unwrap().is_empty());
    }
}
