// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Trade record store.
//!
//! Every method is scoped to the requesting user. A record owned by someone
//! else is reported as [`Error::NotFound`](crate::errors::Error::NotFound),
//! exactly like a record that does not exist.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::errors::Result;
use crate::models::{Account, NewAccount, NewTrade, Profile, Trade, TradeFilter, TradeUpdate};
use rust_decimal::Decimal;

pub trait TradeStore {
    fn fetch_account(&self, user_id: &str, account_id: i64) -> Result<Account>;

    /// Closed trades of one account, ordered by exit time ascending, then id.
    fn fetch_closed_trades(&self, user_id: &str, account_id: i64) -> Result<Vec<Trade>>;

    /// Both reads of a report. Stores that can should take them from one
    /// snapshot.
    fn fetch_account_with_closed_trades(
        &self,
        user_id: &str,
        account_id: i64,
    ) -> Result<(Account, Vec<Trade>)> {
        let account = self.fetch_account(user_id, account_id)?;
        let trades = self.fetch_closed_trades(user_id, account_id)?;
        Ok((account, trades))
    }

    /// Accounts ordered by id.
    fn list_accounts(&self, user_id: &str) -> Result<Vec<Account>>;

    fn create_account(&self, user_id: &str, new_account: NewAccount) -> Result<Account>;

    fn update_initial_balance(
        &self,
        user_id: &str,
        account_id: i64,
        initial_balance: Decimal,
    ) -> Result<Account>;

    /// Removes the account together with all its trades.
    fn delete_account(&self, user_id: &str, account_id: i64) -> Result<()>;

    /// Newest entry first.
    fn list_trades(&self, user_id: &str, filter: &TradeFilter) -> Result<Vec<Trade>>;

    fn get_trade(&self, user_id: &str, trade_id: i64) -> Result<Trade>;

    fn create_trade(&self, user_id: &str, new_trade: NewTrade) -> Result<Trade>;

    fn update_trade(&self, user_id: &str, trade_id: i64, update: TradeUpdate) -> Result<Trade>;

    fn delete_trade(&self, user_id: &str, trade_id: i64) -> Result<()>;

    /// The stored profile, or defaults when the user never saved one.
    fn get_profile(&self, user_id: &str) -> Result<Profile>;

    fn upsert_profile(&self, profile: &Profile) -> Result<()>;
}

pub(crate) fn validate_account_name(name: &str) -> Result<String> {
    let n = name.trim();
    if n.is_empty() {
        return Err(crate::errors::Error::invalid("account name must not be empty"));
    }
    Ok(n.to_string())
}
