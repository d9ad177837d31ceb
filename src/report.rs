// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::Result;
use crate::models::Account;
use crate::stats::{
    CalendarDay, StrategyProfit, Summary, compute_calendar, compute_strategy_breakdown,
    compute_summary,
};
use crate::store::TradeStore;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountReport {
    pub account: Account,
    pub summary: Summary,
    pub calendar: Vec<CalendarDay>,
    pub strategies: Vec<StrategyProfit>,
}

/// Fetch one account and its closed trades, then aggregate.
///
/// Fails with `NotFound` if the account is missing or owned by another user;
/// no default report is produced in that case.
pub fn account_report<S: TradeStore + ?Sized>(
    store: &S,
    user_id: &str,
    account_id: i64,
) -> Result<AccountReport> {
    let (account, mut trades) = store.fetch_account_with_closed_trades(user_id, account_id)?;
    // stable, so equal exit times keep the store's order
    trades.sort_by_key(|t| t.exit_date);
    log::debug!(
        "aggregating {} closed trades for account {} ('{}')",
        trades.len(),
        account.id,
        account.name
    );

    let summary = compute_summary(&trades, account.initial_balance);
    let calendar = compute_calendar(&trades);
    let strategies = compute_strategy_breakdown(&trades);
    Ok(AccountReport {
        account,
        summary,
        calendar,
        strategies,
    })
}
