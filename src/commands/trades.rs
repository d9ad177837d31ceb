// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::accounts::selected_account;
use crate::models::{Direction, NewTrade, Trade, TradeFilter, TradeStatus, TradeUpdate};
use crate::store::{SqliteStore, TradeStore};
use crate::utils::{
    current_user, fmt_fixed, maybe_print_json, opt_text, parse_decimal, parse_timestamp,
    pretty_table,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let user = current_user(conn, sub)?;
            let id = parse_id(sub)?;
            SqliteStore::new(conn).delete_trade(&user, id)?;
            println!("Removed trade {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn parse_id(sub: &clap::ArgMatches) -> Result<i64> {
    let raw = sub.get_one::<String>("id").unwrap();
    raw.trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid trade id '{}'", raw))
}

fn opt_decimal(sub: &clap::ArgMatches, key: &str) -> Result<Option<Decimal>> {
    sub.get_one::<String>(key)
        .map(|s| parse_decimal(s))
        .transpose()
}

fn opt_timestamp(sub: &clap::ArgMatches, key: &str) -> Result<Option<DateTime<Utc>>> {
    sub.get_one::<String>(key)
        .map(|s| parse_timestamp(s))
        .transpose()
}

fn opt_string(sub: &clap::ArgMatches, key: &str) -> Option<String> {
    sub.get_one::<String>(key).cloned()
}

/// `Some(None)` when `--clear-*` was passed, otherwise the parsed value.
fn clearable_decimal(
    sub: &clap::ArgMatches,
    key: &str,
    clear: &str,
) -> Result<Option<Option<Decimal>>> {
    if sub.get_flag(clear) {
        return Ok(Some(None));
    }
    Ok(opt_decimal(sub, key)?.map(Some))
}

fn clearable_string(sub: &clap::ArgMatches, key: &str, clear: &str) -> Option<Option<String>> {
    if sub.get_flag(clear) {
        return Some(None);
    }
    opt_string(sub, key).map(Some)
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = current_user(conn, sub)?;
    let account = selected_account(
        conn,
        &user,
        sub.get_one::<String>("account").map(|s| s.as_str()),
    )?;
    let direction: Direction = sub.get_one::<String>("direction").unwrap().parse()?;
    let new_trade = NewTrade {
        account_id: account.id,
        symbol: sub.get_one::<String>("symbol").unwrap().clone(),
        direction,
        entry_price: parse_decimal(sub.get_one::<String>("entry").unwrap())?,
        size: parse_decimal(sub.get_one::<String>("size").unwrap())?,
        exit_price: opt_decimal(sub, "exit")?,
        stop_loss: opt_decimal(sub, "stop")?,
        take_profit: opt_decimal(sub, "take")?,
        strategy: opt_string(sub, "strategy"),
        notes: opt_string(sub, "note"),
        entry_date: opt_timestamp(sub, "entry_date")?,
        exit_date: opt_timestamp(sub, "exit_date")?,
    };
    let t = SqliteStore::new(conn).create_trade(&user, new_trade)?;
    println!(
        "Recorded #{} {} {} x {} @ {} in '{}' [{}{}]",
        t.id,
        t.direction,
        t.size,
        t.symbol,
        t.entry_price,
        account.name,
        t.status,
        t.pnl.map(|p| format!(", pnl {}", fmt_fixed(p, 2))).unwrap_or_default()
    );
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = current_user(conn, sub)?;
    let id = parse_id(sub)?;
    let direction = sub
        .get_one::<String>("direction")
        .map(|s| s.parse::<Direction>())
        .transpose()?;
    let update = TradeUpdate {
        symbol: opt_string(sub, "symbol"),
        direction,
        entry_price: opt_decimal(sub, "entry")?,
        size: opt_decimal(sub, "size")?,
        exit_price: opt_decimal(sub, "exit")?,
        stop_loss: clearable_decimal(sub, "stop", "clear_stop")?,
        take_profit: clearable_decimal(sub, "take", "clear_take")?,
        strategy: clearable_string(sub, "strategy", "clear_strategy"),
        notes: clearable_string(sub, "note", "clear_note"),
        entry_date: opt_timestamp(sub, "entry_date")?,
        exit_date: opt_timestamp(sub, "exit_date")?,
        reopen: sub.get_flag("reopen"),
    };
    let t = SqliteStore::new(conn).update_trade(&user, id, update)?;
    println!(
        "Updated #{} {} {} [{}{}]",
        t.id,
        t.direction,
        t.symbol,
        t.status,
        t.pnl.map(|p| format!(", pnl {}", fmt_fixed(p, 2))).unwrap_or_default()
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.entry_date.clone(),
                    r.symbol.clone(),
                    r.direction.clone(),
                    r.entry_price.clone(),
                    r.exit_price.clone(),
                    r.size.clone(),
                    r.pnl.clone(),
                    r.status.clone(),
                    r.strategy.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "ID", "Entry", "Symbol", "Dir", "Entry Px", "Exit Px", "Size", "PnL",
                    "Status", "Strategy"
                ],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRow {
    pub id: i64,
    pub account: String,
    pub symbol: String,
    pub direction: String,
    pub status: String,
    pub entry_price: String,
    pub exit_price: String,
    pub size: String,
    pub pnl: String,
    pub stop_loss: String,
    pub take_profit: String,
    pub strategy: String,
    pub notes: String,
    pub entry_date: String,
    pub exit_date: String,
}

impl TradeRow {
    pub fn from_trade(t: &Trade, account: &str) -> Self {
        TradeRow {
            id: t.id,
            account: account.to_string(),
            symbol: t.symbol.clone(),
            direction: t.direction.to_string(),
            status: t.status.to_string(),
            entry_price: t.entry_price.to_string(),
            exit_price: opt_text(t.exit_price),
            size: t.size.to_string(),
            pnl: t.pnl.map(|p| fmt_fixed(p, 2)).unwrap_or_default(),
            stop_loss: opt_text(t.stop_loss),
            take_profit: opt_text(t.take_profit),
            strategy: t.strategy.clone().unwrap_or_default(),
            notes: t.notes.clone().unwrap_or_default(),
            entry_date: t.entry_date.format("%Y-%m-%d %H:%M").to_string(),
            exit_date: t
                .exit_date
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Trades for the `list` filters, newest entry first. Without `--account`
/// every account of the user is listed.
pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TradeRow>> {
    let user = current_user(conn, sub)?;
    let store = SqliteStore::new(conn);
    let accounts = store.list_accounts(&user)?;

    let account_id = match sub.get_one::<String>("account") {
        Some(key) => Some(selected_account(conn, &user, Some(key))?.id),
        None => None,
    };
    let status = sub
        .get_one::<String>("status")
        .map(|s| s.parse::<TradeStatus>())
        .transpose()?;
    let filter = TradeFilter {
        account_id,
        symbol: opt_string(sub, "symbol"),
        status,
        limit: sub.get_one::<usize>("limit").copied(),
    };

    let trades = store.list_trades(&user, &filter)?;
    Ok(trades
        .iter()
        .map(|t| {
            let name = accounts
                .iter()
                .find(|a| a.id == t.account_id)
                .map(|a| a.name.as_str())
                .unwrap_or("");
            TradeRow::from_trade(t, name)
        })
        .collect())
}
