// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::accounts::selected_account;
use crate::report::{AccountReport, account_report};
use crate::store::SqliteStore;
use crate::utils::{current_user, fmt_fixed, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(&load(conn, sub)?, sub)?,
        Some(("equity", sub)) => equity(&load(conn, sub)?, sub)?,
        Some(("calendar", sub)) => calendar(&load(conn, sub)?, sub)?,
        Some(("strategies", sub)) => strategies(&load(conn, sub)?, sub)?,
        _ => {}
    }
    Ok(())
}

/// Report for the account named by `--account`, or the active one.
pub fn load(conn: &Connection, sub: &clap::ArgMatches) -> Result<AccountReport> {
    let user = current_user(conn, sub)?;
    let key = sub.get_one::<String>("account").map(|s| s.as_str());
    let account = selected_account(conn, &user, key)?;
    Ok(account_report(&SqliteStore::new(conn), &user, account.id)?)
}

fn summary(report: &AccountReport, sub: &clap::ArgMatches) -> Result<()> {
    let s = &report.summary;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), s)? {
        return Ok(());
    }
    let rows = vec![
        vec!["Account".into(), report.account.name.clone()],
        vec!["Net PnL".into(), s.net_pnl.clone()],
        vec!["Win rate".into(), format!("{}%", s.win_rate)],
        vec!["Profit factor".into(), s.profit_factor.clone()],
        vec!["Trades".into(), s.total_trades.to_string()],
        vec!["Wins / Losses".into(), format!("{} / {}", s.wins, s.losses)],
        vec!["Initial balance".into(), s.initial_balance.clone()],
        vec!["Current balance".into(), s.current_balance.clone()],
    ];
    println!("{}", pretty_table(&["Metric", "Value"], rows));
    Ok(())
}

fn equity(report: &AccountReport, sub: &clap::ArgMatches) -> Result<()> {
    let curve = &report.summary.equity_curve;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), curve)? {
        return Ok(());
    }
    let rows = curve
        .iter()
        .enumerate()
        .map(|(i, p)| {
            vec![
                i.to_string(),
                p.label.clone(),
                fmt_fixed(p.pnl, 2),
                fmt_fixed(p.balance, 2),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["#", "Date", "PnL", "Balance"], rows));
    Ok(())
}

fn calendar(report: &AccountReport, sub: &clap::ArgMatches) -> Result<()> {
    let days = &report.calendar;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), days)? {
        return Ok(());
    }
    let rows = days
        .iter()
        .map(|d| {
            let sign = if d.pnl.is_sign_positive() && !d.pnl.is_zero() {
                "+"
            } else {
                ""
            };
            vec![
                d.date.to_string(),
                d.date.format("%a").to_string(),
                format!("{}{}", sign, fmt_fixed(d.pnl, 2)),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Date", "Day", "PnL"], rows));
    Ok(())
}

fn strategies(report: &AccountReport, sub: &clap::ArgMatches) -> Result<()> {
    let items = &report.strategies;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), items)? {
        return Ok(());
    }
    let rows = items
        .iter()
        .map(|s| vec![s.name.clone(), fmt_fixed(s.value, 2)])
        .collect();
    println!("{}", pretty_table(&["Strategy", "Profit"], rows));
    Ok(())
}
