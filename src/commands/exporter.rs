// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::accounts::selected_account;
use crate::commands::trades::TradeRow;
use crate::models::TradeFilter;
use crate::store::{SqliteStore, TradeStore};
use crate::utils::current_user;
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("trades", sub)) => export_trades(conn, sub),
        _ => Ok(()),
    }
}

fn export_trades(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().trim().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    let user = current_user(conn, sub)?;
    let store = SqliteStore::new(conn);

    let account = match sub.get_one::<String>("account") {
        Some(key) => Some(selected_account(conn, &user, Some(key))?),
        None => None,
    };
    let accounts = store.list_accounts(&user)?;
    let filter = TradeFilter {
        account_id: account.as_ref().map(|a| a.id),
        ..Default::default()
    };
    // oldest first
    let mut trades = store.list_trades(&user, &filter)?;
    trades.reverse();
    let rows: Vec<TradeRow> = trades
        .iter()
        .map(|t| {
            let name = accounts
                .iter()
                .find(|a| a.id == t.account_id)
                .map(|a| a.name.as_str())
                .unwrap_or("");
            TradeRow::from_trade(t, name)
        })
        .collect();

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            for row in &rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&rows)?)?;
        }
        _ => return Err(anyhow!("Unknown format: {} (use csv|json)", fmt)),
    }
    log::info!("exported {} trades to {}", rows.len(), out);
    println!("Exported {} trades to {}", rows.len(), out);
    Ok(())
}
