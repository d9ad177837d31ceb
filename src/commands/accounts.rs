// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Account, NewAccount};
use crate::registry::AccountRegistry;
use crate::store::{SqliteStore, TradeStore};
use crate::utils::{
    clear_active_account, current_user, fmt_fixed, get_active_account, maybe_print_json,
    parse_decimal, pretty_table, set_active_account,
};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let user = current_user(conn, m)?;
    let store = SqliteStore::new(conn);
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim().to_string();
            let balance = parse_decimal(sub.get_one::<String>("balance").unwrap())?;
            let acc = store.create_account(
                &user,
                NewAccount {
                    name,
                    initial_balance: balance,
                },
            )?;
            // newly created accounts become active
            set_active_account(conn, &user, acc.id)?;
            println!(
                "Added account '{}' with initial balance {} (now active)",
                acc.name, acc.initial_balance
            );
        }
        Some(("list", sub)) => list(conn, &store, &user, sub)?,
        Some(("use", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let acc = selected_account(conn, &user, Some(name))?;
            set_active_account(conn, &user, acc.id)?;
            println!("Active account: '{}'", acc.name);
        }
        Some(("set-balance", sub)) => {
            let key = sub.get_one::<String>("account").map(|s| s.as_str());
            let balance = parse_decimal(sub.get_one::<String>("balance").unwrap())?;
            let acc = selected_account(conn, &user, key)?;
            let acc = store.update_initial_balance(&user, acc.id, balance)?;
            println!(
                "Initial balance of '{}' set to {}; reports will be recomputed from it",
                acc.name, acc.initial_balance
            );
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let acc = selected_account(conn, &user, Some(name))?;
            store.delete_account(&user, acc.id)?;
            if get_active_account(conn, &user)? == Some(acc.id) {
                clear_active_account(conn, &user)?;
            }
            println!("Removed account '{}' and its trades", acc.name);
        }
        _ => {}
    }
    Ok(())
}

fn list(
    conn: &Connection,
    store: &SqliteStore<'_>,
    user: &str,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let accounts = store.list_accounts(user)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &accounts)? {
        return Ok(());
    }
    let active = get_active_account(conn, user)?;
    let registry = AccountRegistry::new(accounts);
    let current = registry.resolve(None, active).ok().map(|a| a.id);
    let rows = registry
        .iter()
        .map(|a| {
            vec![
                if Some(a.id) == current { "*".into() } else { String::new() },
                a.id.to_string(),
                a.name.clone(),
                fmt_fixed(a.initial_balance, 2),
                a.created_at.format("%Y-%m-%d").to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["", "ID", "Name", "Initial Balance", "Created"], rows)
    );
    Ok(())
}

/// Resolve `key` (name or id) or the user's active account.
pub fn selected_account(conn: &Connection, user: &str, key: Option<&str>) -> Result<Account> {
    let store = SqliteStore::new(conn);
    let registry = AccountRegistry::load(&store, user)?;
    let active = get_active_account(conn, user)?;
    let acc = registry
        .resolve(key, active)
        .with_context(|| format!("No account to act on for user '{}'", user))?;
    Ok(acc.clone())
}
