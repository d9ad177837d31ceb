// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::db_path;
use crate::utils::{current_user, get_active_account, pretty_table, set_setting};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => {
            let user = current_user(conn, sub)?;
            let active = get_active_account(conn, &user)?
                .map(|id| id.to_string())
                .unwrap_or_else(|| "(none)".into());
            let rows = vec![
                vec!["database".into(), db_path()?.display().to_string()],
                vec!["user".into(), user],
                vec!["active account".into(), active],
            ];
            println!("{}", pretty_table(&["Setting", "Value"], rows));
        }
        Some(("set-user", sub)) => {
            let raw = sub.get_one::<String>("ID").unwrap();
            let user = raw.trim();
            if user.is_empty() {
                return Err(anyhow!("User id must not be empty"));
            }
            set_setting(conn, "default_user", user)?;
            println!("Default user set to '{}'", user);
        }
        _ => {}
    }
    Ok(())
}
