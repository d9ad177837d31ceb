// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::{SqliteStore, TradeStore};
use crate::utils::{current_user, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let store = SqliteStore::new(conn);
    match m.subcommand() {
        Some(("show", sub)) => {
            let user = current_user(conn, sub)?;
            let p = store.get_profile(&user)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &p)? {
                let rows = vec![
                    vec!["User".into(), p.user_id],
                    vec!["Trading style".into(), p.trading_style],
                    vec!["Location".into(), p.location],
                    vec!["Bio".into(), p.bio],
                ];
                println!("{}", pretty_table(&["Field", "Value"], rows));
            }
        }
        Some(("set", sub)) => {
            let user = current_user(conn, sub)?;
            let mut p = store.get_profile(&user)?;
            if let Some(bio) = sub.get_one::<String>("bio") {
                p.bio = bio.trim().to_string();
            }
            if let Some(style) = sub.get_one::<String>("style") {
                p.trading_style = style.trim().to_string();
            }
            if let Some(loc) = sub.get_one::<String>("location") {
                p.location = loc.trim().to_string();
            }
            store.upsert_profile(&p)?;
            println!("Saved profile for '{}'", user);
        }
        _ => {}
    }
    Ok(())
}
