// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Direction, TradeStatus};
use crate::pnl::settle;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = find_issues(conn)?;
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// Stored trades whose derived columns disagree with their prices.
pub fn find_issues(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Trades pointing at a missing account
    let mut stmt = conn.prepare(
        "SELECT t.id, t.account_id FROM trades t
         LEFT JOIN accounts a ON a.id=t.account_id AND a.user_id=t.user_id
         WHERE a.id IS NULL ORDER BY t.id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let acc: i64 = r.get(1)?;
        rows.push(vec!["orphan_trade".into(), format!("#{} account {}", id, acc)]);
    }

    // 2) pnl / status / exit date consistency
    let mut stmt2 = conn.prepare(
        "SELECT id, direction, entry_price, size, exit_price, pnl, status, exit_date
         FROM trades ORDER BY id",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let id: i64 = r.get(0)?;
        let direction: Direction = r.get(1)?;
        let entry: String = r.get(2)?;
        let size: String = r.get(3)?;
        let exit: Option<String> = r.get(4)?;
        let pnl: Option<String> = r.get(5)?;
        let status: TradeStatus = r.get(6)?;
        let exit_date: Option<String> = r.get(7)?;

        let parsed = (
            entry.parse::<Decimal>(),
            size.parse::<Decimal>(),
            exit.as_deref().map(str::parse::<Decimal>).transpose(),
            pnl.as_deref().map(str::parse::<Decimal>).transpose(),
        );
        let (Ok(entry), Ok(size), Ok(exit), Ok(pnl)) = parsed else {
            rows.push(vec!["bad_decimal".into(), format!("#{}", id)]);
            continue;
        };

        let Ok(settlement) = settle(direction, entry, size, exit) else {
            rows.push(vec!["pnl_overflow".into(), format!("#{}", id)]);
            continue;
        };
        match settlement {
            None => {
                if pnl.is_some() {
                    rows.push(vec!["open_with_pnl".into(), format!("#{}", id)]);
                }
                if status != TradeStatus::Open {
                    rows.push(vec![
                        "status_mismatch".into(),
                        format!("#{} is {} but has no exit", id, status),
                    ]);
                }
            }
            Some(expected) => {
                match pnl {
                    None => rows.push(vec!["closed_without_pnl".into(), format!("#{}", id)]),
                    Some(p) if p != expected.pnl => rows.push(vec![
                        "pnl_drift".into(),
                        format!("#{} stored {} expected {}", id, p, expected.pnl),
                    ]),
                    Some(_) => {}
                }
                if status != expected.status {
                    rows.push(vec![
                        "status_mismatch".into(),
                        format!("#{} is {} expected {}", id, status, expected.status),
                    ]);
                }
                if exit_date.is_none() {
                    rows.push(vec!["closed_without_exit_date".into(), format!("#{}", id)]);
                }
            }
        }
    }
    Ok(rows)
}
