// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

pub const DB_ENV: &str = "TRADELOG_DB";

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Tradelog", "tradelog"));

pub fn db_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(DB_ENV) {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p));
        }
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("tradelog.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    log::debug!("opening journal at {}", path.display());
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        initial_balance TEXT NOT NULL DEFAULT '1000',
        created_at TEXT NOT NULL,
        UNIQUE(user_id, name)
    );
    CREATE INDEX IF NOT EXISTS idx_accounts_user ON accounts(user_id);

    CREATE TABLE IF NOT EXISTS trades(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        account_id INTEGER NOT NULL,
        symbol TEXT NOT NULL,
        direction TEXT NOT NULL CHECK(direction IN ('LONG','SHORT')),
        status TEXT NOT NULL DEFAULT 'OPEN'
            CHECK(status IN ('OPEN','WIN','LOSS','BREAKEVEN')),
        entry_price TEXT NOT NULL,
        exit_price TEXT,
        size TEXT NOT NULL,
        pnl TEXT,
        stop_loss TEXT,
        take_profit TEXT,
        strategy TEXT,
        notes TEXT,
        entry_date TEXT NOT NULL,
        exit_date TEXT,
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_trades_account_exit ON trades(account_id, exit_date);
    CREATE INDEX IF NOT EXISTS idx_trades_user_entry ON trades(user_id, entry_date);

    CREATE TABLE IF NOT EXISTS profiles(
        user_id TEXT PRIMARY KEY,
        bio TEXT NOT NULL DEFAULT '',
        trading_style TEXT NOT NULL DEFAULT 'Day Trader',
        location TEXT NOT NULL DEFAULT '',
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "#,
    )?;
    Ok(())
}
