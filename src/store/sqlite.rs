// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{TradeStore, validate_account_name};
use crate::errors::{Error, Result};
use crate::models::{Account, NewAccount, NewTrade, Profile, Trade, TradeFilter, TradeUpdate};
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, ToSql, params, params_from_iter};
use rust_decimal::Decimal;

const ACCOUNT_COLS: &str = "id, user_id, name, initial_balance, created_at";
const TRADE_COLS: &str = "id, user_id, account_id, symbol, direction, entry_price, size, \
     exit_price, stop_loss, take_profit, strategy, notes, status, pnl, entry_date, exit_date";

/// Store backed by the journal's SQLite database. Decimals are kept as TEXT.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        SqliteStore { conn }
    }

    /// `NotFound` for an account the user cannot see, or the database error
    /// hit while checking who owns it.
    fn account_missing(&self, user_id: &str, account_id: i64) -> Error {
        let owner: Option<String> = match self
            .conn
            .query_row(
                "SELECT user_id FROM accounts WHERE id=?1",
                params![account_id],
                |r| r.get(0),
            )
            .optional()
        {
            Ok(owner) => owner,
            Err(e) => return e.into(),
        };
        if owner.is_some_and(|o| o != user_id) {
            log::warn!(
                "user '{}' requested account {} owned by someone else",
                user_id,
                account_id
            );
        }
        Error::not_found(format!("Account {}", account_id))
    }
}

fn dec_at(r: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn opt_dec_at(r: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let s: Option<String> = r.get(idx)?;
    s.map(|s| {
        s.parse::<Decimal>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn account_from_row(r: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        initial_balance: dec_at(r, 3)?,
        created_at: r.get(4)?,
    })
}

fn trade_from_row(r: &Row<'_>) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: r.get(0)?,
        user_id: r.get(1)?,
        account_id: r.get(2)?,
        symbol: r.get(3)?,
        direction: r.get(4)?,
        entry_price: dec_at(r, 5)?,
        size: dec_at(r, 6)?,
        exit_price: opt_dec_at(r, 7)?,
        stop_loss: opt_dec_at(r, 8)?,
        take_profit: opt_dec_at(r, 9)?,
        strategy: r.get(10)?,
        notes: r.get(11)?,
        status: r.get(12)?,
        pnl: opt_dec_at(r, 13)?,
        entry_date: r.get(14)?,
        exit_date: r.get(15)?,
    })
}

fn opt_str(d: Option<Decimal>) -> Option<String> {
    d.map(|d| d.to_string())
}

impl TradeStore for SqliteStore<'_> {
    fn fetch_account(&self, user_id: &str, account_id: i64) -> Result<Account> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE id=?1 AND user_id=?2",
            ACCOUNT_COLS
        );
        self.conn
            .query_row(&sql, params![account_id, user_id], account_from_row)
            .optional()?
            .ok_or_else(|| self.account_missing(user_id, account_id))
    }

    fn fetch_closed_trades(&self, user_id: &str, account_id: i64) -> Result<Vec<Trade>> {
        let sql = format!(
            "SELECT {} FROM trades
             WHERE user_id=?1 AND account_id=?2 AND exit_price IS NOT NULL
             ORDER BY exit_date ASC, id ASC",
            TRADE_COLS
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![user_id, account_id], trade_from_row)?;
        let mut trades = Vec::new();
        for row in rows {
            trades.push(row?);
        }
        log::debug!(
            "fetched {} closed trades for account {}",
            trades.len(),
            account_id
        );
        Ok(trades)
    }

    fn fetch_account_with_closed_trades(
        &self,
        user_id: &str,
        account_id: i64,
    ) -> Result<(Account, Vec<Trade>)> {
        let tx = self.conn.unchecked_transaction()?;
        let account = self.fetch_account(user_id, account_id)?;
        let trades = self.fetch_closed_trades(user_id, account_id)?;
        tx.commit()?;
        Ok((account, trades))
    }

    fn list_accounts(&self, user_id: &str) -> Result<Vec<Account>> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE user_id=?1 ORDER BY id",
            ACCOUNT_COLS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], account_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn create_account(&self, user_id: &str, new_account: NewAccount) -> Result<Account> {
        let name = validate_account_name(&new_account.name)?;
        let res = self.conn.execute(
            "INSERT INTO accounts(user_id, name, initial_balance, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user_id,
                name,
                new_account.initial_balance.to_string(),
                Utc::now()
            ],
        );
        match res {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                return Err(Error::invalid(format!("account '{}' already exists", name)));
            }
            Err(e) => return Err(e.into()),
        }
        let id = self.conn.last_insert_rowid();
        log::info!("created account {} '{}' for user '{}'", id, name, user_id);
        self.fetch_account(user_id, id)
    }

    fn update_initial_balance(
        &self,
        user_id: &str,
        account_id: i64,
        initial_balance: Decimal,
    ) -> Result<Account> {
        let n = self.conn.execute(
            "UPDATE accounts SET initial_balance=?1 WHERE id=?2 AND user_id=?3",
            params![initial_balance.to_string(), account_id, user_id],
        )?;
        if n == 0 {
            return Err(self.account_missing(user_id, account_id));
        }
        log::info!(
            "account {} initial balance set to {}",
            account_id,
            initial_balance
        );
        self.fetch_account(user_id, account_id)
    }

    fn delete_account(&self, user_id: &str, account_id: i64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.fetch_account(user_id, account_id)?;
        let removed = tx.execute(
            "DELETE FROM trades WHERE account_id=?1 AND user_id=?2",
            params![account_id, user_id],
        )?;
        tx.execute(
            "DELETE FROM accounts WHERE id=?1 AND user_id=?2",
            params![account_id, user_id],
        )?;
        tx.commit()?;
        log::info!("deleted account {} and {} trades", account_id, removed);
        Ok(())
    }

    fn list_trades(&self, user_id: &str, filter: &TradeFilter) -> Result<Vec<Trade>> {
        let mut sql = format!("SELECT {} FROM trades WHERE user_id=?", TRADE_COLS);
        let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(user_id.to_string())];

        if let Some(account_id) = filter.account_id {
            sql.push_str(" AND account_id=?");
            values.push(Box::new(account_id));
        }
        if let Some(symbol) = &filter.symbol {
            sql.push_str(" AND symbol=?");
            values.push(Box::new(symbol.trim().to_uppercase()));
        }
        if let Some(status) = filter.status {
            sql.push_str(" AND status=?");
            values.push(Box::new(status));
        }
        sql.push_str(" ORDER BY entry_date DESC, id DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            values.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), trade_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn get_trade(&self, user_id: &str, trade_id: i64) -> Result<Trade> {
        let sql = format!("SELECT {} FROM trades WHERE id=?1 AND user_id=?2", TRADE_COLS);
        self.conn
            .query_row(&sql, params![trade_id, user_id], trade_from_row)
            .optional()?
            .ok_or_else(|| Error::not_found(format!("Trade {}", trade_id)))
    }

    fn create_trade(&self, user_id: &str, new_trade: NewTrade) -> Result<Trade> {
        self.fetch_account(user_id, new_trade.account_id)?;
        let mut t = new_trade.into_trade(user_id, Utc::now())?;
        self.conn.execute(
            "INSERT INTO trades(user_id, account_id, symbol, direction, entry_price, size,
                exit_price, stop_loss, take_profit, strategy, notes, status, pnl,
                entry_date, exit_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                t.user_id,
                t.account_id,
                t.symbol,
                t.direction,
                t.entry_price.to_string(),
                t.size.to_string(),
                opt_str(t.exit_price),
                opt_str(t.stop_loss),
                opt_str(t.take_profit),
                t.strategy,
                t.notes,
                t.status,
                opt_str(t.pnl),
                t.entry_date,
                t.exit_date,
            ],
        )?;
        t.id = self.conn.last_insert_rowid();
        log::info!(
            "recorded trade {} {} {} ({})",
            t.id,
            t.direction,
            t.symbol,
            t.status
        );
        Ok(t)
    }

    fn update_trade(&self, user_id: &str, trade_id: i64, update: TradeUpdate) -> Result<Trade> {
        let mut t = self.get_trade(user_id, trade_id)?;
        t.apply_update(update, Utc::now())?;
        self.conn.execute(
            "UPDATE trades SET symbol=?1, direction=?2, entry_price=?3, size=?4,
                exit_price=?5, stop_loss=?6, take_profit=?7, strategy=?8, notes=?9,
                status=?10, pnl=?11, entry_date=?12, exit_date=?13
             WHERE id=?14 AND user_id=?15",
            params![
                t.symbol,
                t.direction,
                t.entry_price.to_string(),
                t.size.to_string(),
                opt_str(t.exit_price),
                opt_str(t.stop_loss),
                opt_str(t.take_profit),
                t.strategy,
                t.notes,
                t.status,
                opt_str(t.pnl),
                t.entry_date,
                t.exit_date,
                t.id,
                user_id,
            ],
        )?;
        log::info!("updated trade {} ({})", t.id, t.status);
        Ok(t)
    }

    fn delete_trade(&self, user_id: &str, trade_id: i64) -> Result<()> {
        let n = self.conn.execute(
            "DELETE FROM trades WHERE id=?1 AND user_id=?2",
            params![trade_id, user_id],
        )?;
        if n == 0 {
            return Err(Error::not_found(format!("Trade {}", trade_id)));
        }
        log::info!("deleted trade {}", trade_id);
        Ok(())
    }

    fn get_profile(&self, user_id: &str) -> Result<Profile> {
        let p = self
            .conn
            .query_row(
                "SELECT user_id, bio, trading_style, location FROM profiles WHERE user_id=?1",
                params![user_id],
                |r| {
                    Ok(Profile {
                        user_id: r.get(0)?,
                        bio: r.get(1)?,
                        trading_style: r.get(2)?,
                        location: r.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(p.unwrap_or_else(|| Profile::empty(user_id)))
    }

    fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        self.conn.execute(
            "INSERT INTO profiles(user_id, bio, trading_style, location, updated_at)
             VALUES (?1, ?2, ?3, ?4, datetime('now'))
             ON CONFLICT(user_id) DO UPDATE SET
                bio=excluded.bio,
                trading_style=excluded.trading_style,
                location=excluded.location,
                updated_at=excluded.updated_at",
            params![
                profile.user_id,
                profile.bio,
                profile.trading_style,
                profile.location
            ],
        )?;
        log::info!("saved profile for '{}'", profile.user_id);
        Ok(())
    }
}
