// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::{Error, Result};
use crate::pnl::{self, Settlement};
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_INITIAL_BALANCE: &str = "1000";
pub const DEFAULT_TRADING_STYLE: &str = "Day Trader";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub initial_balance: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub initial_balance: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" => Ok(Direction::Long),
            "SHORT" => Ok(Direction::Short),
            other => Err(Error::invalid(format!(
                "unknown direction '{}', expected LONG or SHORT",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Open,
    Win,
    Loss,
    Breakeven,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "OPEN",
            TradeStatus::Win => "WIN",
            TradeStatus::Loss => "LOSS",
            TradeStatus::Breakeven => "BREAKEVEN",
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(TradeStatus::Open),
            "WIN" => Ok(TradeStatus::Win),
            "LOSS" => Ok(TradeStatus::Loss),
            "BREAKEVEN" | "BE" => Ok(TradeStatus::Breakeven),
            other => Err(Error::invalid(format!("unknown trade status '{}'", other))),
        }
    }
}

macro_rules! text_enum_sql {
    ($t:ty) => {
        impl ToSql for $t {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $t {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: Error| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_enum_sql!(Direction);
text_enum_sql!(TradeStatus);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: i64,
    pub user_id: String,
    pub account_id: i64,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub size: Decimal,
    pub exit_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub strategy: Option<String>,
    pub notes: Option<String>,
    pub status: TradeStatus,
    pub pnl: Option<Decimal>,
    pub entry_date: DateTime<Utc>,
    pub exit_date: Option<DateTime<Utc>>,
}

impl Trade {
    pub fn is_closed(&self) -> bool {
        self.exit_price.is_some()
    }

    /// Recompute pnl, status and exit date from the current prices.
    ///
    /// A trade that stays closed keeps its exit date unless `exit_date` is
    /// given; a trade that is closing gets `exit_date` or `now`.
    fn settle(&mut self, exit_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<()> {
        match pnl::settle(self.direction, self.entry_price, self.size, self.exit_price)? {
            Some(Settlement { pnl, status }) => {
                self.pnl = Some(pnl);
                self.status = status;
                self.exit_date = exit_date.or(self.exit_date).or(Some(now));
            }
            None => {
                self.pnl = None;
                self.status = TradeStatus::Open;
                self.exit_date = None;
            }
        }
        Ok(())
    }

    pub fn apply_update(&mut self, update: TradeUpdate, now: DateTime<Utc>) -> Result<()> {
        if let Some(symbol) = update.symbol {
            self.symbol = normalize_symbol(&symbol)?;
        }
        if let Some(direction) = update.direction {
            self.direction = direction;
        }
        if let Some(entry) = update.entry_price {
            self.entry_price = positive("entry price", entry)?;
        }
        if let Some(size) = update.size {
            self.size = positive("size", size)?;
        }
        if let Some(entry_date) = update.entry_date {
            self.entry_date = entry_date;
        }
        if update.reopen {
            self.exit_price = None;
        } else if let Some(exit) = update.exit_price {
            self.exit_price = Some(exit);
        }
        if let Some(stop_loss) = update.stop_loss {
            self.stop_loss = stop_loss;
        }
        if let Some(take_profit) = update.take_profit {
            self.take_profit = take_profit;
        }
        if let Some(strategy) = update.strategy {
            self.strategy = non_blank(strategy);
        }
        if let Some(notes) = update.notes {
            self.notes = non_blank(notes);
        }
        self.settle(update.exit_date, now)
    }
}

#[derive(Debug, Clone)]
pub struct NewTrade {
    pub account_id: i64,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub size: Decimal,
    pub exit_price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub strategy: Option<String>,
    pub notes: Option<String>,
    pub entry_date: Option<DateTime<Utc>>,
    pub exit_date: Option<DateTime<Utc>>,
}

impl NewTrade {
    pub fn open(
        account_id: i64,
        symbol: &str,
        direction: Direction,
        entry_price: Decimal,
        size: Decimal,
    ) -> Self {
        NewTrade {
            account_id,
            symbol: symbol.to_string(),
            direction,
            entry_price,
            size,
            exit_price: None,
            stop_loss: None,
            take_profit: None,
            strategy: None,
            notes: None,
            entry_date: None,
            exit_date: None,
        }
    }

    /// Validate and build the stored record. The id is left at 0 for the
    /// store to assign.
    pub fn into_trade(self, user_id: &str, now: DateTime<Utc>) -> Result<Trade> {
        let mut trade = Trade {
            id: 0,
            user_id: user_id.to_string(),
            account_id: self.account_id,
            symbol: normalize_symbol(&self.symbol)?,
            direction: self.direction,
            entry_price: positive("entry price", self.entry_price)?,
            size: positive("size", self.size)?,
            exit_price: self.exit_price,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            strategy: non_blank(self.strategy),
            notes: non_blank(self.notes),
            status: TradeStatus::Open,
            pnl: None,
            entry_date: self.entry_date.unwrap_or(now),
            exit_date: None,
        };
        trade.settle(self.exit_date, now)?;
        Ok(trade)
    }
}

/// Partial edit of a trade. `None` leaves a field untouched. For the
/// optional fields `Some(None)` clears the stored value, as does a blank
/// strategy or note. `reopen` clears the exit price and takes precedence
/// over `exit_price`.
#[derive(Debug, Clone, Default)]
pub struct TradeUpdate {
    pub symbol: Option<String>,
    pub direction: Option<Direction>,
    pub entry_price: Option<Decimal>,
    pub size: Option<Decimal>,
    pub exit_price: Option<Decimal>,
    pub stop_loss: Option<Option<Decimal>>,
    pub take_profit: Option<Option<Decimal>>,
    pub strategy: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub entry_date: Option<DateTime<Utc>>,
    pub exit_date: Option<DateTime<Utc>>,
    pub reopen: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TradeFilter {
    pub account_id: Option<i64>,
    pub symbol: Option<String>,
    pub status: Option<TradeStatus>,
    pub limit: Option<usize>,
}

impl TradeFilter {
    pub fn matches(&self, t: &Trade) -> bool {
        self.account_id.is_none_or(|id| t.account_id == id)
            && self
                .symbol
                .as_deref()
                .is_none_or(|s| t.symbol.eq_ignore_ascii_case(s.trim()))
            && self.status.is_none_or(|s| t.status == s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub bio: String,
    pub trading_style: String,
    pub location: String,
}

impl Profile {
    pub fn empty(user_id: &str) -> Self {
        Profile {
            user_id: user_id.to_string(),
            bio: String::new(),
            trading_style: DEFAULT_TRADING_STYLE.to_string(),
            location: String::new(),
        }
    }
}

fn normalize_symbol(raw: &str) -> Result<String> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(Error::invalid("symbol must not be empty"));
    }
    Ok(s.to_uppercase())
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn positive(field: &str, v: Decimal) -> Result<Decimal> {
    if v <= Decimal::ZERO {
        return Err(Error::invalid(format!("{} must be positive, got {}", field, v)));
    }
    Ok(v)
}
