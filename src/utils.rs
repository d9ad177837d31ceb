// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::{Decimal, RoundingStrategy};

pub const USER_ENV: &str = "TRADELOG_USER";
pub const FALLBACK_USER: &str = "local";

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Accepts RFC 3339 timestamps or plain dates (midnight UTC).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let d = parse_date(s)?;
    Ok(d.and_hms_opt(0, 0, 0)
        .context("midnight is always valid")?
        .and_utc())
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Round half away from zero and pad to exactly `dp` fractional digits.
/// Zero never carries a sign.
pub fn fmt_fixed(d: Decimal, dp: u32) -> String {
    let mut r = d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    if r.is_zero() {
        r.set_sign_positive(true);
    }
    format!("{:.*}", dp as usize, r)
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn clear_setting(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM settings WHERE key=?1", params![key])?;
    Ok(())
}

/// Resolve the acting user: `--user`, then `TRADELOG_USER`, then the stored
/// default, then `local`.
pub fn current_user(conn: &Connection, m: &clap::ArgMatches) -> Result<String> {
    let flag = m
        .try_get_one::<String>("user")
        .ok()
        .flatten()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if let Some(u) = flag {
        return Ok(u);
    }
    if let Ok(u) = std::env::var(USER_ENV) {
        if !u.trim().is_empty() {
            return Ok(u.trim().to_string());
        }
    }
    Ok(get_setting(conn, "default_user")?.unwrap_or_else(|| FALLBACK_USER.to_string()))
}

fn active_key(user_id: &str) -> String {
    format!("active_account:{}", user_id)
}

pub fn get_active_account(conn: &Connection, user_id: &str) -> Result<Option<i64>> {
    match get_setting(conn, &active_key(user_id))? {
        Some(raw) => Ok(raw.parse::<i64>().ok()),
        None => Ok(None),
    }
}

pub fn set_active_account(conn: &Connection, user_id: &str, account_id: i64) -> Result<()> {
    set_setting(conn, &active_key(user_id), &account_id.to_string())
}

pub fn clear_active_account(conn: &Connection, user_id: &str) -> Result<()> {
    clear_setting(conn, &active_key(user_id))
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn opt_text(v: Option<impl ToString>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fmt_fixed_pads_and_rounds_half_up() {
        assert_eq!(fmt_fixed(dec!(110), 2), "110.00");
        assert_eq!(fmt_fixed(dec!(66.666), 1), "66.7");
        assert_eq!(fmt_fixed(dec!(0.125), 2), "0.13");
        assert_eq!(fmt_fixed(dec!(-0.125), 2), "-0.13");
    }

    #[test]
    fn fmt_fixed_drops_sign_on_zero() {
        assert_eq!(fmt_fixed(dec!(-0.001), 2), "0.00");
        assert_eq!(fmt_fixed(Decimal::ZERO, 1), "0.0");
    }

    #[test]
    fn parse_timestamp_accepts_dates_and_rfc3339() {
        let d = parse_timestamp("2025-03-04").unwrap();
        assert_eq!(d.to_rfc3339(), "2025-03-04T00:00:00+00:00");
        let t = parse_timestamp("2025-03-04T23:30:00-02:00").unwrap();
        assert_eq!(t.date_naive().to_string(), "2025-03-05");
        assert!(parse_timestamp("04/03/2025").is_err());
    }
}
