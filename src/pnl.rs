// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Realized profit and loss for a single position.

use crate::errors::{Error, Result};
use crate::models::{Direction, TradeStatus};
use rust_decimal::Decimal;

/// `(exit - entry) * size`, negated for shorts.
///
/// Only defined for a closed position, so the exit price is not optional
/// here. Use [`settle`] when the exit may be missing. `None` when the result
/// does not fit in a `Decimal`.
pub fn realized_pnl(
    entry_price: Decimal,
    exit_price: Decimal,
    size: Decimal,
    direction: Direction,
) -> Option<Decimal> {
    let gross = exit_price.checked_sub(entry_price)?.checked_mul(size)?;
    Some(match direction {
        Direction::Long => gross,
        Direction::Short => -gross,
    })
}

impl TradeStatus {
    pub fn from_pnl(pnl: Decimal) -> Self {
        if pnl > Decimal::ZERO {
            TradeStatus::Win
        } else if pnl < Decimal::ZERO {
            TradeStatus::Loss
        } else {
            TradeStatus::Breakeven
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub pnl: Decimal,
    pub status: TradeStatus,
}

/// P&L and status for a position, or `None` while it is still open.
///
/// Fails with `InvalidInput` when the P&L overflows.
pub fn settle(
    direction: Direction,
    entry_price: Decimal,
    size: Decimal,
    exit_price: Option<Decimal>,
) -> Result<Option<Settlement>> {
    let Some(exit) = exit_price else {
        return Ok(None);
    };
    let mut pnl = realized_pnl(entry_price, exit, size, direction).ok_or_else(|| {
        Error::invalid(format!(
            "P&L of {} x ({} -> {}) is out of range",
            size, entry_price, exit
        ))
    })?;
    if pnl.is_zero() {
        pnl.set_sign_positive(true);
    }
    Ok(Some(Settlement {
        pnl,
        status: TradeStatus::from_pnl(pnl),
    }))
}
