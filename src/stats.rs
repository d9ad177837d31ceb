// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Account performance aggregation.
//!
//! Pure functions over a slice of closed trades. Fetching and ordering the
//! trades happens in [`crate::report`].

use crate::models::Trade;
use crate::utils::fmt_fixed;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Stand-in for an infinite profit factor (profits with no losses).
pub const PROFIT_FACTOR_SENTINEL: Decimal = Decimal::from_parts(999, 0, 0, false, 0);

pub const START_LABEL: &str = "Start";
pub const MISSING_DATE_LABEL: &str = "N/A";
const EQUITY_LABEL_FORMAT: &str = "%b %-d";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    #[serde(rename = "netPnL")]
    pub net_pnl: String,
    pub win_rate: String,
    pub profit_factor: String,
    pub current_balance: String,
    pub initial_balance: String,
    pub equity_curve: Vec<EquityPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub label: String,
    pub balance: Decimal,
    pub pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyProfit {
    pub name: String,
    pub value: Decimal,
}

fn money(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn trade_pnl(t: &Trade) -> Decimal {
    t.pnl.unwrap_or(Decimal::ZERO)
}

#[derive(Debug, Default)]
struct Totals {
    count: usize,
    wins: usize,
    net: Decimal,
    gross_profit: Decimal,
    gross_loss: Decimal,
}

impl Totals {
    fn add(&mut self, pnl: Decimal) {
        self.count += 1;
        self.net = self.net.saturating_add(pnl);
        if pnl > Decimal::ZERO {
            self.gross_profit = self.gross_profit.saturating_add(pnl);
            self.wins += 1;
        } else {
            // breakeven lands here too and adds nothing
            self.gross_loss = self.gross_loss.saturating_add(pnl.abs());
        }
    }

    fn win_rate(&self) -> Decimal {
        if self.count == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.wins) * Decimal::ONE_HUNDRED / Decimal::from(self.count)
    }

    fn profit_factor(&self) -> Decimal {
        if self.gross_loss > Decimal::ZERO {
            self.gross_profit
                .checked_div(self.gross_loss)
                .unwrap_or(PROFIT_FACTOR_SENTINEL)
        } else if self.gross_profit > Decimal::ZERO {
            PROFIT_FACTOR_SENTINEL
        } else {
            Decimal::ZERO
        }
    }
}

/// Headline statistics for one account.
///
/// `closed_trades` must be ordered by exit time ascending; the totals do not
/// care but the embedded equity curve does. A closed trade with no recorded
/// P&L counts as a zero-P&L trade. Sums saturate at the `Decimal` range and a
/// profit factor too large to represent reports the sentinel.
pub fn compute_summary(closed_trades: &[Trade], initial_balance: Decimal) -> Summary {
    let mut totals = Totals::default();
    for t in closed_trades {
        totals.add(trade_pnl(t));
    }
    log::debug!(
        "summary over {} trades: net={} wins={}",
        totals.count,
        totals.net,
        totals.wins
    );

    Summary {
        total_trades: totals.count,
        wins: totals.wins,
        losses: totals.count - totals.wins,
        net_pnl: fmt_fixed(totals.net, 2),
        win_rate: fmt_fixed(totals.win_rate(), 1),
        profit_factor: fmt_fixed(totals.profit_factor(), 2),
        current_balance: fmt_fixed(initial_balance.saturating_add(totals.net), 2),
        initial_balance: initial_balance.to_string(),
        equity_curve: compute_equity_curve(closed_trades, initial_balance),
    }
}

/// Running balance after each trade, preceded by a `Start` point at the
/// initial balance. Points follow trade order, so two trades closing on the
/// same day are two points.
pub fn compute_equity_curve(closed_trades: &[Trade], initial_balance: Decimal) -> Vec<EquityPoint> {
    let mut curve = Vec::with_capacity(closed_trades.len() + 1);
    curve.push(EquityPoint {
        label: START_LABEL.to_string(),
        balance: initial_balance,
        pnl: Decimal::ZERO,
    });

    let mut balance = initial_balance;
    for t in closed_trades {
        let pnl = trade_pnl(t);
        balance = balance.saturating_add(pnl);
        let label = match t.exit_date {
            Some(d) => d.format(EQUITY_LABEL_FORMAT).to_string(),
            None => MISSING_DATE_LABEL.to_string(),
        };
        curve.push(EquityPoint {
            label,
            balance: money(balance),
            pnl,
        });
    }
    curve
}

/// Net P&L per UTC calendar day of exit. Trades missing an exit date or a
/// P&L are skipped entirely.
pub fn compute_calendar(closed_trades: &[Trade]) -> Vec<CalendarDay> {
    let mut days: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for t in closed_trades {
        if let (Some(exit), Some(pnl)) = (t.exit_date, t.pnl) {
            let day = days.entry(exit.date_naive()).or_insert(Decimal::ZERO);
            *day = day.saturating_add(pnl);
        }
    }
    days.into_iter()
        .map(|(date, pnl)| CalendarDay { date, pnl })
        .collect()
}

/// Profit per strategy label, counting winning trades only.
///
/// Labels are grouped verbatim: "Breakout" and "breakout" are different
/// strategies. Sorted by profit descending, then name.
pub fn compute_strategy_breakdown(closed_trades: &[Trade]) -> Vec<StrategyProfit> {
    let mut agg: HashMap<&str, Decimal> = HashMap::new();
    for t in closed_trades {
        let (Some(pnl), Some(name)) = (t.pnl, t.strategy.as_deref()) else {
            continue;
        };
        if pnl > Decimal::ZERO {
            let total = agg.entry(name).or_insert(Decimal::ZERO);
            *total = total.saturating_add(pnl);
        }
    }

    let mut items: Vec<StrategyProfit> = agg
        .into_iter()
        .map(|(name, total)| StrategyProfit {
            name: name.to_string(),
            value: money(total),
        })
        .collect();
    items.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, TradeStatus};
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn closed(
        id: i64,
        pnl: Decimal,
        exit: Option<DateTime<Utc>>,
        strategy: Option<&str>,
    ) -> Trade {
        Trade {
            id,
            user_id: "u1".into(),
            account_id: 1,
            symbol: "BTCUSDT".into(),
            direction: Direction::Long,
            entry_price: dec!(100),
            size: dec!(1),
            exit_price: Some(dec!(100).saturating_add(pnl)),
            stop_loss: None,
            take_profit: None,
            strategy: strategy.map(String::from),
            notes: None,
            status: TradeStatus::from_pnl(pnl),
            pnl: Some(pnl),
            entry_date: at(2025, 1, 1, 9),
            exit_date: exit,
        }
    }

    #[test]
    fn empty_summary() {
        let s = compute_summary(&[], dec!(1000.00));
        assert_eq!(s.total_trades, 0);
        assert_eq!(s.net_pnl, "0.00");
        assert_eq!(s.win_rate, "0.0");
        assert_eq!(s.profit_factor, "0.00");
        assert_eq!(s.current_balance, "1000.00");
        assert_eq!(s.equity_curve.len(), 1);
    }

    #[test]
    fn all_winners_use_sentinel() {
        let trades = vec![
            closed(1, dec!(100), Some(at(2025, 1, 2, 10)), None),
            closed(2, dec!(10), Some(at(2025, 1, 3, 10)), None),
        ];
        let s = compute_summary(&trades, dec!(1000));
        assert_eq!(s.total_trades, 2);
        assert_eq!(s.net_pnl, "110.00");
        assert_eq!(s.win_rate, "100.0");
        assert_eq!(s.profit_factor, "999.00");
        assert_eq!(s.current_balance, "1110.00");
        assert_eq!(s.wins, 2);
        assert_eq!(s.losses, 0);
    }

    #[test]
    fn mixed_results_profit_factor_and_win_rate() {
        let trades = vec![
            closed(1, dec!(30), Some(at(2025, 1, 2, 10)), None),
            closed(2, dec!(-20), Some(at(2025, 1, 2, 11)), None),
            closed(3, dec!(0), Some(at(2025, 1, 3, 10)), None),
        ];
        let s = compute_summary(&trades, dec!(500));
        assert_eq!(s.total_trades, 3);
        assert_eq!(s.win_rate, "33.3");
        assert_eq!(s.profit_factor, "1.50");
        assert_eq!(s.net_pnl, "10.00");
        assert_eq!(s.current_balance, "510.00");
        // breakeven is not a win, so it is reported with the losses
        assert_eq!(s.losses, 2);
    }

    #[test]
    fn huge_profit_over_tiny_loss_uses_sentinel() {
        let trades = vec![
            closed(1, dec!(100000000000000000000), Some(at(2025, 1, 2, 10)), None),
            closed(2, dec!(-0.000000000001), Some(at(2025, 1, 3, 10)), None),
        ];
        let s = compute_summary(&trades, dec!(1000));
        assert_eq!(s.profit_factor, "999.00");
        assert_eq!(s.wins, 1);
    }

    #[test]
    fn sums_saturate_instead_of_panicking() {
        let t = Some(at(2025, 1, 2, 10));
        let trades = vec![
            closed(1, Decimal::MAX, t, Some("A")),
            closed(2, Decimal::MAX, t, Some("A")),
        ];
        let s = compute_summary(&trades, dec!(1000));
        assert_eq!(s.total_trades, 2);
        assert_eq!(s.equity_curve.last().unwrap().balance, Decimal::MAX);
        assert_eq!(compute_calendar(&trades)[0].pnl, Decimal::MAX);
        assert_eq!(compute_strategy_breakdown(&trades)[0].value, Decimal::MAX);
    }

    #[test]
    fn all_breakeven_has_zero_profit_factor() {
        let trades = vec![closed(1, dec!(0), Some(at(2025, 1, 2, 10)), None)];
        let s = compute_summary(&trades, dec!(1000));
        assert_eq!(s.profit_factor, "0.00");
        assert_eq!(s.win_rate, "0.0");
        assert_eq!(s.total_trades, 1);
    }

    #[test]
    fn equity_curve_starts_at_initial_balance() {
        let trades = vec![
            closed(1, dec!(12.345), Some(at(2025, 3, 4, 10)), None),
            closed(2, dec!(-2.5), Some(at(2025, 3, 4, 12)), None),
            closed(3, dec!(1), None, None),
        ];
        let curve = compute_equity_curve(&trades, dec!(1000));
        assert_eq!(curve.len(), trades.len() + 1);
        assert_eq!(
            curve[0],
            EquityPoint {
                label: "Start".into(),
                balance: dec!(1000),
                pnl: Decimal::ZERO
            }
        );
        assert_eq!(curve[1].label, "Mar 4");
        assert_eq!(curve[1].balance, dec!(1012.35));
        assert_eq!(curve[1].pnl, dec!(12.345));
        // same day, still its own point
        assert_eq!(curve[2].label, "Mar 4");
        assert_eq!(curve[2].balance, dec!(1009.85));
        assert_eq!(curve[3].label, "N/A");
        assert_eq!(curve[3].balance, dec!(1010.85));
    }

    #[test]
    fn calendar_sums_same_day_and_skips_missing() {
        let mut no_pnl = closed(4, dec!(5), Some(at(2025, 2, 2, 8)), None);
        no_pnl.pnl = None;
        let trades = vec![
            closed(1, dec!(30), Some(at(2025, 2, 1, 1)), None),
            closed(2, dec!(-10), Some(at(2025, 2, 1, 23)), None),
            closed(3, dec!(7), None, None),
            no_pnl,
            closed(5, dec!(0), Some(at(2025, 2, 3, 12)), None),
        ];
        let cal = compute_calendar(&trades);
        assert_eq!(
            cal,
            vec![
                CalendarDay {
                    date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                    pnl: dec!(20)
                },
                CalendarDay {
                    date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
                    pnl: dec!(0)
                },
            ]
        );
    }

    #[test]
    fn strategy_breakdown_counts_winners_only() {
        let t = Some(at(2025, 2, 1, 1));
        let trades = vec![
            closed(1, dec!(50), t, Some("A")),
            closed(2, dec!(-20), t, Some("A")),
            closed(3, dec!(30), t, Some("B")),
            closed(4, dec!(0), t, Some("C")),
            closed(5, dec!(99), t, None),
        ];
        let out = compute_strategy_breakdown(&trades);
        assert_eq!(
            out,
            vec![
                StrategyProfit {
                    name: "A".into(),
                    value: dec!(50)
                },
                StrategyProfit {
                    name: "B".into(),
                    value: dec!(30)
                },
            ]
        );
    }

    #[test]
    fn strategy_labels_are_case_sensitive() {
        let t = Some(at(2025, 2, 1, 1));
        let trades = vec![
            closed(1, dec!(10.004), t, Some("Breakout")),
            closed(2, dec!(20), t, Some("breakout")),
            closed(3, dec!(5.001), t, Some("Breakout")),
        ];
        let out = compute_strategy_breakdown(&trades);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "breakout");
        assert_eq!(out[1].name, "Breakout");
        assert_eq!(out[1].value, dec!(15.01));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let t = Some(at(2025, 2, 1, 1));
        let trades = vec![
            closed(1, dec!(50), t, Some("A")),
            closed(2, dec!(-20), Some(at(2025, 2, 2, 1)), Some("A")),
            closed(3, dec!(30), t, Some("B")),
        ];
        assert_eq!(
            compute_summary(&trades, dec!(1000)),
            compute_summary(&trades, dec!(1000))
        );
        assert_eq!(compute_calendar(&trades), compute_calendar(&trades));
        assert_eq!(
            compute_strategy_breakdown(&trades),
            compute_strategy_breakdown(&trades)
        );
        assert_eq!(
            compute_equity_curve(&trades, dec!(1000)),
            compute_equity_curve(&trades, dec!(1000))
        );
    }

    #[test]
    fn summary_serializes_with_dashboard_field_names() {
        let s = compute_summary(&[], dec!(1000));
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["totalTrades"], 0);
        assert_eq!(v["netPnL"], "0.00");
        assert_eq!(v["winRate"], "0.0");
        assert_eq!(v["profitFactor"], "0.00");
        assert_eq!(v["currentBalance"], "1000.00");
        assert_eq!(v["initialBalance"], "1000");
        assert_eq!(v["equityCurve"][0]["label"], "Start");
        assert_eq!(v["equityCurve"][0]["balance"], "1000");
    }
}
