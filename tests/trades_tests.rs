// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use tradelog::commands::{accounts, reports, trades};
use tradelog::{cli, db};

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["tradelog", "--user", "alice"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("account", sub)) => accounts::handle(conn, sub),
        Some(("trade", sub)) => trades::handle(conn, sub),
        Some(("report", sub)) => reports::handle(conn, sub),
        other => panic!("unexpected command {:?}", other.map(|(n, _)| n)),
    }
}

fn list_matches(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["tradelog", "--user", "alice", "trade", "list"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("trade", trade_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = trade_m.subcommand() {
            return list_m.clone();
        }
    }
    panic!("no trade list subcommand");
}

#[test]
fn add_close_and_list_trades() {
    let conn = setup();
    run(&conn, &["account", "add", "--name", "Binance", "--balance", "500"]).unwrap();
    run(
        &conn,
        &[
            "trade", "add", "--symbol", " btcusdt ", "--direction", "long", "--entry", "100",
            "--size", "2", "--entry-date", "2025-06-01",
        ],
    )
    .unwrap();
    run(
        &conn,
        &[
            "trade", "add", "--symbol", "ethusdt", "--direction", "SHORT", "--entry", "50",
            "--exit", "40", "--size", "1", "--strategy", "Fade", "--entry-date", "2025-06-02",
            "--exit-date", "2025-06-02T18:00:00Z",
        ],
    )
    .unwrap();

    let rows = trades::query_rows(&conn, &list_matches(&[])).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].symbol, "ETHUSDT");
    assert_eq!(rows[0].status, "WIN");
    assert_eq!(rows[0].pnl, "10.00");
    assert_eq!(rows[0].account, "Binance");
    assert_eq!(rows[1].symbol, "BTCUSDT");
    assert_eq!(rows[1].status, "OPEN");
    assert_eq!(rows[1].pnl, "");

    let open_id = rows[1].id.to_string();
    run(
        &conn,
        &["trade", "edit", "--id", &open_id, "--exit", "150", "--exit-date", "2025-06-03"],
    )
    .unwrap();

    let wins = trades::query_rows(&conn, &list_matches(&["--status", "win"])).unwrap();
    assert_eq!(wins.len(), 2);
    let btc = wins.iter().find(|r| r.symbol == "BTCUSDT").unwrap();
    assert_eq!(btc.pnl, "100.00");
    assert_eq!(btc.exit_date, "2025-06-03 00:00");

    let limited = trades::query_rows(&conn, &list_matches(&["--limit", "1"])).unwrap();
    assert_eq!(limited.len(), 1);
}

#[test]
fn reopen_clears_pnl_and_exit() {
    let conn = setup();
    run(&conn, &["account", "add", "--name", "Main"]).unwrap();
    run(
        &conn,
        &[
            "trade", "add", "--symbol", "sol", "--direction", "long", "--entry", "20",
            "--exit", "19", "--size", "10",
        ],
    )
    .unwrap();
    let rows = trades::query_rows(&conn, &list_matches(&[])).unwrap();
    assert_eq!(rows[0].status, "LOSS");
    assert_eq!(rows[0].pnl, "-10.00");

    let id = rows[0].id.to_string();
    run(&conn, &["trade", "edit", "--id", &format!(" {} ", id), "--reopen"]).unwrap();
    let rows = trades::query_rows(&conn, &list_matches(&[])).unwrap();
    assert_eq!(rows[0].status, "OPEN");
    assert_eq!(rows[0].pnl, "");
    assert_eq!(rows[0].exit_price, "");
    assert_eq!(rows[0].exit_date, "");
}

#[test]
fn trades_go_to_the_active_account() {
    let conn = setup();
    run(&conn, &["account", "add", "--name", "First"]).unwrap();
    run(&conn, &["account", "add", "--name", "Second"]).unwrap();
    run(&conn, &["account", "use", "--name", "First"]).unwrap();
    run(
        &conn,
        &["trade", "add", "--symbol", "x", "--direction", "long", "--entry", "1", "--size", "1"],
    )
    .unwrap();

    let first = trades::query_rows(&conn, &list_matches(&["--account", "First"])).unwrap();
    let second = trades::query_rows(&conn, &list_matches(&["--account", "Second"])).unwrap();
    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
}

#[test]
fn invalid_trade_input_is_rejected() {
    let conn = setup();
    run(&conn, &["account", "add", "--name", "Main"]).unwrap();
    let err = run(
        &conn,
        &["trade", "add", "--symbol", "x", "--direction", "long", "--entry", "1", "--size=-3"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("size must be positive"));

    let err = run(
        &conn,
        &["trade", "add", "--symbol", "x", "--direction", "long", "--entry", "abc", "--size", "1"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("Invalid decimal"));
}

#[test]
fn trade_commands_need_an_account() {
    let conn = setup();
    let err = run(
        &conn,
        &["trade", "add", "--symbol", "x", "--direction", "long", "--entry", "1", "--size", "1"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("No account"));
}

#[test]
fn other_users_trades_are_invisible() {
    let conn = setup();
    run(&conn, &["account", "add", "--name", "Main"]).unwrap();
    run(
        &conn,
        &["trade", "add", "--symbol", "x", "--direction", "long", "--entry", "1", "--size", "1"],
    )
    .unwrap();

    let matches = cli::build_cli().get_matches_from(["tradelog", "--user", "bob", "trade", "list"]);
    let (_, trade_m) = matches.subcommand().unwrap();
    let (_, list_m) = trade_m.subcommand().unwrap();
    assert!(trades::query_rows(&conn, list_m).unwrap().is_empty());

    let rows = trades::query_rows(&conn, &list_matches(&[])).unwrap();
    let id = rows[0].id.to_string();
    let matches = cli::build_cli()
        .get_matches_from(["tradelog", "--user", "bob", "trade", "rm", "--id", id.as_str()]);
    let (_, trade_m) = matches.subcommand().unwrap();
    let err = trades::handle(&conn, trade_m).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn report_loads_for_active_account() {
    let conn = setup();
    run(&conn, &["account", "add", "--name", "Main", "--balance", "1000"]).unwrap();
    run(
        &conn,
        &[
            "trade", "add", "--symbol", "x", "--direction", "long", "--entry", "100", "--exit",
            "150", "--size", "2", "--exit-date", "2025-01-02",
        ],
    )
    .unwrap();
    let matches =
        cli::build_cli().get_matches_from(["tradelog", "--user", "alice", "report", "summary"]);
    let (_, report_m) = matches.subcommand().unwrap();
    let (_, summary_m) = report_m.subcommand().unwrap();
    let report = reports::load(&conn, summary_m).unwrap();
    assert_eq!(report.account.name, "Main");
    assert_eq!(report.summary.net_pnl, "100.00");
    assert_eq!(report.summary.current_balance, "1100.00");
    assert_eq!(report.summary.equity_curve[1].label, "Jan 2");

    run(&conn, &["report", "summary"]).unwrap();
}

#[test]
fn edit_clears_optional_fields() {
    let conn = setup();
    run(&conn, &["account", "add", "--name", "Main"]).unwrap();
    run(
        &conn,
        &[
            "trade", "add", "--symbol", "x", "--direction", "long", "--entry", "10", "--size",
            "1", "--stop", "9", "--take", "15", "--strategy", "Oops", "--note", "typo",
        ],
    )
    .unwrap();
    let id = trades::query_rows(&conn, &list_matches(&[])).unwrap()[0].id.to_string();

    run(
        &conn,
        &[
            "trade", "edit", "--id", &id, "--clear-stop", "--clear-strategy", "--note", "",
        ],
    )
    .unwrap();
    let row = &trades::query_rows(&conn, &list_matches(&[])).unwrap()[0];
    assert_eq!(row.stop_loss, "");
    assert_eq!(row.strategy, "");
    assert_eq!(row.notes, "");
    assert_eq!(row.take_profit, "15");

    run(&conn, &["trade", "edit", "--id", &id, "--clear-take"]).unwrap();
    let row = &trades::query_rows(&conn, &list_matches(&[])).unwrap()[0];
    assert_eq!(row.take_profit, "");
}
