// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, arg, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(arg!(--json "Print as pretty JSON"))
        .arg(arg!(--jsonl "Print as JSON lines"))
}

fn account_opt() -> Arg {
    arg!(--account <ACCOUNT> "Account name or id (defaults to the active account)")
}

fn clear_flag(id: &'static str, long: &'static str, field: &'static str) -> Arg {
    Arg::new(id)
        .long(long)
        .action(ArgAction::SetTrue)
        .conflicts_with(field)
        .help(format!("Remove the stored --{}", field))
}

fn trade_fields(cmd: Command) -> Command {
    cmd.arg(arg!(--exit <PRICE> "Exit price (closes the trade)"))
        .arg(arg!(--stop <PRICE> "Stop loss"))
        .arg(arg!(--take <PRICE> "Take profit"))
        .arg(arg!(--strategy <NAME> "Strategy label"))
        .arg(arg!(--note <TEXT> "Free-form notes"))
        .arg(
            Arg::new("entry_date")
                .long("entry-date")
                .value_name("DATE")
                .help("Entry time, YYYY-MM-DD or RFC 3339 (default: now)"),
        )
        .arg(
            Arg::new("exit_date")
                .long("exit-date")
                .value_name("DATE")
                .help("Exit time, YYYY-MM-DD or RFC 3339 (default: now when closing)"),
        )
}

pub fn build_cli() -> Command {
    Command::new("tradelog")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Personal trading journal: accounts, trades and performance reports")
        .arg(arg!(--user <ID> "Act as this user id").global(true))
        .subcommand(Command::new("init").about("Create the journal database"))
        .subcommand(
            Command::new("config")
                .about("Journal settings")
                .subcommand(Command::new("show").about("Show resolved settings"))
                .subcommand(
                    Command::new("set-user")
                        .about("Set the default user id")
                        .arg(arg!(<ID> "User id")),
                ),
        )
        .subcommand(
            Command::new("account")
                .about("Manage trading accounts")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(
                            arg!(--balance <AMOUNT> "Initial balance")
                                .default_value(crate::models::DEFAULT_INITIAL_BALANCE),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("use")
                        .about("Select the active account")
                        .arg(arg!(--name <NAME>).required(true)),
                )
                .subcommand(
                    Command::new("set-balance")
                        .about("Edit the initial balance; reports are recomputed")
                        .arg(account_opt())
                        .arg(arg!(--balance <AMOUNT>).required(true)),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete an account and all its trades")
                        .arg(arg!(--name <NAME>).required(true)),
                ),
        )
        .subcommand(
            Command::new("trade")
                .about("Record and review trades")
                .subcommand(trade_fields(
                    Command::new("add")
                        .arg(account_opt())
                        .arg(arg!(--symbol <SYMBOL>).required(true))
                        .arg(
                            arg!(--direction <DIR> "long or short")
                                .required(true)
                                .value_parser(["long", "short", "LONG", "SHORT"]),
                        )
                        .arg(arg!(--entry <PRICE> "Entry price").required(true))
                        .arg(arg!(--size <SIZE> "Position size").required(true)),
                ))
                .subcommand(trade_fields(
                    Command::new("edit")
                        .about("Edit or close a trade")
                        .arg(arg!(--id <ID>).required(true))
                        .arg(arg!(--symbol <SYMBOL>))
                        .arg(
                            arg!(--direction <DIR>)
                                .value_parser(["long", "short", "LONG", "SHORT"]),
                        )
                        .arg(arg!(--entry <PRICE>))
                        .arg(arg!(--size <SIZE>))
                        .arg(
                            Arg::new("reopen")
                                .long("reopen")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("exit")
                                .help("Remove the exit price and mark the trade open"),
                        )
                        .arg(clear_flag("clear_stop", "clear-stop", "stop"))
                        .arg(clear_flag("clear_take", "clear-take", "take"))
                        .arg(clear_flag("clear_strategy", "clear-strategy", "strategy"))
                        .arg(clear_flag("clear_note", "clear-note", "note")),
                ))
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(account_opt())
                        .arg(arg!(--symbol <SYMBOL>))
                        .arg(arg!(--status <STATUS> "OPEN, WIN, LOSS or BREAKEVEN"))
                        .arg(arg!(--limit <N>).value_parser(value_parser!(usize))),
                ))
                .subcommand(Command::new("rm").arg(arg!(--id <ID>).required(true))),
        )
        .subcommand(
            Command::new("report")
                .about("Account performance")
                .subcommand(json_flags(Command::new("summary").arg(account_opt())))
                .subcommand(json_flags(Command::new("equity").arg(account_opt())))
                .subcommand(json_flags(Command::new("calendar").arg(account_opt())))
                .subcommand(json_flags(Command::new("strategies").arg(account_opt()))),
        )
        .subcommand(
            Command::new("profile")
                .about("Trader profile")
                .subcommand(json_flags(Command::new("show")))
                .subcommand(
                    Command::new("set")
                        .arg(arg!(--bio <TEXT>))
                        .arg(arg!(--style <STYLE> "Trading style, e.g. Day Trader"))
                        .arg(arg!(--location <TEXT>)),
                ),
        )
        .subcommand(
            Command::new("export").subcommand(
                Command::new("trades")
                    .arg(account_opt())
                    .arg(arg!(--format <FMT> "csv or json").required(true))
                    .arg(arg!(--out <PATH>).required(true)),
            ),
        )
        .subcommand(Command::new("doctor").about("Check stored trades for inconsistencies"))
}
