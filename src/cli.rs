// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command};

fn month_arg() -> Arg {
    Arg::new("month")
        .long("month")
        .required(true)
        .help("Budget month, YYYY-MM")
}

fn json_args() -> [Arg; 2] {
    [
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    ]
}

pub fn build_cli() -> Command {
    Command::new("budgetring")
        .version(clap::crate_version!())
        .about("Category budgets with proportional rebalancing and spend pacing")
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("category")
                .about("Manage the category registry")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("name").long("name"))
                        .arg(Arg::new("icon").long("icon"))
                        .arg(Arg::new("color").long("color")),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("rm")
                        .about("Remove a category; refuses while budgets or spend use it")
                        .arg(Arg::new("key").required(true))
                        .arg(
                            Arg::new("force")
                                .long("force")
                                .action(ArgAction::SetTrue)
                                .help("Also delete its allocations and spend"),
                        ),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly totals and category allocations")
                .subcommand(
                    Command::new("set")
                        .about("Set the monthly total")
                        .arg(month_arg())
                        .arg(Arg::new("amount").long("amount").required(true)),
                )
                .subcommand(
                    Command::new("alloc")
                        .about("Set one category allocation directly")
                        .arg(month_arg())
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("amount").long("amount").required(true)),
                )
                .subcommand(Command::new("list"))
                .subcommand(Command::new("show").arg(month_arg()).args(json_args())),
        )
        .subcommand(
            Command::new("rebalance")
                .about("Edit allocations in one session")
                .arg(month_arg())
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .help("proportional|independent (defaults to the configured mode)"),
                )
                .arg(
                    Arg::new("no-snap")
                        .long("no-snap")
                        .action(ArgAction::SetTrue)
                        .help("Do not snap typed amounts to the configured step"),
                )
                .arg(
                    Arg::new("save")
                        .long("save")
                        .action(ArgAction::SetTrue)
                        .help("Persist the result"),
                )
                .args(json_args())
                .arg(
                    Arg::new("ops")
                        .num_args(1..)
                        .required(true)
                        .action(ArgAction::Append)
                        .help("set:KEY=AMOUNT | reset:KEY | reset-all | add:KEY=AMOUNT | remove:KEY"),
                ),
        )
        .subcommand(
            Command::new("spend")
                .about("Record pre-aggregated spend")
                .subcommand(
                    Command::new("add")
                        .arg(month_arg())
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_negative_numbers(true)
                                .help("Amount to add; negative for refunds"),
                        ),
                )
                .subcommand(Command::new("list").arg(month_arg()).args(json_args())),
        )
        .subcommand(
            Command::new("status")
                .about("Budget progress and pacing")
                .arg(month_arg())
                .arg(
                    Arg::new("date")
                        .long("date")
                        .help("Evaluate as of YYYY-MM-DD (defaults to today, or month end for past months)"),
                )
                .args(json_args()),
        )
        .subcommand(
            Command::new("export")
                .about("Export a month's allocations")
                .arg(month_arg())
                .arg(Arg::new("format").long("format").required(true))
                .arg(Arg::new("out").long("out").required(true)),
        )
        .subcommand(
            Command::new("config")
                .about("Settings")
                .subcommand(Command::new("list"))
                .subcommand(Command::new("get").arg(Arg::new("key").required(true)))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check budgets for inconsistencies"))
}
