// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgetring::commands::{self, rebalance};
use budgetring::input::QuantizePolicy;
use budgetring::progress::{PaceStatus, PercentCap, StatusTier};
use budgetring::registry::{CategoryRegistry, DbRegistry};
use budgetring::utils::{get_setting, load_budget, load_spend};
use budgetring::{cli, db};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn run(conn: &mut Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["budgetring"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().try_get_matches_from(argv)?;
    match matches.subcommand() {
        Some(("category", sub)) => commands::categories::handle(conn, sub),
        Some(("budget", sub)) => commands::budgets::handle(conn, sub),
        Some(("rebalance", sub)) => commands::rebalance::handle(conn, sub),
        Some(("spend", sub)) => commands::spend::handle(conn, sub),
        Some(("status", sub)) => commands::status::handle(conn, sub),
        Some(("config", sub)) => commands::config::handle(conn, sub),
        Some(("doctor", _)) => commands::doctor::handle(conn),
        other => panic!("unexpected command {:?}", other.map(|(n, _)| n)),
    }
}

fn setup() -> Connection {
    let mut conn = db::open_in_memory().unwrap();
    let steps: [&[&str]; 8] = [
        &["category", "add", "groceries", "--name", "Groceries", "--icon", "🛒"],
        &["category", "add", "dining", "--name", "Dining Out"],
        &["category", "add", "fuel"],
        &["category", "add", "travel", "--name", "Travel"],
        &["budget", "set", "--month", "2025-08", "--amount", "850"],
        &["budget", "alloc", "--month", "2025-08", "--category", "groceries", "--amount", "200"],
        &["budget", "alloc", "--month", "2025-08", "--category", "dining", "--amount", "150"],
        &["budget", "alloc", "--month", "2025-08", "--category", "fuel", "--amount", "500"],
    ];
    for args in steps {
        run(&mut conn, args).unwrap();
    }
    conn
}

fn allocated(conn: &Connection, key: &str) -> Option<Decimal> {
    load_budget(conn, "2025-08")
        .unwrap()
        .category_allocations
        .into_iter()
        .find(|a| a.category == key)
        .map(|a| a.amount)
}

#[test]
fn rebalance_saves_proportional_result_to_the_cent() {
    let mut conn = setup();
    run(
        &mut conn,
        &["rebalance", "--month", "2025-08", "--no-snap", "--save", "set:groceries=400"],
    )
    .unwrap();

    let budget = load_budget(&conn, "2025-08").unwrap();
    assert_eq!(budget.monthly_amount, dec!(850));
    assert_eq!(allocated(&conn, "groceries"), Some(dec!(400)));
    assert_eq!(allocated(&conn, "dining"), Some(dec!(103.85)));
    assert_eq!(allocated(&conn, "fuel"), Some(dec!(346.15)));
}

#[test]
fn rebalance_snaps_and_filters_typed_amounts() {
    let mut conn = setup();
    run(
        &mut conn,
        &["rebalance", "--month", "2025-08", "--save", "set:groceries=$398"],
    )
    .unwrap();
    assert_eq!(allocated(&conn, "groceries"), Some(dec!(400)));
}

#[test]
fn rebalance_without_save_changes_nothing() {
    let mut conn = setup();
    run(
        &mut conn,
        &["rebalance", "--month", "2025-08", "--json", "set:groceries=400"],
    )
    .unwrap();
    assert_eq!(allocated(&conn, "groceries"), Some(dec!(200)));
    assert_eq!(allocated(&conn, "dining"), Some(dec!(150)));
}

#[test]
fn zeroed_categories_are_not_saved() {
    let mut conn = setup();
    run(
        &mut conn,
        &["rebalance", "--month", "2025-08", "--save", "set:dining=0"],
    )
    .unwrap();

    assert_eq!(allocated(&conn, "dining"), None);
    assert_eq!(allocated(&conn, "groceries"), Some(dec!(242.86)));
    assert_eq!(allocated(&conn, "fuel"), Some(dec!(607.14)));
}

#[test]
fn edit_then_reset_round_trips() {
    let mut conn = setup();
    run(
        &mut conn,
        &[
            "rebalance",
            "--month",
            "2025-08",
            "--save",
            "set:groceries=400",
            "reset:groceries",
        ],
    )
    .unwrap();
    assert_eq!(allocated(&conn, "groceries"), Some(dec!(200)));
    assert_eq!(allocated(&conn, "dining"), Some(dec!(150)));
    assert_eq!(allocated(&conn, "fuel"), Some(dec!(500)));
}

#[test]
fn added_category_must_be_registered() {
    let mut conn = setup();
    assert!(
        run(
            &mut conn,
            &["rebalance", "--month", "2025-08", "--save", "add:casino=50"],
        )
        .is_err()
    );

    run(
        &mut conn,
        &["rebalance", "--month", "2025-08", "--no-snap", "--save", "add:travel=50"],
    )
    .unwrap();
    assert_eq!(allocated(&conn, "travel"), Some(dec!(50)));
    let total: Decimal = load_budget(&conn, "2025-08")
        .unwrap()
        .category_allocations
        .iter()
        .map(|a| a.amount)
        .sum();
    assert!((total - dec!(850)).abs() <= dec!(0.02));
}

#[test]
fn independent_mode_from_config_moves_the_total() {
    let mut conn = setup();
    run(
        &mut conn,
        &["config", "set", "redistribution_mode", "independent"],
    )
    .unwrap();
    run(
        &mut conn,
        &["rebalance", "--month", "2025-08", "--save", "set:groceries=300"],
    )
    .unwrap();

    let budget = load_budget(&conn, "2025-08").unwrap();
    assert_eq!(budget.monthly_amount, dec!(950));
    assert_eq!(allocated(&conn, "groceries"), Some(dec!(300)));
    assert_eq!(allocated(&conn, "dining"), Some(dec!(150)));
}

#[test]
fn unknown_category_edit_fails_without_saving() {
    let mut conn = setup();
    let err = run(
        &mut conn,
        &["rebalance", "--month", "2025-08", "--save", "set:groceries=400", "set:pets=10"],
    )
    .unwrap_err();
    assert!(format!("{:#}", err).contains("pets"));
    assert_eq!(allocated(&conn, "groceries"), Some(dec!(200)));
}

#[test]
fn edit_ops_parse() {
    let snap = QuantizePolicy::none();
    assert_eq!(
        rebalance::parse_op("set:fuel=12.5", &snap).unwrap(),
        rebalance::EditOp::Set("fuel".into(), dec!(12.5))
    );
    assert_eq!(
        rebalance::parse_op("reset-all", &snap).unwrap(),
        rebalance::EditOp::ResetAll
    );
    assert_eq!(
        rebalance::parse_op("remove:fuel", &snap).unwrap(),
        rebalance::EditOp::Remove("fuel".into())
    );
    assert!(rebalance::parse_op("bogus", &snap).is_err());
    assert!(rebalance::parse_op("set:=5", &snap).is_err());
    assert!(rebalance::parse_op("set:fuel", &snap).is_err());
    assert!(rebalance::parse_op("move:fuel=5", &snap).is_err());
}

#[test]
fn spend_accumulates_and_never_goes_negative() {
    let mut conn = setup();
    run(&mut conn, &["spend", "add", "--month", "2025-08", "--category", "fuel", "--amount", "50"]).unwrap();
    run(&mut conn, &["spend", "add", "--month", "2025-08", "--category", "fuel", "--amount", "40.5"]).unwrap();
    let spends = load_spend(&conn, "2025-08").unwrap();
    assert_eq!(spends.len(), 1);
    assert_eq!(spends[0].amount, dec!(90.5));

    run(&mut conn, &["spend", "add", "--month", "2025-08", "--category", "fuel", "--amount", "-100"]).unwrap();
    assert_eq!(load_spend(&conn, "2025-08").unwrap()[0].amount, dec!(0));
}

#[test]
fn status_classifies_each_category() {
    let mut conn = setup();
    for (cat, amt) in [("groceries", "170"), ("dining", "151"), ("travel", "20")] {
        run(
            &mut conn,
            &["spend", "add", "--month", "2025-08", "--category", cat, "--amount", amt],
        )
        .unwrap();
    }

    let today = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
    let (progress, as_of) =
        commands::status::progress_for(&conn, "2025-08", None, today).unwrap();
    assert_eq!(as_of, NaiveDate::from_ymd_opt(2025, 8, 31).unwrap());
    assert_eq!(progress.days_elapsed, 31);

    let report =
        commands::status::build_report(&conn, "2025-08", &progress, as_of, PercentCap::default())
            .unwrap();
    let by_key = |k: &str| report.categories.iter().find(|c| c.category == k).unwrap();
    assert_eq!(by_key("groceries").status, StatusTier::Near);
    assert_eq!(by_key("groceries").percent, 85);
    assert_eq!(by_key("dining").status, StatusTier::Over);
    assert_eq!(by_key("dining").over, dec!(1));
    assert_eq!(by_key("dining").name, "Dining Out");
    assert_eq!(by_key("fuel").status, StatusTier::Under);
    assert_eq!(by_key("travel").budget, dec!(0));
    assert_eq!(by_key("travel").color, "red");
    assert_eq!(report.current_spend, dec!(341));
    assert_eq!(report.pace, PaceStatus::Under);

    run(&mut conn, &["status", "--month", "2025-08", "--date", "2025-08-15", "--json"]).unwrap();
}

#[test]
fn status_dates_outside_the_month() {
    let conn = setup();
    let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
    let (future, _) = commands::status::progress_for(&conn, "2025-08", None, today).unwrap();
    assert_eq!(future.days_elapsed, 0);
    assert_eq!(future.expected_spend_ratio(), dec!(0));

    let stray = NaiveDate::from_ymd_opt(2025, 9, 2).unwrap();
    assert!(commands::status::progress_for(&conn, "2025-08", Some(stray), today).is_err());
    assert!(commands::status::progress_for(&conn, "2025-10", None, today).is_err());
}

#[test]
fn config_validates_before_writing() {
    let mut conn = setup();
    assert_eq!(get_setting(&conn, "percent_cap").unwrap(), "999");
    assert!(run(&mut conn, &["config", "set", "percent_cap", "lots"]).is_err());
    assert!(run(&mut conn, &["config", "set", "redistribution_mode", "greedy"]).is_err());
    assert!(run(&mut conn, &["config", "set", "snap_step", "-5"]).is_err());
    assert!(run(&mut conn, &["config", "set", "colour", "blue"]).is_err());
    assert_eq!(get_setting(&conn, "percent_cap").unwrap(), "999");

    run(&mut conn, &["config", "set", "currency", "eur"]).unwrap();
    assert_eq!(get_setting(&conn, "currency").unwrap(), "EUR");
    run(&mut conn, &["config", "set", "percent_cap", "none"]).unwrap();
    assert_eq!(get_setting(&conn, "percent_cap").unwrap(), "none");
}

#[test]
fn doctor_reports_imbalance_and_stray_spend() {
    let mut conn = setup();
    assert!(commands::doctor::diagnose(&conn).unwrap().is_empty());

    run(&mut conn, &["budget", "set", "--month", "2025-08", "--amount", "1000"]).unwrap();
    run(&mut conn, &["spend", "add", "--month", "2025-08", "--category", "travel", "--amount", "5"]).unwrap();
    run(&mut conn, &["spend", "add", "--month", "2025-09", "--category", "fuel", "--amount", "5"]).unwrap();

    let rows = commands::doctor::diagnose(&conn).unwrap();
    assert_eq!(
        rows,
        vec![
            vec!["allocation_imbalance".to_string(), "2025-08 -USD 150".to_string()],
            vec!["spend_without_budget".to_string(), "2025-09".to_string()],
            vec!["unallocated_spend".to_string(), "2025-08 travel".to_string()],
        ]
    );
}

#[test]
fn registry_reads_categories_table() {
    let conn = setup();
    let reg = DbRegistry::new(&conn);
    assert_eq!(reg.label("groceries"), "🛒 Groceries");
    assert_eq!(reg.display_name("fuel"), "fuel");
    assert_eq!(reg.display_name("nope"), "nope");
}

#[test]
fn oversized_typed_amount_fails_without_saving() {
    let mut conn = setup();
    let err = run(
        &mut conn,
        &["rebalance", "--month", "2025-08", "--save", "set:groceries=100000000000000000000000000000000"],
    )
    .unwrap_err();
    assert!(format!("{:#}", err).contains("out of range"));
    assert_eq!(allocated(&conn, "groceries"), Some(dec!(200)));
    assert_eq!(allocated(&conn, "fuel"), Some(dec!(500)));
    assert!(rebalance::parse_op("set:fuel=100000000000000000000000000000000", &QuantizePolicy::none()).is_err());
}

#[test]
fn status_survives_spend_far_beyond_a_tiny_budget() {
    let mut conn = setup();
    run(&mut conn, &["budget", "set", "--month", "2025-09", "--amount", "0.00000001"]).unwrap();
    run(
        &mut conn,
        &["budget", "alloc", "--month", "2025-09", "--category", "fuel", "--amount", "0.00000001"],
    )
    .unwrap();
    run(
        &mut conn,
        &["spend", "add", "--month", "2025-09", "--category", "fuel", "--amount", "1000000000000000000000"],
    )
    .unwrap();
    run(&mut conn, &["status", "--month", "2025-09", "--date", "2025-09-10"]).unwrap();

    let today = NaiveDate::from_ymd_opt(2025, 9, 10).unwrap();
    let (progress, as_of) =
        commands::status::progress_for(&conn, "2025-09", None, today).unwrap();
    let report =
        commands::status::build_report(&conn, "2025-09", &progress, as_of, PercentCap::default())
            .unwrap();
    assert_eq!(report.percent, 999);
    assert_eq!(report.pace, PaceStatus::Over);
    assert_eq!(report.categories[0].status, StatusTier::Over);

    let max = Decimal::MAX.to_string();
    run(&mut conn, &["spend", "add", "--month", "2025-09", "--category", "dining", "--amount", max.as_str()]).unwrap();
    assert!(
        run(&mut conn, &["spend", "add", "--month", "2025-09", "--category", "dining", "--amount", max.as_str()])
            .is_err()
    );
}

#[test]
fn single_digit_months_share_the_padded_row() {
    let mut conn = setup();
    run(&mut conn, &["budget", "set", "--month", "2025-8", "--amount", "900"]).unwrap();
    run(&mut conn, &["spend", "add", "--month", "2025-8", "--category", "fuel", "--amount", "12"]).unwrap();

    assert_eq!(load_budget(&conn, "2025-08").unwrap().monthly_amount, dec!(900));
    assert_eq!(load_spend(&conn, "2025-08").unwrap()[0].amount, dec!(12));
    let months: i64 = conn
        .query_row("SELECT COUNT(*) FROM budgets", [], |r| r.get(0))
        .unwrap();
    assert_eq!(months, 1);
}

#[test]
fn category_rm_guards_referenced_and_unknown_keys() {
    let mut conn = setup();
    assert!(run(&mut conn, &["category", "rm", "pets"]).is_err());

    let err = run(&mut conn, &["category", "rm", "dining"]).unwrap_err();
    assert!(format!("{:#}", err).contains("--force"));
    assert_eq!(allocated(&conn, "dining"), Some(dec!(150)));

    run(&mut conn, &["category", "rm", "travel"]).unwrap();
    assert!(DbRegistry::new(&conn).lookup("travel").is_none());

    run(&mut conn, &["category", "rm", "dining", "--force"]).unwrap();
    assert_eq!(allocated(&conn, "dining"), None);
    assert!(commands::doctor::diagnose(&conn).unwrap().iter().any(|r| r[0] == "allocation_imbalance"));
}
