// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::registry::{CategoryRegistry, DbRegistry};
use crate::utils::{
    arg, fmt_whole, get_currency, id_for_category, load_spend, maybe_print_json, parse_decimal,
    parse_month, pretty_table,
};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Adds to the month's running spend for a category. Negative amounts record
/// refunds; the stored total never drops below zero.
fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(arg(sub, "month")?)?;
    let cat = arg(sub, "category")?;
    let amount = parse_decimal(arg(sub, "amount")?)?;
    let cat_id = id_for_category(conn, cat)?;

    let existing: Option<String> = conn
        .query_row(
            "SELECT amount FROM spend WHERE month=?1 AND category_id=?2",
            params![&month, cat_id],
            |r| r.get(0),
        )
        .optional()?;
    let current = match existing {
        Some(s) => s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid spend amount '{}' for {}", s, month))?,
        None => Decimal::ZERO,
    };
    let new_amt = current
        .checked_add(amount)
        .with_context(|| format!("Spend for {} / {} would overflow", month, cat))?
        .max(Decimal::ZERO);
    conn.execute(
        "INSERT INTO spend(month, category_id, amount) VALUES (?1,?2,?3)
         ON CONFLICT(month, category_id) DO UPDATE SET amount=excluded.amount",
        params![&month, cat_id, new_amt.to_string()],
    )?;
    println!(
        "Spend for {} / {} now {}",
        month,
        cat,
        fmt_whole(&new_amt, &get_currency(conn)?)
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(arg(sub, "month")?)?;
    let spends = load_spend(conn, &month)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &spends)? {
        return Ok(());
    }
    let ccy = get_currency(conn)?;
    let registry = DbRegistry::new(conn);
    let data = spends
        .iter()
        .map(|s| vec![registry.label(&s.category), fmt_whole(&s.amount, &ccy)])
        .collect();
    println!("{}", pretty_table(&["Category", "Spent"], data));
    Ok(())
}
