// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::registry::{CategoryRegistry, DbRegistry};
use crate::utils::{
    arg, budget_id_for_month, fmt_signed_whole, fmt_whole, get_currency, id_for_category,
    load_budget, maybe_print_json, parse_decimal, parse_month, pretty_table,
};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("alloc", sub)) => alloc(conn, sub)?,
        Some(("list", _)) => list(conn)?,
        Some(("show", sub)) => show(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn non_negative(s: &str) -> Result<Decimal> {
    let amount = parse_decimal(s)?;
    if amount < Decimal::ZERO {
        anyhow::bail!("Amount must not be negative, got {}", amount);
    }
    Ok(amount)
}

pub fn upsert_budget(conn: &Connection, month: &str, amount: Decimal) -> Result<i64> {
    conn.execute(
        "INSERT INTO budgets(month, monthly_amount) VALUES (?1, ?2)
         ON CONFLICT(month) DO UPDATE SET monthly_amount=excluded.monthly_amount,
         updated_at=datetime('now')",
        params![month, amount.to_string()],
    )?;
    budget_id_for_month(conn, month)?.with_context(|| format!("Budget for {} vanished", month))
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(arg(sub, "month")?)?;
    let amount = non_negative(arg(sub, "amount")?)?;
    upsert_budget(conn, &month, amount)?;
    println!(
        "Budget for {} = {}",
        month,
        fmt_whole(&amount, &get_currency(conn)?)
    );
    Ok(())
}

fn alloc(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(arg(sub, "month")?)?;
    let cat = arg(sub, "category")?;
    let amount = non_negative(arg(sub, "amount")?)?;
    let budget_id = budget_id_for_month(conn, &month)?
        .with_context(|| format!("No budget set for {}; run `budget set` first", month))?;
    let cat_id = id_for_category(conn, cat)?;
    conn.execute(
        "INSERT INTO allocations(budget_id, category_id, amount) VALUES (?1, ?2, ?3)
         ON CONFLICT(budget_id, category_id) DO UPDATE SET amount=excluded.amount",
        params![budget_id, cat_id, amount.to_string()],
    )?;
    println!("Allocation set for {} / {} = {}", month, cat, amount);
    Ok(())
}

fn list(conn: &Connection) -> Result<()> {
    let ccy = get_currency(conn)?;
    let mut stmt = conn.prepare(
        "SELECT b.month, b.monthly_amount, COUNT(a.id)
         FROM budgets b LEFT JOIN allocations a ON a.budget_id=b.id
         GROUP BY b.id ORDER BY b.month DESC",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, i64>(2)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (month, total_s, n) = row?;
        let total = parse_decimal(&total_s)?;
        data.push(vec![month, fmt_whole(&total, &ccy), n.to_string()]);
    }
    println!(
        "{}",
        pretty_table(&["Month", "Monthly Total", "Categories"], data)
    );
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(arg(sub, "month")?)?;
    let budget = load_budget(conn, &month)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &budget)? {
        return Ok(());
    }
    let ccy = get_currency(conn)?;
    let registry = DbRegistry::new(conn);
    let mut data = Vec::new();
    for a in &budget.category_allocations {
        data.push(vec![registry.label(&a.category), fmt_whole(&a.amount, &ccy)]);
    }
    println!("{}", pretty_table(&["Category", "Allocated"], data));
    let allocated = budget.allocated_total();
    println!(
        "Target {}  Allocated {}  Difference {}",
        fmt_whole(&budget.monthly_amount, &ccy),
        fmt_whole(&allocated, &ccy),
        fmt_signed_whole(&allocated.saturating_sub(budget.monthly_amount), &ccy)
    );
    Ok(())
}
