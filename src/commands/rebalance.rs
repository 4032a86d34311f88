// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::allocation::{AllocationSession, EditableAllocation, RedistributionMode};
use crate::commands::budgets::upsert_budget;
use crate::input::{QuantizePolicy, parse_amount_input};
use crate::registry::{CategoryRegistry, DbRegistry};
use crate::utils::{
    arg, fmt_signed_whole, fmt_whole, get_currency, get_redistribution_mode, get_snap_policy,
    id_for_category, load_budget, maybe_print_json, parse_month, pretty_table,
};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

/// One step of an edit session as typed on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    Set(String, Decimal),
    Reset(String),
    ResetAll,
    Add(String, Decimal),
    Remove(String),
}

fn split_amount(body: &str, snap: &QuantizePolicy) -> Result<(String, Decimal)> {
    let (key, amount) = body
        .split_once('=')
        .with_context(|| format!("Expected KEY=AMOUNT, got '{}'", body))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Missing category key in '{}'", body);
    }
    let amount =
        parse_amount_input(amount).with_context(|| format!("Invalid amount in '{}'", body))?;
    Ok((key.to_string(), snap.snap(amount)))
}

pub fn parse_op(raw: &str, snap: &QuantizePolicy) -> Result<EditOp> {
    let raw = raw.trim();
    if raw == "reset-all" {
        return Ok(EditOp::ResetAll);
    }
    let (verb, body) = raw
        .split_once(':')
        .with_context(|| format!("Unknown edit '{}'", raw))?;
    match verb {
        "set" => {
            let (key, amount) = split_amount(body, snap)?;
            Ok(EditOp::Set(key, amount))
        }
        "add" => {
            let (key, amount) = split_amount(body, snap)?;
            Ok(EditOp::Add(key, amount))
        }
        "reset" => Ok(EditOp::Reset(body.trim().to_string())),
        "remove" => Ok(EditOp::Remove(body.trim().to_string())),
        other => anyhow::bail!("Unknown edit verb '{}' in '{}'", other, raw),
    }
}

pub fn apply(session: &mut AllocationSession, op: &EditOp) -> Result<()> {
    match op {
        EditOp::Set(key, amount) => session.edit(key, *amount)?,
        EditOp::Reset(key) => session.reset(key)?,
        EditOp::ResetAll => session.reset_all(),
        EditOp::Add(key, amount) => session.add_category(key, *amount)?,
        EditOp::Remove(key) => {
            session.remove_category(key)?;
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct RebalanceReport<'a> {
    month: &'a str,
    mode: RedistributionMode,
    target: Decimal,
    total: Decimal,
    difference: Decimal,
    allocations: &'a [EditableAllocation],
    saved: bool,
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(arg(m, "month")?)?;
    let mode = match m.get_one::<String>("mode") {
        Some(s) => s.parse::<RedistributionMode>()?,
        None => get_redistribution_mode(conn)?,
    };
    let snap = if m.get_flag("no-snap") {
        QuantizePolicy::none()
    } else {
        get_snap_policy(conn)?
    };
    let ops = m
        .get_many::<String>("ops")
        .context("No edits given")?
        .map(|raw| parse_op(raw, &snap))
        .collect::<Result<Vec<_>>>()?;
    for op in &ops {
        if let EditOp::Add(key, _) = op {
            id_for_category(conn, key)?;
        }
    }

    let budget = load_budget(conn, &month)?;
    let mut session = AllocationSession::from_budget(&budget, mode)?;
    for op in &ops {
        apply(&mut session, op).with_context(|| format!("Apply {:?}", op))?;
    }

    let save = m.get_flag("save");
    let report = RebalanceReport {
        month: &month,
        mode,
        target: session.target(),
        total: session.total(),
        difference: session.difference(),
        allocations: session.allocations(),
        saved: save,
    };
    if !maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &report)? {
        print_session(conn, &session)?;
    }

    if save {
        let n = save_session(conn, &month, session)?;
        if !m.get_flag("json") && !m.get_flag("jsonl") {
            println!("Saved {} allocations for {}", n, month);
        }
    }
    Ok(())
}

fn print_session(conn: &Connection, session: &AllocationSession) -> Result<()> {
    let ccy = get_currency(conn)?;
    let registry = DbRegistry::new(conn);
    let mut rows = Vec::new();
    for a in session.allocations() {
        rows.push(vec![
            registry.label(&a.category),
            fmt_whole(&a.original_amount, &ccy),
            fmt_whole(&a.amount, &ccy),
            if a.is_locked { "locked".into() } else { String::new() },
            if a.is_edited(session.mode()) { "edited".into() } else { String::new() },
        ]);
    }
    println!(
        "{}",
        pretty_table(&["Category", "Original", "Amount", "Lock", "State"], rows)
    );
    println!(
        "Mode {}  Target {}  Total {}  Difference {}",
        session.mode(),
        fmt_whole(&session.target(), &ccy),
        fmt_whole(&session.total(), &ccy),
        fmt_signed_whole(&session.difference(), &ccy)
    );
    Ok(())
}

/// Replaces the month's allocations with the session result, stored to the
/// cent. In independent mode the monthly total follows the allocations.
pub fn save_session(conn: &mut Connection, month: &str, session: AllocationSession) -> Result<usize> {
    let monthly_amount = session.effective_target().round_dp(2);
    let amounts = session.finish();
    let tx = conn.transaction()?;
    let budget_id = upsert_budget(&tx, month, monthly_amount)?;
    tx.execute(
        "DELETE FROM allocations WHERE budget_id=?1",
        params![budget_id],
    )?;
    for a in &amounts {
        let cat_id = id_for_category(&tx, &a.category)?;
        tx.execute(
            "INSERT INTO allocations(budget_id, category_id, amount) VALUES (?1, ?2, ?3)",
            params![budget_id, cat_id, a.amount.round_dp(2).to_string()],
        )?;
    }
    tx.commit()?;
    info!(month, count = amounts.len(), %monthly_amount, "saved allocations");
    Ok(amounts.len())
}
