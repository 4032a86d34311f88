// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{fmt_signed_whole, get_currency, load_budget, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use tracing::warn;

/// Returns `[issue, detail]` rows; an empty list means nothing to report.
pub fn diagnose(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let ccy = get_currency(conn)?;

    // 1) Allocations that do not add up to the monthly total
    let mut stmt = conn.prepare("SELECT month FROM budgets ORDER BY month")?;
    let months = stmt
        .query_map([], |r| r.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for month in months {
        let budget = load_budget(conn, &month)?;
        if budget.category_allocations.is_empty() {
            rows.push(vec!["no_allocations".into(), month]);
            continue;
        }
        let diff = budget.allocated_total().saturating_sub(budget.monthly_amount);
        if diff.round_dp(0) != rust_decimal::Decimal::ZERO {
            warn!(%month, %diff, "allocations do not match monthly total");
            rows.push(vec![
                "allocation_imbalance".into(),
                format!("{} {}", month, fmt_signed_whole(&diff, &ccy)),
            ]);
        }
    }

    // 2) Spend recorded for a month that has no budget
    let mut stmt2 = conn.prepare(
        "SELECT DISTINCT s.month FROM spend s
         WHERE NOT EXISTS (SELECT 1 FROM budgets b WHERE b.month=s.month) ORDER BY s.month",
    )?;
    let mut cur = stmt2.query([])?;
    while let Some(r) = cur.next()? {
        let m: String = r.get(0)?;
        rows.push(vec!["spend_without_budget".into(), m]);
    }

    // 3) Spend in a category that has no allocation that month
    let mut stmt3 = conn.prepare(
        "SELECT s.month, c.key FROM spend s
         JOIN categories c ON s.category_id=c.id
         JOIN budgets b ON b.month=s.month
         WHERE NOT EXISTS (
            SELECT 1 FROM allocations a WHERE a.budget_id=b.id AND a.category_id=s.category_id
         )
         ORDER BY s.month, c.key",
    )?;
    let mut cur3 = stmt3.query([])?;
    while let Some(r) = cur3.next()? {
        let m: String = r.get(0)?;
        let k: String = r.get(1)?;
        rows.push(vec!["unallocated_spend".into(), format!("{} {}", m, k)]);
    }

    Ok(rows)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = diagnose(conn)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
