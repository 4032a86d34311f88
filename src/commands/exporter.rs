// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::CategoryAmount;
use crate::utils::{arg, load_budget, parse_month};
use anyhow::Result;
use rusqlite::Connection;
use serde_json::json;

/// Writes the month's saved allocations in save order, zero amounts omitted.
pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(arg(m, "month")?)?;
    let fmt = arg(m, "format")?.to_lowercase();
    let out = arg(m, "out")?;
    if fmt != "csv" && fmt != "json" {
        anyhow::bail!("Unknown format: {} (use csv|json)", fmt);
    }

    let budget = load_budget(conn, &month)?;
    let items: Vec<CategoryAmount> = budget
        .category_allocations
        .iter()
        .filter(|a| !a.amount.is_zero())
        .map(|a| CategoryAmount {
            category: a.category.clone(),
            amount: a.amount,
        })
        .collect();

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["month", "category", "amount"])?;
            for it in &items {
                let amount = it.amount.to_string();
                wtr.write_record([month.as_str(), it.category.as_str(), amount.as_str()])?;
            }
            wtr.flush()?;
        }
        _ => {
            let doc = json!({
                "month": month,
                "monthly_amount": budget.monthly_amount.to_string(),
                "allocations": items,
            });
            std::fs::write(out, serde_json::to_string_pretty(&doc)?)?;
        }
    }
    println!("Exported {} allocations to {}", items.len(), out);
    Ok(())
}
