// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::progress::{BudgetProgress, PacePolicy, PaceStatus, PercentCap, StatusTier};
use crate::registry::{CategoryRegistry, DbRegistry};
use crate::utils::{
    arg, fmt_percent, fmt_whole, get_currency, get_percent_cap, load_budget, load_spend,
    maybe_print_json, month_end, month_start, parse_date, parse_month, pretty_table,
};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CategoryStatus {
    pub category: String,
    pub name: String,
    pub budget: Decimal,
    pub spent: Decimal,
    pub percent: i64,
    pub fill: Decimal,
    pub status: StatusTier,
    pub color: &'static str,
    pub remaining: Decimal,
    pub over: Decimal,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub month: String,
    pub as_of: NaiveDate,
    pub currency: String,
    pub monthly_amount: Decimal,
    pub current_spend: Decimal,
    pub percent: i64,
    pub expected_spend_ratio: Decimal,
    pub expected_spend_by_today: Decimal,
    pub pace: PaceStatus,
    pub projected_spend: Decimal,
    pub daily_allowance: Decimal,
    pub remaining: Decimal,
    pub over: Decimal,
    pub categories: Vec<CategoryStatus>,
}

/// Progress for `month`. Without an explicit date a past month is evaluated
/// at its last day and a future month as not yet started.
pub fn progress_for(
    conn: &Connection,
    month: &str,
    as_of: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(BudgetProgress, NaiveDate)> {
    let start = month_start(month)?;
    let end = month_end(month)?;
    let date = match as_of {
        Some(d) if d < start || d > end => {
            anyhow::bail!("Date {} is outside {}", d, month)
        }
        Some(d) => d,
        None => today.clamp(start, end),
    };
    let budget = load_budget(conn, month)?;
    let spends = load_spend(conn, month)?;
    let mut progress = BudgetProgress::for_date(&budget, &spends, date);
    if as_of.is_none() && today < start {
        progress.days_elapsed = 0;
    }
    Ok((progress, date))
}

pub fn build_report(
    conn: &Connection,
    month: &str,
    progress: &BudgetProgress,
    as_of: NaiveDate,
    cap: PercentCap,
) -> Result<StatusReport> {
    let registry = DbRegistry::new(conn);
    let categories = progress
        .category_progress
        .iter()
        .map(|p| {
            let status = p.status();
            CategoryStatus {
                category: p.category.clone(),
                name: registry.display_name(&p.category),
                budget: p.budget_amount,
                spent: p.current_spend,
                percent: p.displayed_percent(cap),
                fill: p.fill_fraction(),
                status,
                color: status.color_name(),
                remaining: p.remaining_amount(),
                over: p.over_amount(),
            }
        })
        .collect();
    Ok(StatusReport {
        month: month.to_string(),
        as_of,
        currency: get_currency(conn)?,
        monthly_amount: progress.monthly_amount,
        current_spend: progress.current_spend,
        percent: crate::progress::displayed_percent(progress.spend_ratio(), cap),
        expected_spend_ratio: progress.expected_spend_ratio(),
        expected_spend_by_today: progress.expected_spend_by_today(),
        pace: progress.pace_status(&PacePolicy::default()),
        projected_spend: progress.projected_spend(),
        daily_allowance: progress.daily_allowance(),
        remaining: progress.remaining_amount(),
        over: progress.over_amount(),
        categories,
    })
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(arg(m, "month")?)?;
    let as_of = match m.get_one::<String>("date") {
        Some(d) => Some(parse_date(d.trim())?),
        None => None,
    };
    let today = chrono::Utc::now().date_naive();
    let (progress, date) = progress_for(conn, &month, as_of, today)?;
    let report = build_report(conn, &month, &progress, date, get_percent_cap(conn)?)?;
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &report)? {
        return Ok(());
    }

    let ccy = &report.currency;
    let registry = DbRegistry::new(conn);
    let rows = report
        .categories
        .iter()
        .map(|c| {
            let left = if c.over > Decimal::ZERO {
                format!("-{}", fmt_whole(&c.over, ccy))
            } else {
                fmt_whole(&c.remaining, ccy)
            };
            vec![
                registry.label(&c.category),
                fmt_whole(&c.budget, ccy),
                fmt_whole(&c.spent, ccy),
                fmt_percent(c.percent),
                left,
                format!("{} ({})", c.status, c.color),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Category", "Budget", "Spent", "Used", "Left", "Status"],
            rows
        )
    );
    println!(
        "{} as of {}: spent {} of {} ({}), expected {} by today, {}",
        report.month,
        report.as_of,
        fmt_whole(&report.current_spend, ccy),
        fmt_whole(&report.monthly_amount, ccy),
        fmt_percent(report.percent),
        fmt_whole(&report.expected_spend_by_today, ccy),
        report.pace
    );
    println!(
        "Projected month end {}  Daily allowance {}",
        fmt_whole(&report.projected_spend, ccy),
        fmt_whole(&report.daily_allowance, ccy)
    );
    Ok(())
}
