// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::allocation::RedistributionMode;
use crate::input::QuantizePolicy;
use crate::models::{Budget, CategoryAllocation, CategorySpend};
use crate::progress::PercentCap;

pub const KEY_CURRENCY: &str = "currency";
pub const KEY_MODE: &str = "redistribution_mode";
pub const KEY_SNAP_STEP: &str = "snap_step";
pub const KEY_PERCENT_CAP: &str = "percent_cap";

pub const SETTINGS: [(&str, &str); 4] = [
    (KEY_CURRENCY, "USD"),
    (KEY_MODE, "proportional"),
    (KEY_SNAP_STEP, "5"),
    (KEY_PERCENT_CAP, "999"),
];

pub fn arg<'a>(m: &'a clap::ArgMatches, name: &str) -> Result<&'a str> {
    m.get_one::<String>(name)
        .map(|s| s.trim())
        .with_context(|| format!("Missing argument '{}'", name))
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Validates and normalises to zero-padded `YYYY-MM`, so `2025-8` and
/// `2025-08` name the same month.
pub fn parse_month(s: &str) -> Result<String> {
    Ok(month_start(s)?.format("%Y-%m").to_string())
}

pub fn month_start(month: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", month))
}

pub fn month_end(month: &str) -> Result<NaiveDate> {
    let first = month_start(month)?;
    NaiveDate::from_ymd_opt(first.year(), first.month(), days_in_month(first))
        .ok_or_else(|| anyhow::anyhow!("Invalid month '{}'", month))
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let (y, m) = (date.year(), date.month());
    let (ny, nm) = if m == 12 { (y + 1, 1) } else { (y, m + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

/// Sums amounts, pinning at `Decimal::MAX`/`MIN` rather than overflowing.
pub fn saturating_sum<I: IntoIterator<Item = Decimal>>(amounts: I) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |acc, a| acc.saturating_add(a))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Amounts are shown rounded to whole currency units.
pub fn fmt_whole(d: &Decimal, ccy: &str) -> String {
    format!(
        "{} {}",
        ccy,
        d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    )
}

pub fn fmt_signed_whole(d: &Decimal, ccy: &str) -> String {
    let r = d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    if r > Decimal::ZERO {
        format!("+{} {}", ccy, r)
    } else if r < Decimal::ZERO {
        format!("-{} {}", ccy, r.abs())
    } else {
        format!("{} 0", ccy)
    }
}

pub fn fmt_percent(pct: i64) -> String {
    format!("{}%", pct)
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn id_for_category(conn: &Connection, key: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE key=?1")?;
    let id: i64 = stmt
        .query_row(params![key], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", key))?;
    Ok(id)
}

pub fn budget_id_for_month(conn: &Connection, month: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM budgets WHERE month=?1",
            params![month],
            |r| r.get(0),
        )
        .optional()?;
    Ok(id)
}

pub fn load_budget(conn: &Connection, month: &str) -> Result<Budget> {
    let (budget_id, total_s): (i64, String) = conn
        .query_row(
            "SELECT id, monthly_amount FROM budgets WHERE month=?1",
            params![month],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?
        .with_context(|| format!("No budget set for {}", month))?;
    let monthly_amount = total_s
        .parse::<Decimal>()
        .with_context(|| format!("Invalid monthly amount '{}' for {}", total_s, month))?;

    let mut stmt = conn.prepare(
        "SELECT c.key, a.amount FROM allocations a JOIN categories c ON a.category_id=c.id
         WHERE a.budget_id=?1 ORDER BY a.id",
    )?;
    let rows = stmt.query_map(params![budget_id], |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
    })?;
    let mut category_allocations = Vec::new();
    for row in rows {
        let (key, amt_s) = row?;
        let amount = amt_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid allocation '{}' for {}", amt_s, key))?;
        category_allocations.push(CategoryAllocation::new(key, amount));
    }
    Ok(Budget {
        month: month.to_string(),
        monthly_amount,
        category_allocations,
    })
}

pub fn load_spend(conn: &Connection, month: &str) -> Result<Vec<CategorySpend>> {
    let mut stmt = conn.prepare(
        "SELECT c.key, s.amount FROM spend s JOIN categories c ON s.category_id=c.id
         WHERE s.month=?1 ORDER BY c.key",
    )?;
    let rows = stmt.query_map(params![month], |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (key, amt_s) = row?;
        let amount = amt_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid spend '{}' for {}", amt_s, key))?;
        out.push(CategorySpend::new(key, amount));
    }
    Ok(out)
}

pub fn default_setting(key: &str) -> Option<&'static str> {
    SETTINGS.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<String> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    match v {
        Some(v) => Ok(v),
        None => default_setting(key)
            .map(str::to_string)
            .with_context(|| format!("Unknown setting '{}'", key)),
    }
}

/// Validates `value` against the setting's type before storing it.
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    let value = value.trim();
    match key {
        KEY_CURRENCY => {
            if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphabetic()) {
                anyhow::bail!("Invalid currency code '{}'", value);
            }
        }
        KEY_MODE => {
            value.parse::<RedistributionMode>()?;
        }
        KEY_SNAP_STEP => {
            value.parse::<QuantizePolicy>()?;
        }
        KEY_PERCENT_CAP => {
            value.parse::<PercentCap>()?;
        }
        other => anyhow::bail!("Unknown setting '{}'", other),
    }
    let stored = if key == KEY_CURRENCY {
        value.to_uppercase()
    } else {
        value.to_string()
    };
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, stored],
    )?;
    Ok(())
}

pub fn get_currency(conn: &Connection) -> Result<String> {
    get_setting(conn, KEY_CURRENCY)
}

pub fn get_redistribution_mode(conn: &Connection) -> Result<RedistributionMode> {
    Ok(get_setting(conn, KEY_MODE)?.parse()?)
}

pub fn get_snap_policy(conn: &Connection) -> Result<QuantizePolicy> {
    Ok(get_setting(conn, KEY_SNAP_STEP)?.parse()?)
}

pub fn get_percent_cap(conn: &Connection) -> Result<PercentCap> {
    Ok(get_setting(conn, KEY_PERCENT_CAP)?.parse()?)
}
