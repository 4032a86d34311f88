// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{arg, id_for_category, pretty_table};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use tracing::warn;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let key = arg(sub, "key")?;
            let name = sub
                .get_one::<String>("name")
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| key.to_string());
            let icon = sub.get_one::<String>("icon").map(|s| s.trim().to_string());
            let color = sub.get_one::<String>("color").map(|s| s.trim().to_string());
            conn.execute(
                "INSERT INTO categories(key, name, icon, color) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE SET name=excluded.name, icon=excluded.icon, color=excluded.color",
                params![key, name, icon, color],
            )
            .with_context(|| format!("Add category '{}'", key))?;
            println!("Added category '{}' ({})", key, name);
        }
        Some(("list", _)) => {
            let mut stmt =
                conn.prepare("SELECT key, name, icon, color FROM categories ORDER BY key")?;
            let rows = stmt.query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, Option<String>>(2)?,
                    r.get::<_, Option<String>>(3)?,
                ))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (k, n, i, c) = row?;
                data.push(vec![k, n, i.unwrap_or_default(), c.unwrap_or_default()]);
            }
            println!(
                "{}",
                pretty_table(&["Key", "Name", "Icon", "Color"], data)
            );
        }
        Some(("rm", sub)) => remove(conn, arg(sub, "key")?, sub.get_flag("force"))?,
        _ => {}
    }
    Ok(())
}

/// Allocations and spend cascade with the category, so removing one that is
/// still referenced needs `force`.
fn remove(conn: &Connection, key: &str, force: bool) -> Result<()> {
    let cat_id = id_for_category(conn, key)?;
    let (allocations, spend): (i64, i64) = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM allocations WHERE category_id=?1),
                (SELECT COUNT(*) FROM spend WHERE category_id=?1)",
        params![cat_id],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    if allocations + spend > 0 {
        if !force {
            anyhow::bail!(
                "Category '{}' has {} allocation(s) and {} spend row(s); rebalance it out or pass --force",
                key,
                allocations,
                spend
            );
        }
        warn!(key, allocations, spend, "removing category with dependent rows");
    }
    let removed = conn.execute("DELETE FROM categories WHERE id=?1", params![cat_id])?;
    if removed == 0 {
        anyhow::bail!("Unknown category '{}'", key);
    }
    println!("Removed category '{}'", key);
    Ok(())
}
