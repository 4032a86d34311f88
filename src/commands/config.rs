// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{SETTINGS, arg, get_setting, pretty_table, set_setting};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", _)) => {
            let mut data = Vec::new();
            for (key, default) in SETTINGS {
                data.push(vec![
                    key.to_string(),
                    get_setting(conn, key)?,
                    default.to_string(),
                ]);
            }
            println!("{}", pretty_table(&["Key", "Value", "Default"], data));
        }
        Some(("get", sub)) => {
            let key = arg(sub, "key")?;
            println!("{}", get_setting(conn, key)?);
        }
        Some(("set", sub)) => {
            let key = arg(sub, "key")?;
            let value = arg(sub, "value")?;
            set_setting(conn, key, value)?;
            println!("{} = {}", key, get_setting(conn, key)?);
        }
        _ => {}
    }
    Ok(())
}
