// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDisplay {
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// Read-only display metadata for category keys.
pub trait CategoryRegistry {
    fn lookup(&self, key: &str) -> Option<CategoryDisplay>;

    fn display_name(&self, key: &str) -> String {
        self.lookup(key).map(|d| d.name).unwrap_or_else(|| key.to_string())
    }

    /// Name prefixed with its icon when one is registered.
    fn label(&self, key: &str) -> String {
        match self.lookup(key) {
            Some(CategoryDisplay {
                name,
                icon: Some(icon),
                ..
            }) => format!("{} {}", icon, name),
            Some(d) => d.name,
            None => key.to_string(),
        }
    }
}

pub struct DbRegistry<'c> {
    conn: &'c Connection,
}

impl<'c> DbRegistry<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl CategoryRegistry for DbRegistry<'_> {
    fn lookup(&self, key: &str) -> Option<CategoryDisplay> {
        let row = self
            .conn
            .query_row(
                "SELECT name, icon, color FROM categories WHERE key=?1",
                params![key],
                |r| {
                    Ok(CategoryDisplay {
                        name: r.get(0)?,
                        icon: r.get(1)?,
                        color: r.get(2)?,
                    })
                },
            )
            .optional();
        match row {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(key, error = %e, "category lookup failed");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    entries: HashMap<String, CategoryDisplay>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, name: &str, icon: Option<&str>, color: Option<&str>) -> Self {
        self.entries.insert(
            key.to_string(),
            CategoryDisplay {
                name: name.to_string(),
                icon: icon.map(str::to_string),
                color: color.map(str::to_string),
            },
        );
        self
    }
}

impl CategoryRegistry for StaticRegistry {
    fn lookup(&self, key: &str) -> Option<CategoryDisplay> {
        self.entries.get(key).cloned()
    }
}
