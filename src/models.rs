// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::saturating_sum;

/// One category's share of a monthly budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAllocation {
    pub category: String,
    pub amount: Decimal,
    #[serde(default)]
    pub is_locked: bool,
}

impl CategoryAllocation {
    pub fn new(category: impl Into<String>, amount: Decimal) -> Self {
        Self {
            category: category.into(),
            amount,
            is_locked: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub month: String, // YYYY-MM
    pub monthly_amount: Decimal,
    pub category_allocations: Vec<CategoryAllocation>,
}

impl Budget {
    pub fn allocated_total(&self) -> Decimal {
        saturating_sum(self.category_allocations.iter().map(|a| a.amount))
    }
}

/// Saved form of an allocation: no lock flag, emitted in session order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAmount {
    pub category: String,
    pub amount: Decimal,
}

/// Pre-aggregated spend for one category in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub category: String,
    pub amount: Decimal,
}

impl CategorySpend {
    pub fn new(category: impl Into<String>, amount: Decimal) -> Self {
        Self {
            category: category.into(),
            amount,
        }
    }
}
