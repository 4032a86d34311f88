// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Spend-versus-budget classification. Everything here is a pure function of
//! budget, spend and the day of the month; nothing is cached.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::{Budget, CategorySpend};
use crate::utils::{days_in_month, saturating_sum};

pub const NEAR_THRESHOLD: Decimal = dec!(0.85);
pub const OVER_THRESHOLD: Decimal = dec!(1.0);
pub const DEFAULT_PERCENT_CAP: u32 = 999;

/// Zero when there is no budget. A quotient too large for `Decimal`
/// saturates instead of overflowing.
pub fn spend_ratio(spend: Decimal, budget: Decimal) -> Decimal {
    if budget <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    spend.checked_div(budget).unwrap_or(if spend.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

pub fn is_over_budget(spend: Decimal, budget: Decimal) -> bool {
    spend > budget
}

/// Progress-bar fill: the ratio clamped to `[0, 1]`.
pub fn fill_fraction(ratio: Decimal) -> Decimal {
    ratio.clamp(Decimal::ZERO, Decimal::ONE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PercentCap {
    Uncapped,
    Capped(u32),
}

impl Default for PercentCap {
    fn default() -> Self {
        PercentCap::Capped(DEFAULT_PERCENT_CAP)
    }
}

impl fmt::Display for PercentCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PercentCap::Uncapped => f.write_str("none"),
            PercentCap::Capped(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for PercentCap {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("none") {
            return Ok(PercentCap::Uncapped);
        }
        s.parse::<u32>()
            .map(PercentCap::Capped)
            .map_err(|_| CoreError::InvalidSetting {
                key: "percent_cap".into(),
                value: s.to_string(),
            })
    }
}

/// Whole-number percentage for labels. Unlike [`fill_fraction`] this may
/// exceed 100.
pub fn displayed_percent(ratio: Decimal, cap: PercentCap) -> i64 {
    let saturated = if ratio.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    };
    let pct = ratio
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|p| {
            p.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
        })
        .unwrap_or(saturated);
    match cap {
        PercentCap::Uncapped => pct,
        PercentCap::Capped(max) => pct.min(i64::from(max)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTier {
    Under,
    Near,
    Over,
}

impl StatusTier {
    pub fn from_ratio(ratio: Decimal) -> Self {
        if ratio >= OVER_THRESHOLD {
            StatusTier::Over
        } else if ratio >= NEAR_THRESHOLD {
            StatusTier::Near
        } else {
            StatusTier::Under
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusTier::Under => "under",
            StatusTier::Near => "near",
            StatusTier::Over => "over",
        }
    }

    pub fn color_name(&self) -> &'static str {
        match self {
            StatusTier::Under => "green",
            StatusTier::Near => "orange",
            StatusTier::Over => "red",
        }
    }
}

impl fmt::Display for StatusTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBudgetProgress {
    pub category: String,
    pub budget_amount: Decimal,
    pub current_spend: Decimal,
}

impl CategoryBudgetProgress {
    pub fn new(category: impl Into<String>, budget_amount: Decimal, current_spend: Decimal) -> Self {
        Self {
            category: category.into(),
            budget_amount,
            current_spend,
        }
    }

    pub fn spend_ratio(&self) -> Decimal {
        spend_ratio(self.current_spend, self.budget_amount)
    }

    pub fn is_over_budget(&self) -> bool {
        is_over_budget(self.current_spend, self.budget_amount)
    }

    pub fn remaining_amount(&self) -> Decimal {
        self.budget_amount
            .saturating_sub(self.current_spend)
            .max(Decimal::ZERO)
    }

    pub fn over_amount(&self) -> Decimal {
        self.current_spend
            .saturating_sub(self.budget_amount)
            .max(Decimal::ZERO)
    }

    /// Spend against an unbudgeted category has a zero ratio but still
    /// classifies as over.
    pub fn status(&self) -> StatusTier {
        if self.is_over_budget() {
            StatusTier::Over
        } else {
            StatusTier::from_ratio(self.spend_ratio())
        }
    }

    pub fn displayed_percent(&self, cap: PercentCap) -> i64 {
        displayed_percent(self.spend_ratio(), cap)
    }

    pub fn fill_fraction(&self) -> Decimal {
        fill_fraction(self.spend_ratio())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaceStatus {
    Under,
    OnTrack,
    SlightlyOver,
    Over,
}

impl PaceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaceStatus::Under => "under pace",
            PaceStatus::OnTrack => "on track",
            PaceStatus::SlightlyOver => "slightly over pace",
            PaceStatus::Over => "over pace",
        }
    }
}

impl fmt::Display for PaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bands on `spend_ratio - expected_spend_ratio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacePolicy {
    pub on_track_band: Decimal,
    pub slightly_over_band: Decimal,
}

impl Default for PacePolicy {
    fn default() -> Self {
        Self {
            on_track_band: dec!(0.05),
            slightly_over_band: dec!(0.15),
        }
    }
}

impl PacePolicy {
    pub fn classify(&self, delta: Decimal) -> PaceStatus {
        if delta < -self.on_track_band {
            PaceStatus::Under
        } else if delta <= self.on_track_band {
            PaceStatus::OnTrack
        } else if delta <= self.slightly_over_band {
            PaceStatus::SlightlyOver
        } else {
            PaceStatus::Over
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub monthly_amount: Decimal,
    pub current_spend: Decimal,
    pub days_elapsed: u32,
    pub days_in_month: u32,
    pub category_progress: Vec<CategoryBudgetProgress>,
}

impl BudgetProgress {
    pub fn new(
        monthly_amount: Decimal,
        current_spend: Decimal,
        days_elapsed: u32,
        days_in_month: u32,
    ) -> Self {
        Self {
            monthly_amount,
            current_spend,
            days_elapsed,
            days_in_month,
            category_progress: Vec::new(),
        }
    }

    /// Builds progress for `budget` as of `today`. Every allocation gets a
    /// row; spend in a category without an allocation gets a zero-budget row
    /// after them.
    pub fn for_date(budget: &Budget, spends: &[CategorySpend], today: NaiveDate) -> Self {
        let spent_in = |category: &str| -> Decimal {
            saturating_sum(
                spends
                    .iter()
                    .filter(|s| s.category == category)
                    .map(|s| s.amount),
            )
        };

        let mut category_progress: Vec<CategoryBudgetProgress> = budget
            .category_allocations
            .iter()
            .map(|a| CategoryBudgetProgress::new(&a.category, a.amount, spent_in(&a.category)))
            .collect();
        for s in spends {
            if category_progress.iter().all(|p| p.category != s.category) {
                category_progress.push(CategoryBudgetProgress::new(
                    &s.category,
                    Decimal::ZERO,
                    spent_in(&s.category),
                ));
            }
        }

        Self {
            monthly_amount: budget.monthly_amount,
            current_spend: saturating_sum(spends.iter().map(|s| s.amount)),
            days_elapsed: today.day(),
            days_in_month: days_in_month(today),
            category_progress,
        }
    }

    pub fn spend_ratio(&self) -> Decimal {
        spend_ratio(self.current_spend, self.monthly_amount)
    }

    pub fn is_over_budget(&self) -> bool {
        is_over_budget(self.current_spend, self.monthly_amount)
    }

    fn clamped_elapsed(&self) -> u32 {
        self.days_elapsed.min(self.days_in_month)
    }

    /// Share of the month a perfectly linear spender would have used by now.
    pub fn expected_spend_ratio(&self) -> Decimal {
        if self.days_in_month == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.clamped_elapsed()) / Decimal::from(self.days_in_month)
    }

    pub fn expected_spend_by_today(&self) -> Decimal {
        self.monthly_amount
            .saturating_mul(self.expected_spend_ratio())
    }

    pub fn pace_delta(&self) -> Decimal {
        self.spend_ratio()
            .saturating_sub(self.expected_spend_ratio())
    }

    pub fn pace_status(&self, policy: &PacePolicy) -> PaceStatus {
        if self.is_over_budget() {
            return PaceStatus::Over;
        }
        policy.classify(self.pace_delta())
    }

    pub fn remaining_amount(&self) -> Decimal {
        self.monthly_amount
            .saturating_sub(self.current_spend)
            .max(Decimal::ZERO)
    }

    pub fn over_amount(&self) -> Decimal {
        self.current_spend
            .saturating_sub(self.monthly_amount)
            .max(Decimal::ZERO)
    }

    /// Month-end spend if the current daily rate holds.
    pub fn projected_spend(&self) -> Decimal {
        let elapsed = self.clamped_elapsed();
        if elapsed == 0 {
            return self.current_spend;
        }
        (self.current_spend / Decimal::from(elapsed))
            .saturating_mul(Decimal::from(self.days_in_month))
    }

    /// What can still be spent per remaining day without going over.
    pub fn daily_allowance(&self) -> Decimal {
        let days_left = self.days_in_month - self.clamped_elapsed();
        if days_left == 0 {
            return self.remaining_amount();
        }
        self.remaining_amount() / Decimal::from(days_left)
    }

    pub fn over_budget_categories(&self) -> Vec<&CategoryBudgetProgress> {
        self.category_progress
            .iter()
            .filter(|p| p.is_over_budget())
            .collect()
    }
}
