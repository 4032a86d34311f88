// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Category allocation editing.
//!
//! An [`AllocationSession`] owns a working copy of a budget's allocations for
//! the duration of one edit. In [`RedistributionMode::ProportionalToTarget`]
//! every direct edit locks the edited category and spreads whatever is left
//! of the target over the unlocked categories, in proportion to their amounts
//! at the start of the session. In [`RedistributionMode::Independent`] edits
//! only touch the edited category and the total floats.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::models::{Budget, CategoryAllocation, CategoryAmount};
use crate::utils::saturating_sum;

/// Amounts closer than this to their session baseline count as unchanged.
pub const EDIT_TOLERANCE: Decimal = dec!(0.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedistributionMode {
    #[default]
    ProportionalToTarget,
    Independent,
}

impl RedistributionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedistributionMode::ProportionalToTarget => "proportional",
            RedistributionMode::Independent => "independent",
        }
    }
}

impl fmt::Display for RedistributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RedistributionMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "proportional" | "proportional_to_target" | "proportional-to-target" => {
                Ok(RedistributionMode::ProportionalToTarget)
            }
            "independent" => Ok(RedistributionMode::Independent),
            other => Err(CoreError::UnknownMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditableAllocation {
    pub category: String,
    pub amount: Decimal,
    pub original_amount: Decimal,
    pub is_locked: bool,
}

impl EditableAllocation {
    fn seeded(category: &str, amount: Decimal) -> Self {
        Self {
            category: category.to_string(),
            amount,
            original_amount: amount,
            is_locked: false,
        }
    }

    pub fn is_edited(&self, mode: RedistributionMode) -> bool {
        let moved = (self.amount - self.original_amount).abs() > EDIT_TOLERANCE;
        match mode {
            RedistributionMode::ProportionalToTarget => moved || self.is_locked,
            RedistributionMode::Independent => moved,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AllocationSession {
    mode: RedistributionMode,
    target: Decimal,
    allocations: Vec<EditableAllocation>,
}

impl AllocationSession {
    /// Opens a session over `allocations`. Lock flags carried on the input are
    /// ignored: locks only ever describe edits made in this session.
    pub fn new(
        mode: RedistributionMode,
        target: Decimal,
        allocations: &[CategoryAllocation],
    ) -> Result<Self, CoreError> {
        if target < Decimal::ZERO {
            return Err(CoreError::NegativeAmount(target));
        }
        let mut seeded: Vec<EditableAllocation> = Vec::with_capacity(allocations.len());
        for a in allocations {
            if a.amount < Decimal::ZERO {
                return Err(CoreError::NegativeAmount(a.amount));
            }
            if seeded.iter().any(|s| s.category == a.category) {
                return Err(CoreError::DuplicateCategory(a.category.clone()));
            }
            seeded.push(EditableAllocation::seeded(&a.category, a.amount));
        }
        Ok(Self {
            mode,
            target,
            allocations: seeded,
        })
    }

    pub fn from_budget(budget: &Budget, mode: RedistributionMode) -> Result<Self, CoreError> {
        Self::new(mode, budget.monthly_amount, &budget.category_allocations)
    }

    pub fn mode(&self) -> RedistributionMode {
        self.mode
    }

    pub fn target(&self) -> Decimal {
        self.target
    }

    pub fn allocations(&self) -> &[EditableAllocation] {
        &self.allocations
    }

    pub fn get(&self, category: &str) -> Option<&EditableAllocation> {
        self.allocations.iter().find(|a| a.category == category)
    }

    pub fn index_of(&self, category: &str) -> Result<usize, CoreError> {
        self.allocations
            .iter()
            .position(|a| a.category == category)
            .ok_or_else(|| CoreError::UnknownCategory(category.to_string()))
    }

    fn check_index(&self, index: usize) -> Result<(), CoreError> {
        if index >= self.allocations.len() {
            return Err(CoreError::IndexOutOfRange {
                index,
                len: self.allocations.len(),
            });
        }
        Ok(())
    }

    /// Sets one category's amount directly. In proportional mode the category
    /// becomes locked and the free categories are recomputed.
    pub fn edit_category(&mut self, index: usize, new_amount: Decimal) -> Result<(), CoreError> {
        self.check_index(index)?;
        if new_amount < Decimal::ZERO {
            return Err(CoreError::NegativeAmount(new_amount));
        }
        let edited = &mut self.allocations[index];
        edited.amount = new_amount;
        if self.mode == RedistributionMode::ProportionalToTarget {
            edited.is_locked = true;
        }
        self.redistribute();
        Ok(())
    }

    pub fn edit(&mut self, category: &str, new_amount: Decimal) -> Result<(), CoreError> {
        let index = self.index_of(category)?;
        self.edit_category(index, new_amount)
    }

    /// Puts one category back to its session baseline and unlocks it.
    pub fn reset_category(&mut self, index: usize) -> Result<(), CoreError> {
        self.check_index(index)?;
        let a = &mut self.allocations[index];
        a.amount = a.original_amount;
        a.is_locked = false;
        self.redistribute();
        Ok(())
    }

    pub fn reset(&mut self, category: &str) -> Result<(), CoreError> {
        let index = self.index_of(category)?;
        self.reset_category(index)
    }

    pub fn reset_all(&mut self) {
        for a in &mut self.allocations {
            a.amount = a.original_amount;
            a.is_locked = false;
        }
    }

    /// Adds a category that was not part of the budget when the session
    /// opened. Its baseline is zero, so it never receives a proportional share.
    pub fn add_category(&mut self, category: &str, amount: Decimal) -> Result<(), CoreError> {
        if amount < Decimal::ZERO {
            return Err(CoreError::NegativeAmount(amount));
        }
        if self.get(category).is_some() {
            return Err(CoreError::DuplicateCategory(category.to_string()));
        }
        let mut added = EditableAllocation::seeded(category, Decimal::ZERO);
        added.amount = amount;
        added.is_locked = self.mode == RedistributionMode::ProportionalToTarget;
        self.allocations.push(added);
        self.redistribute();
        Ok(())
    }

    pub fn remove_category(&mut self, category: &str) -> Result<EditableAllocation, CoreError> {
        let index = self.index_of(category)?;
        let removed = self.allocations.remove(index);
        self.redistribute();
        Ok(removed)
    }

    pub fn total(&self) -> Decimal {
        saturating_sum(self.allocations.iter().map(|a| a.amount))
    }

    pub fn locked_total(&self) -> Decimal {
        saturating_sum(
            self.allocations
                .iter()
                .filter(|a| a.is_locked)
                .map(|a| a.amount),
        )
    }

    /// Allocated total minus target. Positive means over-allocated.
    pub fn difference(&self) -> Decimal {
        self.total().saturating_sub(self.target)
    }

    /// The monthly amount a save should record: the fixed target when
    /// redistributing, otherwise whatever the categories add up to.
    pub fn effective_target(&self) -> Decimal {
        match self.mode {
            RedistributionMode::ProportionalToTarget => self.target,
            RedistributionMode::Independent => self.total(),
        }
    }

    pub fn has_edits(&self) -> bool {
        self.allocations.iter().any(|a| a.is_edited(self.mode))
    }

    /// Ends the session, yielding the allocations to persist. Zero amounts are
    /// dropped.
    pub fn finish(self) -> Vec<CategoryAmount> {
        self.allocations
            .into_iter()
            .filter(|a| !a.amount.is_zero())
            .map(|a| CategoryAmount {
                category: a.category,
                amount: a.amount,
            })
            .collect()
    }

    fn redistribute(&mut self) {
        if self.mode == RedistributionMode::Independent {
            return;
        }
        let locked_total = self.locked_total();
        let remaining = self.target - locked_total;
        let free_count = self.allocations.iter().filter(|a| !a.is_locked).count();
        if free_count == 0 || remaining <= Decimal::ZERO {
            debug!(%locked_total, %remaining, free_count, "nothing to redistribute");
            return;
        }
        let free_original_total = saturating_sum(
            self.allocations
                .iter()
                .filter(|a| !a.is_locked)
                .map(|a| a.original_amount),
        );
        if free_original_total.is_zero() {
            debug!(free_count, "free categories have no baseline; skipping");
            return;
        }
        debug!(%locked_total, %remaining, free_count, "redistributing");
        for a in self.allocations.iter_mut().filter(|a| !a.is_locked) {
            let share = a.original_amount / free_original_total;
            a.amount = (remaining * share).max(Decimal::ZERO);
        }
    }
}
