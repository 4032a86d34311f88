// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::CoreError;

pub const DEFAULT_SNAP_STEP: Decimal = dec!(5);

/// Keeps ASCII digits and the first decimal point; everything else a user
/// might type (currency symbols, separators, signs, letters) is dropped.
pub fn sanitize_amount_input(raw: &str) -> String {
    let mut seen_point = false;
    raw.chars()
        .filter(|c| match c {
            '0'..='9' => true,
            '.' if !seen_point => {
                seen_point = true;
                true
            }
            _ => false,
        })
        .collect()
}

/// Parses typed amount text after filtering. Empty input reads as zero;
/// digits that do not fit a `Decimal` are an error, never a silent zero.
pub fn parse_amount_input(raw: &str) -> Result<Decimal, CoreError> {
    let clean = sanitize_amount_input(raw);
    if clean.is_empty() || clean == "." {
        return Ok(Decimal::ZERO);
    }
    clean
        .parse::<Decimal>()
        .map_err(|_| CoreError::AmountOutOfRange(clean))
}

/// Snaps typed amounts to a fixed step before they reach an allocation
/// session. A zero step leaves amounts untouched, as does a step too small
/// to divide the amount without overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizePolicy {
    step: Decimal,
}

impl Default for QuantizePolicy {
    fn default() -> Self {
        Self {
            step: DEFAULT_SNAP_STEP,
        }
    }
}

impl QuantizePolicy {
    pub fn new(step: Decimal) -> Result<Self, CoreError> {
        if step < Decimal::ZERO {
            return Err(CoreError::InvalidSetting {
                key: "snap_step".into(),
                value: step.to_string(),
            });
        }
        Ok(Self { step })
    }

    pub fn none() -> Self {
        Self {
            step: Decimal::ZERO,
        }
    }

    pub fn step(&self) -> Decimal {
        self.step
    }

    pub fn snap(&self, amount: Decimal) -> Decimal {
        if self.step.is_zero() {
            return amount;
        }
        amount
            .checked_div(self.step)
            .map(|q| q.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|q| q.checked_mul(self.step))
            .unwrap_or(amount)
    }
}

impl FromStr for QuantizePolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let step = s
            .trim()
            .parse::<Decimal>()
            .map_err(|_| CoreError::InvalidSetting {
                key: "snap_step".into(),
                value: s.to_string(),
            })?;
        Self::new(step)
    }
}
