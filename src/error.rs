// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Allocation index {index} out of range ({len} allocations)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Category '{0}' is not part of this budget")]
    UnknownCategory(String),
    #[error("Category '{0}' is already allocated")]
    DuplicateCategory(String),
    #[error("Amount {0} is negative")]
    NegativeAmount(Decimal),
    #[error("Amount '{0}' is out of range")]
    AmountOutOfRange(String),
    #[error("Unknown redistribution mode '{0}' (use proportional|independent)")]
    UnknownMode(String),
    #[error("Invalid value '{value}' for setting '{key}'")]
    InvalidSetting { key: String, value: String },
}
