// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod allocation;
pub mod cli;
pub mod commands;
pub mod db;
pub mod error;
pub mod input;
pub mod logging;
pub mod models;
pub mod progress;
pub mod registry;
pub mod utils;

pub use error::CoreError;
