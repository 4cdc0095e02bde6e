// SPDX-License-Identifier: MIT

//! taxis: AI-assisted directory organizer
//!
//! Scans a source directory, assigns each file to a category, optionally
//! asks a remote model to refine the category or suggest a better name,
//! then moves the file into a category subfolder while recording enough
//! history to undo the whole session.

pub mod classify;
pub mod config;
pub mod error;
pub mod history;
pub mod media;
pub mod metadata;
pub mod model;
pub mod naming;
pub mod rules;
pub mod sorter;
pub mod undo;

pub use config::AppConfig;
pub use error::{Result, TaxisError};
