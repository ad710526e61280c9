//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting operations
//! that would otherwise fail midway.

use crate::config::{DatabaseParams, Settings};
use crate::error::Result;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Serving and asking need the database, the API key and a table list.
    Answer,
    /// Exporting or listing tables only needs the database.
    Database,
}

/// Run pre-flight checks for the given operation.
///
/// Returns the validated database parameters, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<DatabaseParams> {
    match operation {
        Operation::Answer => settings.validate(),
        Operation::Database => settings.database.validate(),
    }
}
