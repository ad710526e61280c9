//! Export command: print the knowledge document of a single table.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::corpus::{export_table, TableExport};
use crate::database::Database;
use anyhow::Result;

/// Run the export command.
pub async fn run_export(table: &str, settings: Settings) -> Result<()> {
    let params = preflight::check(Operation::Database, &settings)?;
    let mut database = Database::new(&params)?;

    match export_table(&mut database, table).await {
        TableExport::Exported {
            document,
            row_count,
        } => {
            println!("{}", document.text);
            Output::success(&format!("Exported {} rows from '{}'", row_count, table));
            Ok(())
        }
        TableExport::Failed { table, reason } => {
            Output::error(&format!("Could not export '{}': {}", table, reason));
            anyhow::bail!("export of '{}' failed", table)
        }
    }
}
