//! Tables command: list the base tables of a schema.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::database::Database;
use anyhow::Result;

/// Run the tables command.
pub async fn run_tables(schema: &str, settings: Settings) -> Result<()> {
    let params = preflight::check(Operation::Database, &settings)?;
    let mut database = Database::new(&params)?;

    let tables = {
        let mut session = database.session().await?;
        let tables = session.list_tables(schema).await;
        session.close().await;
        tables?
    };

    if tables.is_empty() {
        Output::info(&format!("No tables found in schema '{}'.", schema));
        return Ok(());
    }

    Output::header(&format!("Tables in '{}' ({})", schema, tables.len()));
    for table in &tables {
        let marker = if settings.corpus.tables.contains(table) {
            " (indexed)"
        } else {
            ""
        };
        Output::list_item(&format!("{}{}", table, marker));
    }

    Ok(())
}
