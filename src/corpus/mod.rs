//! Knowledge corpus construction.
//!
//! Each configured table is scanned in full and rendered as one text document.
//! A table that cannot be read yields an empty placeholder so the corpus always has
//! one document per configured table, in order.

use crate::database::{quote_table_name, Database, Record};
use crate::error::{DeskError, Result};
use async_trait::async_trait;
use tracing::{error, info, instrument};

/// Source of full table snapshots.
#[async_trait]
pub trait RowSource: Send {
    /// Return every row of `table`.
    async fn scan_table(&mut self, table: &str) -> Result<Vec<Record>>;
}

#[async_trait]
impl RowSource for Database {
    async fn scan_table(&mut self, table: &str) -> Result<Vec<Record>> {
        if table.trim().is_empty() {
            return Err(DeskError::InvalidInput("Table name must not be empty".to_string()));
        }
        let query = format!("SELECT * FROM {};", quote_table_name(table));

        let mut session = self.session().await?;
        let rows = session.fetch_all(&query, &[]).await;
        session.close().await;
        rows
    }
}

/// A rendered table snapshot, tagged with its source table.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeDocument {
    /// Source table name.
    pub table: String,
    /// Text handed to the embedder and the LLM. Empty for placeholders.
    pub text: String,
}

impl KnowledgeDocument {
    /// Render a table snapshot.
    pub fn render(table: &str, rows: &[Record]) -> Result<Self> {
        let body = serde_json::to_string_pretty(rows)?;
        Ok(Self {
            table: table.to_string(),
            text: format!("Contexto da Tabela '{}':\n{}", table, body),
        })
    }

    /// Empty stand-in for a table that could not be exported.
    pub fn placeholder(table: &str) -> Self {
        Self {
            table: table.to_string(),
            text: String::new(),
        }
    }

    /// Whether this document carries no content.
    pub fn is_placeholder(&self) -> bool {
        self.text.is_empty()
    }
}

/// Outcome of exporting one table.
#[derive(Debug, Clone)]
pub enum TableExport {
    /// The table was read and rendered.
    Exported {
        document: KnowledgeDocument,
        row_count: usize,
    },
    /// The table could not be read or rendered.
    Failed { table: String, reason: String },
}

impl TableExport {
    /// Whether the export failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, TableExport::Failed { .. })
    }

    /// Collapse into a document, substituting an empty placeholder on failure.
    pub fn into_document(self) -> KnowledgeDocument {
        match self {
            TableExport::Exported { document, .. } => document,
            TableExport::Failed { table, .. } => KnowledgeDocument::placeholder(&table),
        }
    }

    /// Collapse into the document text; empty on failure.
    pub fn into_text(self) -> String {
        self.into_document().text
    }
}

/// Export a single table. Failures are logged and reported, never propagated.
#[instrument(skip(source))]
pub async fn export_table<S: RowSource + ?Sized>(source: &mut S, table: &str) -> TableExport {
    let rendered = match source.scan_table(table).await {
        Ok(rows) => KnowledgeDocument::render(table, &rows).map(|doc| (doc, rows.len())),
        Err(e) => Err(e),
    };

    match rendered {
        Ok((document, row_count)) => {
            info!("Exported table '{}' ({} rows)", table, row_count);
            TableExport::Exported {
                document,
                row_count,
            }
        }
        Err(e) => {
            error!("Failed to export table '{}': {}", table, e);
            TableExport::Failed {
                table: table.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

/// The fixed, ordered set of knowledge documents.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeCorpus {
    documents: Vec<KnowledgeDocument>,
    failed_tables: Vec<String>,
}

impl KnowledgeCorpus {
    /// Documents in table order, placeholders included.
    pub fn documents(&self) -> &[KnowledgeDocument] {
        &self.documents
    }

    /// Tables whose export failed.
    pub fn failed_tables(&self) -> &[String] {
        &self.failed_tables
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Document texts in order, empty strings for failed tables.
    pub fn texts(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.text.clone()).collect()
    }

    pub fn into_documents(self) -> Vec<KnowledgeDocument> {
        self.documents
    }
}

/// Builds the knowledge corpus from a fixed list of tables.
pub struct CorpusBuilder {
    tables: Vec<String>,
}

impl CorpusBuilder {
    /// Create a builder over the given tables.
    pub fn new(tables: Vec<String>) -> Self {
        Self { tables }
    }

    /// Export every table in order.
    pub async fn build<S: RowSource + ?Sized>(&self, source: &mut S) -> KnowledgeCorpus {
        let mut corpus = KnowledgeCorpus::default();

        for table in &self.tables {
            let export = export_table(source, table).await;
            if export.is_failed() {
                corpus.failed_tables.push(table.clone());
            }
            corpus.documents.push(export.into_document());
        }

        info!(
            "Built knowledge corpus: {} documents ({} failed)",
            corpus.documents.len(),
            corpus.failed_tables.len()
        );

        corpus
    }
}
