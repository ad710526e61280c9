//! Postgres access wrapper.
//!
//! Holds at most one live connection, opened lazily and re-opened when it has been dropped.
//! Not meant to be shared between concurrent callers; it is only used during startup and by
//! the one-shot CLI commands.

mod value;

pub use value::{record_from_row, Record};

use crate::config::DatabaseParams;
use crate::error::{DeskError, Result};
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::Connection;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

/// Lazily-connected Postgres wrapper.
pub struct Database {
    options: PgConnectOptions,
    conn: Option<PgConnection>,
}

impl Database {
    /// Create a wrapper from validated connection parameters. No connection is opened yet.
    pub fn new(params: &DatabaseParams) -> Result<Self> {
        let ssl_mode = PgSslMode::from_str(&params.ssl_mode).map_err(|e| {
            DeskError::Config(format!("Invalid database ssl_mode '{}': {}", params.ssl_mode, e))
        })?;

        let options = PgConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .database(&params.name)
            .username(&params.user)
            .password(&params.password)
            .ssl_mode(ssl_mode);

        Ok(Self {
            options,
            conn: None,
        })
    }

    /// Open the connection if it is absent, returning it.
    pub async fn connect(&mut self) -> Result<&mut PgConnection> {
        if self.conn.is_none() {
            let conn = PgConnection::connect_with(&self.options)
                .await
                .map_err(|e| DeskError::database("Failed to connect to PostgreSQL", e))?;
            info!("Connected to PostgreSQL");
            self.conn = Some(conn);
        }

        self.conn
            .as_mut()
            .ok_or_else(|| DeskError::Database("Connection unavailable".to_string()))
    }

    /// Close the connection if one is open.
    pub async fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.close().await {
                warn!("Error while closing PostgreSQL connection: {}", e);
            } else {
                debug!("Closed PostgreSQL connection");
            }
        }
    }

    /// Whether a connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Open a scoped session. The connection is released when the session ends,
    /// whether it is closed explicitly or simply dropped.
    pub async fn session(&mut self) -> Result<DbSession<'_>> {
        self.connect().await?;
        Ok(DbSession { db: self })
    }

    /// Run a query and return every row as a column-name to value record.
    #[instrument(skip(self, params))]
    pub async fn fetch_all(&mut self, query: &str, params: &[&str]) -> Result<Vec<Record>> {
        let conn = self.connect().await?;

        let mut statement = sqlx::query(query);
        for param in params {
            statement = statement.bind(param.to_string());
        }

        match statement.fetch_all(&mut *conn).await {
            Ok(rows) => {
                debug!("Fetched {} rows", rows.len());
                Ok(rows.iter().map(record_from_row).collect())
            }
            Err(e) => {
                self.forget_if_broken(&e);
                Err(DeskError::database("Query failed", e))
            }
        }
    }

    /// Run a statement inside a transaction, committing on success and rolling back on failure.
    /// Returns the number of affected rows.
    #[instrument(skip(self, params))]
    pub async fn execute(&mut self, query: &str, params: &[&str]) -> Result<u64> {
        let conn = self.connect().await?;

        let outcome = async {
            let mut tx = conn.begin().await?;

            let mut statement = sqlx::query(query);
            for param in params {
                statement = statement.bind(param.to_string());
            }

            let result = statement.execute(&mut *tx).await?;
            tx.commit().await?;
            Ok::<u64, sqlx::Error>(result.rows_affected())
        }
        .await;

        outcome.map_err(|e| {
            self.forget_if_broken(&e);
            DeskError::database("Command failed", e)
        })
    }

    /// List the base tables of a schema, ordered by name.
    pub async fn list_tables(&mut self, schema: &str) -> Result<Vec<String>> {
        let rows = self
            .fetch_all(
                r#"
                SELECT table_name::text AS table_name
                FROM information_schema.tables
                WHERE table_schema::text = $1
                  AND table_type = 'BASE TABLE'
                ORDER BY table_name
                "#,
                &[schema],
            )
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get("table_name").and_then(Value::as_str))
            .map(String::from)
            .collect())
    }

    /// Drop the connection after transport-level failures so the next call reconnects.
    fn forget_if_broken(&mut self, err: &sqlx::Error) {
        if matches!(
            err,
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_)
        ) {
            warn!("Discarding broken PostgreSQL connection: {}", err);
            self.conn = None;
        }
    }
}

/// A connection scope over a [`Database`].
pub struct DbSession<'a> {
    db: &'a mut Database,
}

impl DbSession<'_> {
    /// End the session, closing the connection gracefully.
    pub async fn close(self) {
        self.db.disconnect().await;
    }
}

impl Deref for DbSession<'_> {
    type Target = Database;

    fn deref(&self) -> &Database {
        &*self.db
    }
}

impl DerefMut for DbSession<'_> {
    fn deref_mut(&mut self) -> &mut Database {
        &mut *self.db
    }
}

impl Drop for DbSession<'_> {
    fn drop(&mut self) {
        if self.db.conn.take().is_some() {
            debug!("Database session dropped; connection released");
        }
    }
}

/// Quote a (possibly schema-qualified) table name as a SQL identifier.
pub fn quote_table_name(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params() -> DatabaseParams {
        DatabaseParams {
            host: "localhost".to_string(),
            name: "loja".to_string(),
            user: "app".to_string(),
            password: "secret".to_string(),
            port: 5432,
            ssl_mode: "require".to_string(),
        }
    }

    #[test]
    fn test_quote_table_name() {
        assert_eq!(quote_table_name("cliente"), "\"cliente\"");
        assert_eq!(quote_table_name("public.venda"), "\"public\".\"venda\"");
        assert_eq!(quote_table_name("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_new_is_lazy() {
        let db = Database::new(&params()).unwrap();
        assert!(!db.is_connected());
    }

    #[test]
    fn test_invalid_ssl_mode() {
        let mut p = params();
        p.ssl_mode = "sometimes".to_string();
        assert!(matches!(Database::new(&p), Err(DeskError::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_database_is_wrapped() {
        let mut p = params();
        p.port = 1;
        p.ssl_mode = "disable".to_string();
        let mut db = Database::new(&p).unwrap();

        let err = db.fetch_all("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, DeskError::Database(_)));
        assert!(!db.is_connected());

        let err = db
            .execute("DELETE FROM venda WHERE id = $1", &["7"])
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Database error: Failed to connect"));
    }

    // The tests below need a reachable Postgres named by DATABASE_URL and return early
    // when it is unset.

    fn live_database() -> Option<Database> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let options = PgConnectOptions::from_str(&url).ok()?;
        Some(Database {
            options,
            conn: None,
        })
    }

    #[tokio::test]
    async fn test_session_releases_connection() {
        let Some(mut db) = live_database() else {
            return;
        };

        let mut session = db.session().await.unwrap();
        assert!(session.is_connected());
        let rows = session.fetch_all("SELECT 1 AS one", &[]).await.unwrap();
        assert_eq!(rows[0]["one"], json!(1));
        session.close().await;
        assert!(!db.is_connected());

        {
            let session = db.session().await.unwrap();
            assert!(session.is_connected());
        }
        assert!(!db.is_connected());
    }

    #[tokio::test]
    async fn test_reconnects_lazily_after_session() {
        let Some(mut db) = live_database() else {
            return;
        };

        db.session().await.unwrap().close().await;
        assert!(!db.is_connected());

        let rows = db.fetch_all("SELECT $1::text AS eco", &["oi"]).await.unwrap();
        assert_eq!(rows[0]["eco"], json!("oi"));
        assert!(db.is_connected());
        db.disconnect().await;
    }

    #[tokio::test]
    async fn test_execute_commits_and_rolls_back() {
        let Some(mut db) = live_database() else {
            return;
        };

        db.execute("CREATE TEMP TABLE contador (id int PRIMARY KEY, nome text)", &[])
            .await
            .unwrap();
        let inserted = db
            .execute(
                "INSERT INTO contador (id, nome) VALUES ($1::int, $2)",
                &["1", "loja"],
            )
            .await
            .unwrap();
        assert_eq!(inserted, 1);

        let err = db
            .execute(
                "INSERT INTO contador (id, nome) VALUES (2, 'nova'), (1, 'duplicada')",
                &[],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::Database(_)));

        // The failed transaction must not leave the connection in an aborted state.
        let rows = db
            .fetch_all("SELECT id, nome FROM contador ORDER BY id", &[])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["nome"], json!("loja"));
        db.disconnect().await;
    }

    #[tokio::test]
    async fn test_list_tables_is_ordered_by_name() {
        let Some(mut db) = live_database() else {
            return;
        };

        let schema = format!("desk_test_{}", uuid::Uuid::new_v4().simple());
        db.execute(&format!("CREATE SCHEMA {}", schema), &[])
            .await
            .unwrap();
        for table in ["zeta", "alfa", "meio"] {
            db.execute(&format!("CREATE TABLE {}.{} (id int)", schema, table), &[])
                .await
                .unwrap();
        }
        db.execute(&format!("CREATE VIEW {}.visao AS SELECT 1 AS id", schema), &[])
            .await
            .unwrap();

        let tables = db.list_tables(&schema).await;
        db.execute(&format!("DROP SCHEMA {} CASCADE", schema), &[])
            .await
            .unwrap();

        assert_eq!(tables.unwrap(), vec!["alfa", "meio", "zeta"]);
        db.disconnect().await;
    }

    async fn create_produto(db: &mut Database) {
        db.execute(
            r#"CREATE TEMP TABLE produto (
                id int,
                nome text,
                tags text[],
                notas int4[],
                garantia interval,
                preco numeric(10, 2),
                saldo money,
                criado date,
                atualizado timestamp,
                foto bytea,
                ativo bool,
                dados jsonb,
                peso float8,
                codigo uuid,
                vazio text
            )"#,
            &[],
        )
        .await
        .unwrap();

        db.execute(
            r#"INSERT INTO produto VALUES (
                7,
                'Café',
                ARRAY['cafe', NULL, 'moido'],
                ARRAY[1, 2],
                interval '1 year 2 mons 3 days 04:05:06',
                12.75,
                12.34::numeric::money,
                '2024-01-15',
                '2024-01-15 10:30:00',
                decode('6361', 'hex'),
                true,
                '{"origem": "Minas"}',
                1.5,
                'a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11',
                NULL
            )"#,
            &[],
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_row_values_are_coerced() {
        let Some(mut db) = live_database() else {
            return;
        };
        create_produto(&mut db).await;

        let rows = db.fetch_all("SELECT * FROM produto", &[]).await.unwrap();
        let record = &rows[0];

        let columns: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(
            columns,
            vec![
                "id", "nome", "tags", "notas", "garantia", "preco", "saldo", "criado",
                "atualizado", "foto", "ativo", "dados", "peso", "codigo", "vazio"
            ]
        );
        assert_eq!(
            Value::Object(record.clone()),
            json!({
                "id": 7,
                "nome": "Café",
                "tags": ["cafe", null, "moido"],
                "notas": [1, 2],
                "garantia": "1 year 2 mons 3 days 04:05:06",
                "preco": "12.75",
                "saldo": "12.34",
                "criado": "2024-01-15",
                "atualizado": "2024-01-15 10:30:00",
                "foto": "\\x6361",
                "ativo": true,
                "dados": {"origem": "Minas"},
                "peso": 1.5,
                "codigo": "a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11",
                "vazio": null
            })
        );
        db.disconnect().await;
    }

    #[tokio::test]
    async fn test_exported_document_has_no_wire_bytes() {
        let Some(mut db) = live_database() else {
            return;
        };
        create_produto(&mut db).await;

        let text = crate::corpus::export_table(&mut db, "produto")
            .await
            .into_text();

        assert!(text.starts_with("Contexto da Tabela 'produto':\n["));
        assert!(!text.contains("\\u0000"));
        assert!(text.contains("\"garantia\": \"1 year 2 mons 3 days 04:05:06\""));
        assert!(!db.is_connected());
    }
}
