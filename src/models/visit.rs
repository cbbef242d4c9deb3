use chrono::NaiveDateTime;
use sqlx::{AnyConnection, Connection};

use crate::config::Dialect;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

// Concurrent CREATE TABLE IF NOT EXISTS races on pg_type in PostgreSQL, so
// creators queue on this transaction-scoped advisory lock.
const SCHEMA_LOCK_KEY: i64 = 0x7669_7369_7473;

/// One page view. Both fields are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub id: i64,
    pub timestamp: NaiveDateTime,
}

fn create_table_sql(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Postgres => {
            r#"
            CREATE TABLE IF NOT EXISTS visits (
                id BIGSERIAL PRIMARY KEY,
                "timestamp" TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        // CURRENT_TIMESTAMP only has second resolution in SQLite.
        Dialect::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS visits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                "timestamp" TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            )
            "#
        }
    }
}

fn list_sql(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Postgres => {
            r#"SELECT id, to_char("timestamp", 'YYYY-MM-DD HH24:MI:SS.US') FROM visits ORDER BY "timestamp" DESC"#
        }
        Dialect::Sqlite => r#"SELECT id, "timestamp" FROM visits ORDER BY "timestamp" DESC"#,
    }
}

impl Visit {
    /// Create the visit table if it is absent. Safe to run on every request,
    /// including from concurrent connections.
    ///
    /// Runs in its own transaction, or a savepoint when `conn` is already in one;
    /// the schema lock is then held until the outer transaction ends.
    pub async fn ensure_schema(conn: &mut AnyConnection, dialect: Dialect) -> Result<(), sqlx::Error> {
        let mut tx = conn.begin().await?;
        if dialect == Dialect::Postgres {
            sqlx::query("SELECT 1 FROM pg_advisory_xact_lock($1)")
                .bind(SCHEMA_LOCK_KEY)
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query(create_table_sql(dialect)).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Append one visit stamped with the store's current time.
    pub async fn record(conn: &mut AnyConnection) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO visits DEFAULT VALUES")
            .execute(conn)
            .await?;
        Ok(())
    }

    /// All visits, most recent first.
    pub async fn list(conn: &mut AnyConnection, dialect: Dialect) -> Result<Vec<Visit>, sqlx::Error> {
        let rows: Vec<(i64, String)> = sqlx::query_as(list_sql(dialect)).fetch_all(conn).await?;

        rows.into_iter()
            .map(|(id, raw)| {
                let timestamp = NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
                    .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
                Ok(Visit { id, timestamp })
            })
            .collect()
    }

    /// Ensure the table, record this visit and commit, then read everything back.
    pub async fn record_and_list(
        conn: &mut AnyConnection,
        dialect: Dialect,
    ) -> Result<Vec<Visit>, sqlx::Error> {
        let mut tx = conn.begin().await?;
        Self::ensure_schema(&mut *tx, dialect).await?;
        Self::record(&mut *tx).await?;
        tx.commit().await?;

        Self::list(conn, dialect).await
    }
}
