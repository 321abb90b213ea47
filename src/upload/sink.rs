//! SQL execution channels.
//!
//! [`SqlSink`] is the whole contract the uploader needs: run one statement,
//! or run a query and get rows back as JSON objects. [`WranglerSink`] goes
//! through the Cloudflare `wrangler` CLI against D1; [`SqliteSink`] writes a
//! local SQLite mirror with the same tables.

use super::schema::SCHEMA_SQL;
use crate::utils::truncate_for_log;
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// One result row, column name to value.
pub type Row = Map<String, Value>;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("statement failed (exit {status:?}): {stderr}")]
    Command { status: Option<i32>, stderr: String },

    #[error("unparseable sink output: {0}")]
    Output(String),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP API {url}: {reason}")]
    Api { url: String, reason: String },
}

pub trait SqlSink {
    /// Execute one statement.
    async fn execute(&self, sql: &str) -> Result<(), SinkError>;
    /// Run a query and return its rows.
    async fn query(&self, sql: &str) -> Result<Vec<Row>, SinkError>;
}

/// `npx wrangler d1 execute <database> --command <sql> --json [--remote]`.
#[derive(Debug, Clone)]
pub struct WranglerSink {
    database: String,
    remote: bool,
}

impl WranglerSink {
    pub fn new(database: impl Into<String>, remote: bool) -> Self {
        Self {
            database: database.into(),
            remote,
        }
    }

    fn command(&self, sql: &str) -> Command {
        let mut cmd = Command::new("npx");
        cmd.args(["wrangler", "d1", "execute", &self.database, "--command", sql, "--json"]);
        if self.remote {
            cmd.arg("--remote");
        }
        cmd.kill_on_drop(true);
        cmd
    }

    #[instrument(level = "debug", skip_all, fields(database = %self.database, remote = self.remote))]
    async fn run(&self, sql: &str) -> Result<String, SinkError> {
        debug!(sql = %truncate_for_log(sql, 160), "wrangler d1 execute");
        let output = self
            .command(sql)
            .output()
            .await
            .map_err(|source| SinkError::Spawn {
                program: "npx wrangler".to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(SinkError::Command {
                status: output.status.code(),
                stderr: truncate_for_log(detail.trim(), 500),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl SqlSink for WranglerSink {
    async fn execute(&self, sql: &str) -> Result<(), SinkError> {
        self.run(sql).await.map(|_| ())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, SinkError> {
        let stdout = self.run(sql).await?;
        parse_wrangler_rows(&stdout)
    }
}

#[derive(Debug, Deserialize)]
struct WranglerResult {
    #[serde(default)]
    results: Vec<Row>,
}

/// Rows from `wrangler ... --json` output: `[{"results": [...], ...}]`,
/// possibly preceded by banner lines and followed by trailing text.
pub fn parse_wrangler_rows(stdout: &str) -> Result<Vec<Row>, SinkError> {
    let start = stdout
        .find('[')
        .ok_or_else(|| SinkError::Output(truncate_for_log(stdout.trim(), 200)))?;
    let envelopes = serde_json::Deserializer::from_str(&stdout[start..])
        .into_iter::<Vec<WranglerResult>>()
        .next()
        .ok_or_else(|| SinkError::Output("empty JSON output".to_string()))?
        .map_err(|e| SinkError::Output(e.to_string()))?;
    Ok(envelopes.into_iter().flat_map(|e| e.results).collect())
}

/// SQLite database with the hero tables created on open.
#[derive(Debug)]
pub struct SqliteSink {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteSink {
    /// Open (or create) a database file.
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        info!(path = %path.display(), "Opened SQLite sink");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// In-memory database (for testing).
    pub fn in_memory() -> Result<Self, SinkError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

impl SqlSink for SqliteSink {
    async fn execute(&self, sql: &str) -> Result<(), SinkError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute_batch(sql)?;
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, SinkError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (i, name) in columns.iter().enumerate() {
                record.insert(name.clone(), json_value(row.get_ref(i)?));
            }
            out.push(record);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrangler_rows_skips_banner() {
        let stdout = r#"
 ⛅️ wrangler 3.80.0
-------------------
[
  {
    "results": [{"id": 1, "name": "Miya"}, {"id": 2, "name": "Layla"}],
    "success": true,
    "meta": {"duration": 0.2}
  }
]
"#;
        let rows = parse_wrangler_rows(stdout).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["name"], "Layla");
        assert_eq!(rows[0]["id"], 1);
    }

    #[test]
    fn test_parse_wrangler_rows_rejects_non_json() {
        let err = parse_wrangler_rows("✘ [ERROR] no such table: heroes").unwrap_err();
        assert!(matches!(err, SinkError::Output(_)));
    }

    #[test]
    fn test_wrangler_command_flags() {
        let cmd = WranglerSink::new("mlbb-tools-db", true).command("SELECT 1");
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec!["wrangler", "d1", "execute", "mlbb-tools-db", "--command", "SELECT 1", "--json", "--remote"]
        );
    }

    #[tokio::test]
    async fn test_sqlite_roundtrip_and_upsert_targets() {
        let sink = SqliteSink::in_memory().unwrap();
        sink.execute("INSERT INTO heroes (name, role) VALUES ('Miya', 'Marksman');")
            .await
            .unwrap();
        for _ in 0..2 {
            sink.execute(
                "INSERT OR REPLACE INTO abilities (hero_id, ability_type, name) VALUES (1, 'Passive', 'Moon Blessing');",
            )
            .await
            .unwrap();
        }
        let rows = sink.query("SELECT COUNT(*) AS n FROM abilities").await.unwrap();
        assert_eq!(rows[0]["n"], 1);

        let heroes = sink.query("SELECT id, name FROM heroes").await.unwrap();
        assert_eq!(heroes[0]["name"], "Miya");
    }

    #[tokio::test]
    async fn test_sqlite_foreign_key_violation_is_error() {
        let sink = SqliteSink::in_memory().unwrap();
        let err = sink
            .execute("INSERT INTO lore (hero_id, background) VALUES (99, 'x');")
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Sqlite(_)));
    }

    #[tokio::test]
    async fn test_sqlite_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heroes.db");
        {
            let sink = SqliteSink::open(&path).unwrap();
            sink.execute("INSERT INTO heroes (name, role) VALUES ('Layla', 'Marksman');")
                .await
                .unwrap();
        }
        let sink = SqliteSink::open(&path).unwrap();
        assert_eq!(sink.path(), Some(path.as_path()));
        let rows = sink.query("SELECT name FROM heroes").await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
