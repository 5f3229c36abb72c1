use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::{debug, warn};

use crate::error::HubtrailError;
use crate::normalize::Properties;

use super::{ArtifactKind, ArtifactSummary, Direction, LineageEvent};

/// SQLite-backed lineage store.
///
/// The store is an owned handle; there is no process-wide instance. Open it
/// once per run and pass it to whatever needs to record or query lineage.
pub struct LineageStore {
    conn: Connection,
}

impl LineageStore {
    /// Open or create a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HubtrailError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open a throwaway store that lives only in memory.
    pub fn open_in_memory() -> Result<Self, HubtrailError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), HubtrailError> {
        self.conn.execute_batch(
            r"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS pipelines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS contexts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pipeline_id INTEGER NOT NULL REFERENCES pipelines(id),
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(pipeline_id, name)
            );

            CREATE TABLE IF NOT EXISTS executions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                context_id INTEGER NOT NULL REFERENCES contexts(id),
                name TEXT NOT NULL,
                started_at TEXT NOT NULL,
                finished_at TEXT
            );

            CREATE TABLE IF NOT EXISTS artifacts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                uri TEXT NOT NULL,
                properties_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(kind, uri)
            );

            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                execution_id INTEGER NOT NULL REFERENCES executions(id),
                artifact_id INTEGER NOT NULL REFERENCES artifacts(id),
                direction TEXT NOT NULL CHECK (direction IN ('INPUT', 'OUTPUT')),
                properties_json TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_artifact ON events(artifact_id);
            CREATE INDEX IF NOT EXISTS idx_events_execution ON events(execution_id);
            ",
        )?;
        Ok(())
    }

    /// Start recording an execution under `pipeline` / `context`.
    ///
    /// Pipelines and contexts are created on first use and reused after.
    /// Artifacts and events logged through the session commit together on
    /// [`LineageSession::finalize`].
    pub fn create_session(
        &self,
        pipeline: &str,
        context: &str,
        execution: &str,
    ) -> Result<LineageSession<'_>, HubtrailError> {
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT OR IGNORE INTO pipelines (name, created_at) VALUES (?1, ?2)",
            params![pipeline, now],
        )?;
        let pipeline_id: i64 = self.conn.query_row(
            "SELECT id FROM pipelines WHERE name = ?1",
            params![pipeline],
            |row| row.get(0),
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO contexts (pipeline_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![pipeline_id, context, now],
        )?;
        let context_id: i64 = self.conn.query_row(
            "SELECT id FROM contexts WHERE pipeline_id = ?1 AND name = ?2",
            params![pipeline_id, context],
            |row| row.get(0),
        )?;

        self.conn.execute(
            "INSERT INTO executions (context_id, name, started_at) VALUES (?1, ?2, ?3)",
            params![context_id, execution, now],
        )?;
        let execution_id = self.conn.last_insert_rowid();
        let tx = self.conn.unchecked_transaction()?;

        debug!(pipeline, context, execution, execution_id, "lineage session opened");

        Ok(LineageSession {
            store: self,
            tx: Some(tx),
            execution_id,
        })
    }

    /// Uris of every artifact recorded so far, in insertion order.
    pub fn get_all_artifacts(&self) -> Result<Vec<String>, HubtrailError> {
        let mut stmt = self.conn.prepare("SELECT uri FROM artifacts ORDER BY id")?;
        let uris = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(uris)
    }

    /// Every artifact with its event count, in insertion order.
    pub fn artifacts(&self) -> Result<Vec<ArtifactSummary>, HubtrailError> {
        let mut stmt = self.conn.prepare(
            r"SELECT a.kind, a.uri, a.updated_at, COUNT(e.id)
              FROM artifacts a LEFT JOIN events e ON e.artifact_id = a.id
              GROUP BY a.id ORDER BY a.id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(kind, uri, updated_at, count)| {
                Some(ArtifactSummary {
                    kind: ArtifactKind::parse(&kind)?,
                    uri,
                    event_count: usize::try_from(count).unwrap_or_default(),
                    updated_at,
                })
            })
            .collect())
    }

    /// Events recorded against `uri`, oldest first.
    pub fn events_for(&self, uri: &str) -> Result<Vec<LineageEvent>, HubtrailError> {
        let mut stmt = self.conn.prepare(
            r"SELECT e.direction, a.kind, a.uri, e.properties_json
              FROM events e JOIN artifacts a ON a.id = e.artifact_id
              WHERE a.uri = ?1 ORDER BY e.id",
        )?;
        let rows = stmt
            .query_map(params![uri], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .filter_map(|(direction, kind, uri, props)| {
                let kind = ArtifactKind::parse(&kind)?;
                Some((direction, kind, uri, props))
            })
            .map(|(direction, kind, uri, props)| {
                Ok(LineageEvent {
                    direction: direction.parse()?,
                    kind,
                    uri,
                    properties: serde_json::from_str(&props)
                        .map_err(HubtrailError::Json)?,
                })
            })
            .collect()
    }

    /// Latest properties stored for `uri`, if it was ever recorded.
    pub fn artifact_properties(&self, uri: &str) -> Result<Option<Properties>, HubtrailError> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT properties_json FROM artifacts WHERE uri = ?1 ORDER BY id LIMIT 1",
                params![uri],
                |row| row.get(0),
            )
            .optional()?;

        json.map(|json| serde_json::from_str(&json).map_err(HubtrailError::Json))
            .transpose()
    }

    /// Total number of recorded events.
    pub fn event_count(&self) -> Result<usize, HubtrailError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Number of executions that were opened but never finished.
    pub fn unfinished_executions(&self) -> Result<usize, HubtrailError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM executions WHERE finished_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn record(
        &self,
        execution_id: i64,
        kind: ArtifactKind,
        uri: &str,
        direction: Direction,
        properties: &Properties,
    ) -> Result<(), HubtrailError> {
        let now = Utc::now().to_rfc3339();
        let props_json = serde_json::to_string(properties).map_err(HubtrailError::Json)?;

        self.conn.execute(
            r"INSERT INTO artifacts (kind, uri, properties_json, created_at, updated_at)
              VALUES (?1, ?2, ?3, ?4, ?4)
              ON CONFLICT(kind, uri) DO UPDATE SET
                properties_json = excluded.properties_json,
                updated_at = excluded.updated_at",
            params![kind.as_str(), uri, props_json, now],
        )?;
        let artifact_id: i64 = self.conn.query_row(
            "SELECT id FROM artifacts WHERE kind = ?1 AND uri = ?2",
            params![kind.as_str(), uri],
            |row| row.get(0),
        )?;

        self.conn.execute(
            r"INSERT INTO events (execution_id, artifact_id, direction, properties_json, recorded_at)
              VALUES (?1, ?2, ?3, ?4, ?5)",
            params![execution_id, artifact_id, direction.as_str(), props_json, now],
        )?;

        debug!(uri, %direction, %kind, "lineage event recorded");
        Ok(())
    }

    fn finish_execution(&self, execution_id: i64) -> Result<(), HubtrailError> {
        self.conn.execute(
            "UPDATE executions SET finished_at = ?1 WHERE id = ?2 AND finished_at IS NULL",
            params![Utc::now().to_rfc3339(), execution_id],
        )?;
        Ok(())
    }
}

/// An open execution in the lineage store.
///
/// Artifact and event writes stay in one transaction until
/// [`LineageSession::finalize`] commits them and marks the execution
/// finished. A session dropped without being finalized rolls those writes
/// back and still closes the execution, so a model that fails halfway leaves
/// no artifacts behind.
pub struct LineageSession<'a> {
    store: &'a LineageStore,
    tx: Option<Transaction<'a>>,
    execution_id: i64,
}

impl LineageSession<'_> {
    /// Record a model artifact at `path`.
    pub fn log_model(
        &self,
        path: &str,
        direction: Direction,
        properties: &Properties,
    ) -> Result<(), HubtrailError> {
        self.store.record(
            self.execution_id,
            ArtifactKind::Model,
            path,
            direction,
            properties,
        )
    }

    /// Record a dataset artifact at `url`.
    pub fn log_dataset(
        &self,
        url: &str,
        direction: Direction,
        properties: &Properties,
    ) -> Result<(), HubtrailError> {
        self.store.record(
            self.execution_id,
            ArtifactKind::Dataset,
            url,
            direction,
            properties,
        )
    }

    /// Mark the execution finished and commit everything it recorded.
    pub fn finalize(mut self) -> Result<(), HubtrailError> {
        let Some(tx) = self.tx.take() else {
            return Ok(());
        };
        self.store.finish_execution(self.execution_id)?;
        tx.commit()?;
        Ok(())
    }
}

impl Drop for LineageSession<'_> {
    fn drop(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        warn!(
            execution_id = self.execution_id,
            "lineage session dropped before finalize, discarding its events"
        );
        if let Err(err) = tx.rollback() {
            warn!(
                execution_id = self.execution_id,
                error = %err,
                "failed to roll back lineage session"
            );
        }
        if let Err(err) = self.store.finish_execution(self.execution_id) {
            warn!(
                execution_id = self.execution_id,
                error = %err,
                "failed to finalize lineage session"
            );
        }
    }
}
