//! graph::sqlite
//!
//! Relational graph backend on SQLite.
//!
//! # Schema
//!
//! ```text
//! nodes(id INTEGER PRIMARY KEY, identifier TEXT UNIQUE)      -- 'root' is the anchor
//! edges(id INTEGER PRIMARY KEY, tail, head, kind, UNIQUE(tail, kind, head))
//! properties(node, key, value, PRIMARY KEY(node, key))
//! ```
//!
//! Edge `kind` is one of `PARENT`, `TOROOT` or `MAPPED_TO`. Edge row ids give
//! insertion order, which is the parent order handed to `put`.
//!
//! # Transactions
//!
//! One connection per backend, behind a mutex. A scope holds the connection
//! for its whole lifetime inside `BEGIN DEFERRED` (reads) or `BEGIN IMMEDIATE`
//! (writes). Dropping an uncommitted scope issues `ROLLBACK`.

use std::path::{Path, PathBuf};

use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use super::backend::{GraphBackend, ReadTxn, WriteTxn};
use super::{BackendKind, GraphError, GraphOptions, Result};
use crate::core::types::ObjectId;

const ROOT_KEY: &str = "root";

const PARENT: &str = "PARENT";
const TOROOT: &str = "TOROOT";
const MAPPED_TO: &str = "MAPPED_TO";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS nodes (
        id INTEGER PRIMARY KEY,
        identifier TEXT NOT NULL UNIQUE
    );
    CREATE TABLE IF NOT EXISTS edges (
        id INTEGER PRIMARY KEY,
        tail INTEGER NOT NULL REFERENCES nodes (id),
        head INTEGER NOT NULL REFERENCES nodes (id),
        kind TEXT NOT NULL,
        UNIQUE (tail, kind, head)
    );
    CREATE INDEX IF NOT EXISTS idx_edges_head ON edges (head, kind);
    CREATE TABLE IF NOT EXISTS properties (
        node INTEGER NOT NULL REFERENCES nodes (id),
        key TEXT NOT NULL,
        value TEXT NOT NULL,
        PRIMARY KEY (node, key)
    );
";

/// SQLite-backed graph.
#[derive(Debug)]
pub struct SqliteBackend {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl SqliteBackend {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path, options: &GraphOptions) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(options.busy_timeout)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", options.synchronous.as_str())?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %path.display(), "graph.sqlite.open");
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(Some(conn)),
        })
    }

    /// The database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn begin(&self, sql: &'static str) -> Result<SqliteTxn<'_>> {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or(GraphError::StoreClosed)?;
        conn.execute_batch(sql)?;
        Ok(SqliteTxn {
            conn: guard,
            finished: false,
        })
    }
}

impl GraphBackend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn read(&self) -> Result<Box<dyn ReadTxn + '_>> {
        Ok(Box::new(self.begin("BEGIN DEFERRED")?))
    }

    fn write(&self) -> Result<Box<dyn WriteTxn + '_>> {
        Ok(Box::new(self.begin("BEGIN IMMEDIATE")?))
    }

    fn shutdown(&self) -> Result<()> {
        let Some(conn) = self.conn.lock().take() else {
            return Ok(());
        };
        debug!(path = %self.path.display(), "graph.sqlite.shutdown");
        conn.close().map_err(|(_, err)| GraphError::Sqlite(err))
    }

    fn is_shut_down(&self) -> bool {
        self.conn.lock().is_none()
    }
}

struct SqliteTxn<'a> {
    conn: MutexGuard<'a, Option<Connection>>,
    finished: bool,
}

impl SqliteTxn<'_> {
    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(GraphError::StoreClosed)
    }

    fn node_key(&self, id: &ObjectId) -> Result<Option<i64>> {
        Ok(self
            .conn()?
            .query_row(
                "SELECT id FROM nodes WHERE identifier = ?1",
                [id.to_hex()],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn require_node(&self, id: &ObjectId) -> Result<i64> {
        self.node_key(id)?
            .ok_or(GraphError::UnknownCommit { id: *id })
    }

    fn root_key(&self) -> Result<i64> {
        self.conn()?
            .query_row(
                "SELECT id FROM nodes WHERE identifier = ?1",
                [ROOT_KEY],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| GraphError::Corrupt("root anchor missing".into()))
    }

    /// Identifiers at the other end of `kind` edges touching `id`.
    fn neighbours(&self, id: &ObjectId, kind: &str, outgoing: bool) -> Result<Vec<ObjectId>> {
        let sql = if outgoing {
            "SELECT h.identifier FROM edges e
                 JOIN nodes t ON e.tail = t.id
                 JOIN nodes h ON e.head = h.id
             WHERE t.identifier = ?1 AND e.kind = ?2
             ORDER BY e.id"
        } else {
            "SELECT t.identifier FROM edges e
                 JOIN nodes t ON e.tail = t.id
                 JOIN nodes h ON e.head = h.id
             WHERE h.identifier = ?1 AND e.kind = ?2
             ORDER BY e.id"
        };
        let mut stmt = self.conn()?.prepare_cached(sql)?;
        let rows = stmt.query_map(params![id.to_hex(), kind], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(parse_identifier(&row?)?);
        }
        Ok(ids)
    }

    fn has_edge(&self, tail: i64, kind: &str) -> Result<bool> {
        Ok(self
            .conn()?
            .query_row(
                "SELECT 1 FROM edges WHERE tail = ?1 AND kind = ?2 LIMIT 1",
                params![tail, kind],
                |_| Ok(()),
            )
            .optional()?
            .is_some())
    }
}

fn parse_identifier(text: &str) -> Result<ObjectId> {
    ObjectId::new(text)
        .map_err(|e| GraphError::Corrupt(format!("bad identifier in graph database: {e}")))
}

impl Drop for SqliteTxn<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(conn) = self.conn.as_ref() {
            if let Err(err) = conn.execute_batch("ROLLBACK") {
                warn!(error = %err, "graph.sqlite.rollback_failed");
            }
        }
    }
}

impl ReadTxn for SqliteTxn<'_> {
    fn contains(&self, id: &ObjectId) -> Result<bool> {
        Ok(self.node_key(id)?.is_some())
    }

    fn parents(&self, id: &ObjectId) -> Result<Vec<ObjectId>> {
        self.neighbours(id, PARENT, true)
    }

    fn children(&self, id: &ObjectId) -> Result<Vec<ObjectId>> {
        self.neighbours(id, PARENT, false)
    }

    fn is_rooted(&self, id: &ObjectId) -> Result<bool> {
        match self.node_key(id)? {
            Some(key) => self.has_edge(key, TOROOT),
            None => Ok(false),
        }
    }

    fn mapping(&self, id: &ObjectId) -> Result<Option<ObjectId>> {
        Ok(self.neighbours(id, MAPPED_TO, true)?.into_iter().next())
    }

    fn property(&self, id: &ObjectId, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn()?
            .query_row(
                "SELECT p.value FROM properties p JOIN nodes n ON p.node = n.id
                 WHERE n.identifier = ?1 AND p.key = ?2",
                params![id.to_hex(), key],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn commit_ids(&self) -> Result<Vec<ObjectId>> {
        // Lowercase hex sorts in byte order.
        let mut stmt = self
            .conn()?
            .prepare("SELECT identifier FROM nodes WHERE identifier != ?1 ORDER BY identifier")?;
        let rows = stmt.query_map([ROOT_KEY], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(parse_identifier(&row?)?);
        }
        Ok(ids)
    }

    fn parent_edge_count(&self) -> Result<usize> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM edges WHERE kind = ?1",
            [PARENT],
            |row| row.get(0),
        )?;
        usize::try_from(count).map_err(|_| GraphError::Corrupt("negative edge count".into()))
    }
}

impl WriteTxn for SqliteTxn<'_> {
    fn ensure_root(&mut self) -> Result<bool> {
        let inserted = self.conn()?.execute(
            "INSERT OR IGNORE INTO nodes (identifier) VALUES (?1)",
            [ROOT_KEY],
        )?;
        Ok(inserted == 1)
    }

    fn add_node(&mut self, id: &ObjectId) -> Result<bool> {
        let inserted = self.conn()?.execute(
            "INSERT OR IGNORE INTO nodes (identifier) VALUES (?1)",
            [id.to_hex()],
        )?;
        Ok(inserted == 1)
    }

    fn add_parent(&mut self, child: &ObjectId, parent: &ObjectId) -> Result<bool> {
        let tail = self.require_node(child)?;
        let head = self.require_node(parent)?;
        let inserted = self.conn()?.execute(
            "INSERT OR IGNORE INTO edges (tail, head, kind) VALUES (?1, ?2, ?3)",
            params![tail, head, PARENT],
        )?;
        Ok(inserted == 1)
    }

    fn add_root_edge(&mut self, id: &ObjectId) -> Result<bool> {
        let tail = self.require_node(id)?;
        let root = self.root_key()?;
        let inserted = self.conn()?.execute(
            "INSERT OR IGNORE INTO edges (tail, head, kind) VALUES (?1, ?2, ?3)",
            params![tail, root, TOROOT],
        )?;
        Ok(inserted == 1)
    }

    fn set_mapping(
        &mut self,
        mapped: &ObjectId,
        original: &ObjectId,
    ) -> Result<Option<ObjectId>> {
        let tail = self.require_node(mapped)?;
        let head = self.require_node(original)?;
        let previous = self.mapping(mapped)?;
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM edges WHERE tail = ?1 AND kind = ?2",
            params![tail, MAPPED_TO],
        )?;
        conn.execute(
            "INSERT INTO edges (tail, head, kind) VALUES (?1, ?2, ?3)",
            params![tail, head, MAPPED_TO],
        )?;
        Ok(previous)
    }

    fn set_property(&mut self, id: &ObjectId, key: &str, value: &str) -> Result<()> {
        let node = self.require_node(id)?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO properties (node, key, value) VALUES (?1, ?2, ?3)",
            params![node, key, value],
        )?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.conn()?.execute_batch(
            "DELETE FROM properties;
             DELETE FROM edges;
             DELETE FROM nodes;",
        )?;
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.conn()?.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }
}
