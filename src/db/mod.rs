//! Database module - SQLite storage for documents and local settings

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::store::{Document, DocumentStore, Filter, KeyValueStore, new_id};

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        info!("Opening database at {}", path);
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                collection TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS documents_collection ON documents (collection)",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    fn parse_row(id: String, body: String) -> Option<Document> {
        match serde_json::from_str(&body) {
            Ok(body) => Some(Document { id, body }),
            Err(e) => {
                warn!("Corrupt document {}: {}", id, e);
                None
            }
        }
    }
}

impl DocumentStore for Database {
    fn insert(&self, collection: &str, body: Value) -> Result<String> {
        let id = new_id();
        self.conn.execute(
            "INSERT INTO documents (id, collection, body, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, collection, body.to_string(), Utc::now().to_rfc3339()],
        )?;
        debug!("Inserted {}/{}", collection, id);
        Ok(id)
    }

    fn find(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, body FROM documents WHERE collection = ?1 ORDER BY seq"
        )?;

        let rows = stmt.query_map([collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

        let docs = rows
            .into_iter()
            .filter_map(|(id, body)| Self::parse_row(id, body))
            .filter(|doc| filters.iter().all(|f| doc.body.get(&f.field) == Some(&f.value)))
            .collect();

        Ok(docs)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let row = self.conn
            .query_row(
                "SELECT id, body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        Ok(row.and_then(|(id, body)| Self::parse_row(id, body)))
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        Ok(n > 0)
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}
