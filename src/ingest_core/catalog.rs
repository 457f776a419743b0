//! Identity catalog: persistent store of product identities and aliases
//!
//! The resolver reads and writes identities exclusively through the
//! `IdentityStore` trait; the SQLite implementation keeps creation race-free
//! via a unique `(query, canonical_name)` key, so concurrent resolution of
//! the same query cannot create duplicate identities.

use super::errors::StorageError;
use super::types::{ProductId, ProductIdentity};
use crate::sqlite_pragma::apply_optimized_pragmas;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Backend trait for identity lookup and creation.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// All identities previously associated with a query, most recently
    /// updated first. Aliases are loaded eagerly; the resolver scores
    /// against every one of them.
    async fn candidates_for_query(&self, query: &str)
        -> Result<Vec<ProductIdentity>, StorageError>;

    /// Attach an alias to an existing identity and touch its update time.
    /// Aliases only grow; re-recording an existing alias is a no-op.
    async fn record_alias(
        &self,
        id: ProductId,
        alias: &str,
        seen_at: i64,
    ) -> Result<(), StorageError>;

    /// Create an identity for `(query, canonical_name)` unless one already
    /// exists, and return whichever row won. This is the insert-if-absent
    /// primitive that serializes identity creation per query.
    async fn insert_if_absent(
        &self,
        query: &str,
        canonical_name: &str,
        created_at: i64,
    ) -> Result<ProductIdentity, StorageError>;

    /// Load a single identity by id.
    async fn get(&self, id: ProductId) -> Result<Option<ProductIdentity>, StorageError>;
}

/// SQLite-backed identity catalog.
pub struct SqliteCatalog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalog {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        apply_optimized_pragmas(&conn)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS products (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                query           TEXT NOT NULL,
                canonical_name  TEXT NOT NULL,
                created_at      INTEGER NOT NULL,
                updated_at      INTEGER NOT NULL,
                UNIQUE(query, canonical_name)
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS product_aliases (
                product_id  INTEGER NOT NULL,
                alias       TEXT NOT NULL,
                added_at    INTEGER NOT NULL,
                PRIMARY KEY (product_id, alias)
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_products_query ON products(query, updated_at DESC)",
            [],
        )?;

        log::info!("✅ Identity catalog initialized");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn load_aliases(conn: &Connection, id: ProductId) -> Result<Vec<String>, StorageError> {
        let mut stmt = conn.prepare(
            "SELECT alias FROM product_aliases WHERE product_id = ?1 ORDER BY added_at, alias",
        )?;
        let aliases = stmt
            .query_map([id.0], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(aliases)
    }
}

#[async_trait]
impl IdentityStore for SqliteCatalog {
    async fn candidates_for_query(
        &self,
        query: &str,
    ) -> Result<Vec<ProductIdentity>, StorageError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, canonical_name, updated_at FROM products
             WHERE query = ?1
             ORDER BY updated_at DESC, id DESC",
        )?;
        let rows = stmt
            .query_map([query], |row| {
                Ok((
                    ProductId(row.get(0)?),
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut identities = Vec::with_capacity(rows.len());
        for (id, canonical_name, updated_at) in rows {
            identities.push(ProductIdentity {
                id,
                canonical_name,
                query: query.to_string(),
                aliases: Self::load_aliases(&conn, id)?,
                updated_at,
            });
        }

        Ok(identities)
    }

    async fn record_alias(
        &self,
        id: ProductId,
        alias: &str,
        seen_at: i64,
    ) -> Result<(), StorageError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT OR IGNORE INTO product_aliases (product_id, alias, added_at)
             VALUES (?1, ?2, ?3)",
            params![id.0, alias, seen_at],
        )?;
        conn.execute(
            "UPDATE products SET updated_at = ?2 WHERE id = ?1",
            params![id.0, seen_at],
        )?;

        Ok(())
    }

    async fn insert_if_absent(
        &self,
        query: &str,
        canonical_name: &str,
        created_at: i64,
    ) -> Result<ProductIdentity, StorageError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO products (query, canonical_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(query, canonical_name) DO NOTHING",
            params![query, canonical_name, created_at],
        )?;

        let (id, updated_at): (i64, i64) = conn.query_row(
            "SELECT id, updated_at FROM products WHERE query = ?1 AND canonical_name = ?2",
            params![query, canonical_name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        conn.execute(
            "INSERT OR IGNORE INTO product_aliases (product_id, alias, added_at)
             VALUES (?1, ?2, ?3)",
            params![id, canonical_name, created_at],
        )?;

        Ok(ProductIdentity {
            id: ProductId(id),
            canonical_name: canonical_name.to_string(),
            query: query.to_string(),
            aliases: Self::load_aliases(&conn, ProductId(id))?,
            updated_at,
        })
    }

    async fn get(&self, id: ProductId) -> Result<Option<ProductIdentity>, StorageError> {
        let conn = self.conn.lock().unwrap();

        let row = conn
            .query_row(
                "SELECT query, canonical_name, updated_at FROM products WHERE id = ?1",
                [id.0],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((query, canonical_name, updated_at)) => Ok(Some(ProductIdentity {
                id,
                canonical_name,
                query,
                aliases: Self::load_aliases(&conn, id)?,
                updated_at,
            })),
            None => Ok(None),
        }
    }
}
