//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::models::NormalizedArticle;
use crate::state::{from_db_timestamp, to_db_timestamp, RunMeta};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::StoredArticle;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn count(conn: &Connection, sql: &str, args: impl rusqlite::Params) -> StorageResult<u64> {
    let n: i64 = conn.query_row(sql, args, |row| row.get(0))?;
    Ok(n.max(0) as u64)
}

impl Storage for SqliteStorage {
    // ===== Articles =====

    fn get_article(&self, id: &str) -> StorageResult<Option<StoredArticle>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, manufacturer, year, mileage, engine_capacity, engine_type,
             value, currency, link, seller_id, record_created, on_delete
             FROM car_article WHERE id = ?1",
        )?;

        let article = stmt
            .query_row(params![id], |row| {
                Ok(StoredArticle {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    manufacturer: row.get(2)?,
                    year: row.get(3)?,
                    mileage: row.get(4)?,
                    engine_capacity: row.get(5)?,
                    engine_type: row.get(6)?,
                    value: row.get(7)?,
                    currency: row.get(8)?,
                    link: row.get(9)?,
                    seller_id: row.get(10)?,
                    record_created: row.get(11)?,
                    on_delete: row.get(12)?,
                })
            })
            .optional()?;

        Ok(article)
    }

    fn bulk_insert(&mut self, articles: &[NormalizedArticle]) -> StorageResult<usize> {
        let created = to_db_timestamp(&Utc::now());
        let tx = self.conn.transaction()?;

        {
            let mut insert_article = tx.prepare(
                "INSERT INTO car_article (id, name, manufacturer, year, mileage, engine_capacity,
                 engine_type, value, currency, brutto, netto, negotiation, vat, location, link,
                 seller_id, record_created)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            )?;
            let mut insert_phone =
                tx.prepare("INSERT INTO phone_number (number, car_id) VALUES (?1, ?2)")?;

            for article in articles {
                insert_article.execute(params![
                    article.id,
                    article.name,
                    article.manufacturer,
                    article.year,
                    article.mileage,
                    article.engine_capacity,
                    article.engine_type,
                    article.price.to_string(),
                    article.currency,
                    article.brutto,
                    article.netto,
                    article.negotiation,
                    article.vat_invoice,
                    article.location,
                    article.link,
                    article.seller_id,
                    created,
                ])?;

                for phone in &article.phones {
                    insert_phone.execute(params![phone, article.id])?;
                }
            }
        }

        tx.commit()?;
        Ok(articles.len())
    }

    fn get_phones(&self, article_id: &str) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT number FROM phone_number WHERE car_id = ?1 ORDER BY id")?;

        let phones = stmt
            .query_map(params![article_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(phones)
    }

    // ===== Run Marker =====

    fn get_or_create_meta(&mut self) -> StorageResult<RunMeta> {
        self.conn.execute(
            "INSERT OR IGNORE INTO meta_info (id, last_start, status) VALUES (1, NULL, 0)",
            [],
        )?;

        let (last_start, status): (Option<String>, bool) = self.conn.query_row(
            "SELECT last_start, status FROM meta_info WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let last_start = match last_start {
            Some(raw) => match from_db_timestamp(&raw) {
                Some(ts) => Some(ts),
                None => {
                    return Err(StorageError::InvalidValue {
                        column: "meta_info.last_start",
                        value: raw,
                    })
                }
            },
            None => None,
        };

        Ok(RunMeta { last_start, status })
    }

    fn save_meta(&mut self, meta: &RunMeta) -> StorageResult<()> {
        let last_start = meta.last_start.as_ref().map(to_db_timestamp);
        self.conn.execute(
            "INSERT INTO meta_info (id, last_start, status) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET last_start = excluded.last_start, status = excluded.status",
            params![last_start, meta.status],
        )?;
        Ok(())
    }

    // ===== Statistics =====

    fn count_articles(&self) -> StorageResult<u64> {
        count(&self.conn, "SELECT COUNT(*) FROM car_article", [])
    }

    fn count_phones(&self) -> StorageResult<u64> {
        count(&self.conn, "SELECT COUNT(*) FROM phone_number", [])
    }

    fn count_articles_since(&self, since: &DateTime<Utc>) -> StorageResult<u64> {
        count(
            &self.conn,
            "SELECT COUNT(*) FROM car_article WHERE record_created > ?1",
            params![to_db_timestamp(since)],
        )
    }
}
