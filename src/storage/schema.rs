//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per advertisement ever stored
CREATE TABLE IF NOT EXISTS car_article (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    manufacturer TEXT NOT NULL,
    year INTEGER NOT NULL,
    mileage INTEGER NOT NULL,
    engine_capacity REAL NOT NULL,
    engine_type TEXT NOT NULL,
    value TEXT NOT NULL,
    currency TEXT NOT NULL,
    brutto INTEGER NOT NULL,
    netto INTEGER NOT NULL,
    negotiation INTEGER NOT NULL,
    vat INTEGER NOT NULL,
    location TEXT NOT NULL,
    link TEXT NOT NULL,
    seller_id TEXT NOT NULL,
    record_created TEXT NOT NULL,
    on_delete INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_car_article_created ON car_article(record_created);

-- Seller phone numbers, in reveal order
CREATE TABLE IF NOT EXISTS phone_number (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    number TEXT NOT NULL,
    car_id TEXT NOT NULL REFERENCES car_article(id)
);

CREATE INDEX IF NOT EXISTS idx_phone_number_car ON phone_number(car_id);

-- Singleton run marker
CREATE TABLE IF NOT EXISTS meta_info (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    last_start TEXT,
    status INTEGER NOT NULL DEFAULT 0
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
