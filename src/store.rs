//! SQLite-backed NDVI record store.
//!
//! Holds the same records as the reference dataset, keyed by
//! `(state, year, month)` for the exact lookups the UI performs after
//! extraction. Schema initialization is idempotent.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::dataset::Dataset;
use crate::models::NdviRecord;

/// NDVI record schema.
///
/// Uses CREATE TABLE IF NOT EXISTS for idempotent execution; the unique
/// `(state, year, month)` key doubles as the lookup index.
const INITIAL_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS ndvi_data (
    id INTEGER PRIMARY KEY,
    state TEXT NOT NULL,
    month TEXT NOT NULL,
    year INTEGER NOT NULL,
    ndvi_value REAL NOT NULL,
    temperature REAL NOT NULL,
    rainfall REAL NOT NULL,
    soilmoisture REAL NOT NULL,
    ndvi_url TEXT NOT NULL,
    UNIQUE (state, year, month)
);
"#;

/// Store wrapper providing connection management and schema initialization.
pub struct NdviStore {
    conn: Connection,
}

impl NdviStore {
    /// Opens an in-memory store. Used by tests and one-shot commands.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Opens a file-based store at the given path, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(INITIAL_SCHEMA)?;
        Ok(())
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Imports all dataset records, replacing rows that share a key.
    ///
    /// Returns the number of records written.
    pub fn import_dataset(&mut self, dataset: &Dataset) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO ndvi_data
                     (state, month, year, ndvi_value, temperature, rainfall, soilmoisture, ndvi_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (state, year, month) DO UPDATE SET
                     ndvi_value = excluded.ndvi_value,
                     temperature = excluded.temperature,
                     rainfall = excluded.rainfall,
                     soilmoisture = excluded.soilmoisture,
                     ndvi_url = excluded.ndvi_url",
            )?;
            for record in dataset.records() {
                stmt.execute(params![
                    record.state,
                    record.month,
                    record.year,
                    record.ndvi_value,
                    record.temperature,
                    record.rainfall,
                    record.soilmoisture,
                    record.ndvi_url,
                ])
                .with_context(|| {
                    format!(
                        "Failed to import record for {} {} {}",
                        record.state, record.month, record.year
                    )
                })?;
            }
        }
        tx.commit()?;
        Ok(dataset.len())
    }

    /// Exact `(state, year, month)` lookup.
    ///
    /// The state key is normalized first (spaces stripped, lowercased), so
    /// "Andhra Pradesh" finds the "andhrapradesh" row. `None` is the
    /// not-found signal.
    pub fn lookup(&self, state: &str, year: i64, month: &str) -> Result<Option<NdviRecord>> {
        let state = state.replace(' ', "").to_lowercase();

        self.conn
            .query_row(
                "SELECT state, month, year, ndvi_value, temperature, rainfall, soilmoisture, ndvi_url
                 FROM ndvi_data
                 WHERE state = ?1 AND year = ?2 AND month = ?3",
                params![state, year, month],
                |row| {
                    Ok(NdviRecord {
                        state: row.get(0)?,
                        month: row.get(1)?,
                        year: row.get(2)?,
                        ndvi_value: row.get(3)?,
                        temperature: row.get(4)?,
                        rainfall: row.get(5)?,
                        soilmoisture: row.get(6)?,
                        ndvi_url: row.get(7)?,
                    })
                },
            )
            .optional()
            .context("Failed to query ndvi_data")
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM ndvi_data", [], |row| row.get(0))
            .context("Failed to count ndvi_data rows")
    }
}
