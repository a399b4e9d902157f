//! Incremental CSV history store.
//!
//! The store is the only state that survives between runs. Every run
//! reads the whole file, reconciles the historical column set with the
//! canonical one, appends the new batch, and rewrites the file through a
//! temp-file-then-rename so a failed write can never destroy history.
//!
//! Column reconciliation exists because the schema has drifted across
//! extractor versions: old files carry a single `Price` column where
//! current ones split selling and buying prices. Historical columns are
//! kept under their original names; canonical columns the file lacks are
//! appended. Nothing is ever dropped.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::observation::ObservationBatch;

/// Canonical column set written by the current extractor version.
pub const CANONICAL_COLUMNS: [&str; 5] =
    ["Timestamp", "Product", "Selling_Price", "Buying_Price", "URL"];

/// Timestamp format used for persisted rows.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fatal persistence failures. The run stops; the previous backing file
/// is left intact.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to load history from {path:?}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write history rows to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to replace history file {path:?}: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The full history as loaded from disk: a header and string rows, kept
/// verbatim so legacy values survive untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl HistoryTable {
    pub fn with_canonical_columns() -> Self {
        Self {
            columns: CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Union the historical column set with the canonical one. Existing
    /// columns keep their position and name; missing canonical columns
    /// are appended and old rows padded with empty cells.
    pub fn reconcile(&mut self) {
        for canonical in CANONICAL_COLUMNS {
            if self.column_index(canonical).is_none() {
                debug!("Adding column '{}' to historical schema", canonical);
                self.columns.push(canonical.to_string());
            }
        }
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
    }

    /// Append the batch under the canonical column names. Columns the
    /// batch does not produce (legacy ones) stay empty for new rows.
    pub fn append_batch(&mut self, batch: &ObservationBatch) {
        let timestamp = self.column_index("Timestamp");
        let product = self.column_index("Product");
        let selling = self.column_index("Selling_Price");
        let buying = self.column_index("Buying_Price");
        let url = self.column_index("URL");
        let width = self.columns.len();

        for observation in &batch.observations {
            let mut row = vec![String::new(); width];
            if let Some(i) = timestamp {
                row[i] = observation.timestamp.format(TIMESTAMP_FORMAT).to_string();
            }
            if let Some(i) = product {
                row[i] = observation.product_name.clone();
            }
            if let Some(i) = selling {
                row[i] = observation.selling_price.to_string();
            }
            if let Some(i) = buying {
                row[i] = observation
                    .buying_price
                    .map(|price| price.to_string())
                    .unwrap_or_default();
            }
            if let Some(i) = url {
                row[i] = observation.source_url.clone();
            }
            self.rows.push(row);
        }
    }
}

/// Result of a merge: how many rows were appended and the new total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub appended: usize,
    pub total_rows: usize,
}

/// Whole-file CSV store for the accumulated price history.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the existing history, or an empty canonical table when the
    /// backing file does not exist yet.
    pub fn load(&self) -> Result<HistoryTable, StoreError> {
        if !self.path.exists() {
            debug!("No history at {:?}; starting from the canonical column set", self.path);
            return Ok(HistoryTable::with_canonical_columns());
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| StoreError::Load {
                path: self.path.clone(),
                source: e,
            })?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| StoreError::Load {
                path: self.path.clone(),
                source: e,
            })?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| StoreError::Load {
                path: self.path.clone(),
                source: e,
            })?;
            let mut row: Vec<String> = record.iter().map(|f| f.to_string()).collect();
            row.resize(columns.len(), String::new());
            rows.push(row);
        }

        Ok(HistoryTable { columns, rows })
    }

    /// Merge the batch into the history and persist the result.
    ///
    /// An empty batch leaves the backing file byte-for-byte untouched.
    pub fn merge_and_persist(&self, batch: &ObservationBatch) -> Result<MergeOutcome, StoreError> {
        let mut table = self.load()?;

        if batch.is_empty() {
            debug!("Empty batch; history at {:?} left untouched", self.path);
            return Ok(MergeOutcome {
                appended: 0,
                total_rows: table.len(),
            });
        }

        table.reconcile();
        let before = table.len();
        table.append_batch(batch);
        self.persist(&table)?;

        let outcome = MergeOutcome {
            appended: table.len() - before,
            total_rows: table.len(),
        };
        info!(
            "Appended {} observations to {:?} ({} rows total)",
            outcome.appended, self.path, outcome.total_rows
        );
        Ok(outcome)
    }

    /// Write the full table through a sibling temp file, then rename it
    /// over the target. The previous file survives any failure.
    pub fn persist(&self, table: &HistoryTable) -> Result<(), StoreError> {
        let tmp_path = self.tmp_path();

        if let Err(e) = write_table(&tmp_path, table) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::Replace {
                path: self.path.clone(),
                source: e,
            }
        })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

fn write_table(path: &Path, table: &HistoryTable) -> Result<(), StoreError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| StoreError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;

    writer
        .write_record(&table.columns)
        .map_err(|e| StoreError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
    for row in &table.rows {
        writer.write_record(row).map_err(|e| StoreError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    writer.flush().map_err(|e| StoreError::Write {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })
}
