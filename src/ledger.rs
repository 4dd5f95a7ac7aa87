//! Per-user annotation ledger.
//!
//! The ledger is a two-column CSV table:
//!
//! ```text
//! user_name,annotations_count
//! alice,12
//! bob,3
//! ```
//!
//! Rows appear in the order each user was first seen, and that order survives
//! every update. In memory the table is indexed by user name so an increment
//! is a keyed upsert rather than a scan.
//!
//! User names are read verbatim, surrounding whitespace included, so ` alice`
//! and `alice` stay separate rows. Header names and counts are trimmed.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::LabelError;

const USER_COLUMN: &str = "user_name";
const COUNT_COLUMN: &str = "annotations_count";

/// One row of the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub user_name: String,
    #[serde(rename = "annotations_count", deserialize_with = "trimmed_count")]
    pub count: u64,
}

fn trimmed_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.trim().parse().map_err(serde::de::Error::custom)
}

/// The ledger rows in first-appearance order, indexed by user name.
#[derive(Clone, Debug, Default)]
pub struct LedgerTable {
    entries: Vec<LedgerEntry>,
    positions: HashMap<String, usize>,
}

impl LedgerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a row. A repeated user keeps its first position
    /// and takes the latest count.
    pub fn upsert(&mut self, user_name: &str, count: u64) {
        match self.positions.get(user_name) {
            Some(&pos) => self.entries[pos].count = count,
            None => {
                self.positions
                    .insert(user_name.to_string(), self.entries.len());
                self.entries.push(LedgerEntry {
                    user_name: user_name.to_string(),
                    count,
                });
            }
        }
    }

    /// Adds one to `user_name`'s count, starting a new row at 1 if needed.
    /// Returns the new count.
    pub fn increment(&mut self, user_name: &str) -> u64 {
        let count = self.get(user_name).unwrap_or(0) + 1;
        self.upsert(user_name, count);
        count
    }

    pub fn get(&self, user_name: &str) -> Option<u64> {
        self.positions
            .get(user_name)
            .map(|&pos| self.entries[pos].count)
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LedgerEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The ledger file for one workspace.
///
/// Not safe for concurrent writers: the last increment to reach the disk wins.
#[derive(Clone, Debug)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the whole table. An absent ledger is an empty table.
    pub fn load(&self) -> Result<LedgerTable, LabelError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(LedgerTable::new()),
            Err(err) => return Err(LabelError::Io(err)),
        };
        read_table(BufReader::new(file), &self.path)
    }

    /// Rows in file order; empty when the ledger does not exist yet.
    pub fn list(&self) -> Result<Vec<LedgerEntry>, LabelError> {
        Ok(self.load()?.into_entries())
    }

    /// Current count for `user_name`, zero if the user has no row.
    pub fn count(&self, user_name: &str) -> Result<u64, LabelError> {
        Ok(self.load()?.get(user_name).unwrap_or(0))
    }

    /// Credits one annotation action to `user_name` and persists the table.
    /// Returns the user's new count.
    pub fn increment(&self, user_name: &str) -> Result<u64, LabelError> {
        let mut table = self.load()?;
        let count = table.increment(user_name);
        self.persist(&table)?;
        info!("ledger: {user_name} now has {count} annotation(s)");
        Ok(count)
    }

    /// Writes the table to a sibling temp file and renames it over the ledger.
    fn persist(&self, table: &LedgerTable) -> Result<(), LabelError> {
        let bytes = write_table(table, &self.path)?;
        let tmp_path = self.path.with_extension("csv.tmp");
        let store_write = |source| LabelError::StoreWrite {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(store_write)?;
        }
        let mut file = File::create(&tmp_path).map_err(store_write)?;
        file.write_all(&bytes).map_err(store_write)?;
        file.sync_all().map_err(store_write)?;
        fs::rename(&tmp_path, &self.path).map_err(store_write)
    }
}

/// Reads a ledger table from CSV bytes.
///
/// Useful for fuzzing and testing without file I/O.
pub fn from_ledger_csv_slice(bytes: &[u8]) -> Result<LedgerTable, LabelError> {
    read_table(bytes, Path::new("<bytes>"))
}

/// Writes a ledger table to a CSV string.
pub fn to_ledger_csv_string(table: &LedgerTable) -> Result<String, LabelError> {
    let path = Path::new("<string>");
    let bytes = write_table(table, path)?;
    String::from_utf8(bytes).map_err(|e| LabelError::LedgerInvalid {
        path: path.to_path_buf(),
        message: format!("Invalid UTF-8 in output: {e}"),
    })
}

fn read_table<R: Read>(reader: R, path: &Path) -> Result<LedgerTable, LabelError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|source| LabelError::LedgerParse {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    if headers.is_empty() {
        return Ok(LedgerTable::new());
    }
    for column in [USER_COLUMN, COUNT_COLUMN] {
        if !headers.iter().any(|header| header == column) {
            return Err(LabelError::LedgerInvalid {
                path: path.to_path_buf(),
                message: format!("missing '{column}' column in header"),
            });
        }
    }

    let mut table = LedgerTable::new();
    for result in csv_reader.deserialize() {
        let entry: LedgerEntry = result.map_err(|source| LabelError::LedgerParse {
            path: path.to_path_buf(),
            source,
        })?;
        table.upsert(&entry.user_name, entry.count);
    }
    Ok(table)
}

fn write_table(table: &LedgerTable, path: &Path) -> Result<Vec<u8>, LabelError> {
    let ledger_write = |source| LabelError::LedgerWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    csv_writer
        .write_record([USER_COLUMN, COUNT_COLUMN])
        .map_err(ledger_write)?;
    for entry in table.entries() {
        csv_writer.serialize(entry).map_err(ledger_write)?;
    }

    csv_writer
        .into_inner()
        .map_err(|e| LabelError::StoreWrite {
            path: path.to_path_buf(),
            source: e.into_error(),
        })
}
