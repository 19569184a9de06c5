//! Saving and loading drawing collections per symbol.
//!
//! The manager hands a bridge one JSON record per drawing and receives the
//! same list back. Bridges only move documents around; validation of each
//! entry happens in [`restore`], one entry at a time.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::drawing::{Drawing, DrawingId};
use crate::error::PersistError;

/// Storage for per-symbol drawing documents.
pub trait PersistenceBridge {
    /// Replace the stored drawings for `symbol`.
    fn save(&mut self, symbol: &str, records: &[Value]) -> Result<(), PersistError>;

    /// Stored drawings for `symbol`; empty when nothing was saved yet.
    fn load(&self, symbol: &str) -> Result<Vec<Value>, PersistError>;
}

/// In-memory store, useful for tests and for hosts that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: HashMap<String, Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw document, bypassing serialization.
    pub fn insert(&mut self, symbol: impl Into<String>, records: Vec<Value>) {
        self.documents.insert(symbol.into(), records);
    }

    pub fn get(&self, symbol: &str) -> Option<&[Value]> {
        self.documents.get(symbol).map(Vec::as_slice)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }
}

impl PersistenceBridge for MemoryStore {
    fn save(&mut self, symbol: &str, records: &[Value]) -> Result<(), PersistError> {
        self.documents.insert(symbol.to_string(), records.to_vec());
        Ok(())
    }

    fn load(&self, symbol: &str) -> Result<Vec<Value>, PersistError> {
        Ok(self.documents.get(symbol).cloned().unwrap_or_default())
    }
}

/// One `<symbol>.json` file per symbol inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `symbol`'s drawings. Bytes outside `[A-Za-z0-9._-]`
    /// are percent-escaped (`BTC/USDT` becomes `BTC%2FUSDT`), so distinct
    /// symbols never share a file.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        let mut name = String::with_capacity(symbol.len());
        for byte in symbol.bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_') {
                name.push(char::from(byte));
            } else {
                name.push_str(&format!("%{byte:02X}"));
            }
        }
        self.dir.join(format!("{name}.json"))
    }
}

impl PersistenceBridge for JsonFileStore {
    fn save(&mut self, symbol: &str, records: &[Value]) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(symbol);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(records)?)?;
        fs::rename(&tmp, &path)?;
        log::debug!("saved {} drawings for {} to {}", records.len(), symbol, path.display());
        Ok(())
    }

    fn load(&self, symbol: &str) -> Result<Vec<Value>, PersistError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_document(&path).map_err(|e| match e {
            PersistError::Format { .. } => PersistError::Format {
                symbol: symbol.to_string(),
            },
            other => other,
        })
    }
}

/// Read a drawing document: a JSON array with one record per drawing.
pub fn read_document(path: &Path) -> Result<Vec<Value>, PersistError> {
    let content = fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&content)? {
        Value::Array(records) => Ok(records),
        _ => Err(PersistError::Format {
            symbol: path.display().to_string(),
        }),
    }
}

/// An entry that could not be restored.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedEntry {
    /// Position in the document.
    pub index: usize,
    pub reason: String,
}

/// Outcome of restoring a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub loaded: usize,
    pub dropped: Vec<DroppedEntry>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

/// Restore drawings from persisted records. Each entry is validated on its
/// own: malformed, incomplete and duplicate-id entries are dropped and the
/// rest are kept in document order.
pub fn restore(records: &[Value]) -> (Vec<Drawing>, LoadReport) {
    let mut drawings: Vec<Drawing> = Vec::with_capacity(records.len());
    let mut report = LoadReport::default();
    let mut seen: Vec<DrawingId> = Vec::with_capacity(records.len());

    for (index, value) in records.iter().enumerate() {
        let reason = match Drawing::from_json(value) {
            Ok(drawing) if !drawing.is_complete() => {
                format!("{} {} is incomplete", drawing.kind(), drawing.id())
            }
            Ok(drawing) if seen.contains(&drawing.id()) => format!("duplicate id {}", drawing.id()),
            Ok(drawing) => {
                seen.push(drawing.id());
                drawings.push(drawing);
                continue;
            }
            Err(e) => e.to_string(),
        };
        log::warn!("dropping drawing entry {index}: {reason}");
        report.dropped.push(DroppedEntry { index, reason });
    }

    report.loaded = drawings.len();
    (drawings, report)
}
