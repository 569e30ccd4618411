//! Workbook persistence.
//!
//! A [`SheetStore`] is read once when a document starts and written after
//! every mutating operation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::sheet::SheetSet;

pub trait SheetStore {
    /// The stored workbook, or `None` if nothing has been saved yet.
    fn load_sheets(&self) -> Result<Option<SheetSet>>;

    fn save_sheets(&mut self, sheets: &SheetSet) -> Result<()>;
}

/// Keeps the last saved workbook in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Option<SheetSet>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts out holding `sheets`.
    pub fn with_sheets(sheets: SheetSet) -> Self {
        MemoryStore {
            saved: Some(sheets),
            saves: 0,
        }
    }

    /// Number of saves since creation.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl SheetStore for MemoryStore {
    fn load_sheets(&self) -> Result<Option<SheetSet>> {
        Ok(self.saved.clone())
    }

    fn save_sheets(&mut self, sheets: &SheetSet) -> Result<()> {
        self.saved = Some(sheets.clone());
        self.saves += 1;
        Ok(())
    }
}

/// Stores the workbook as a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SheetStore for JsonFileStore {
    fn load_sheets(&self) -> Result<Option<SheetSet>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save_sheets(&mut self, sheets: &SheetSet) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string(sheets)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

/// A [`MemoryStore`] whose save count stays readable after the store is
/// handed to a document.
#[cfg(test)]
pub(crate) struct CountingStore {
    inner: MemoryStore,
    saves: std::rc::Rc<std::cell::Cell<usize>>,
}

#[cfg(test)]
impl CountingStore {
    pub(crate) fn new() -> (Self, std::rc::Rc<std::cell::Cell<usize>>) {
        let saves = std::rc::Rc::new(std::cell::Cell::new(0));
        let store = CountingStore {
            inner: MemoryStore::new(),
            saves: saves.clone(),
        };
        (store, saves)
    }
}

#[cfg(test)]
impl SheetStore for CountingStore {
    fn load_sheets(&self) -> Result<Option<SheetSet>> {
        self.inner.load_sheets()
    }

    fn save_sheets(&mut self, sheets: &SheetSet) -> Result<()> {
        self.inner.save_sheets(sheets)?;
        self.saves.set(self.inner.saves());
        Ok(())
    }
}
