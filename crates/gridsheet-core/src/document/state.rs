use gridsheet_engine::engine::{CellAddress, CellKind};
use std::collections::HashMap;

use super::clipboard::Clipboard;
use super::eval::CellFormatting;
use super::selection::{FormulaBar, SelectionRange};
use super::sort::SortState;
use crate::config::Config;
use crate::error::Result;
use crate::sheet::{Sheet, SheetSet};
use crate::storage::{MemoryStore, SheetStore};

/// UI-agnostic workbook state.
///
/// Every operation acts on the active sheet. Raw cell text is the only thing
/// stored; display values are recomputed on each read.
pub struct Document {
    pub(crate) sheets: Vec<Sheet>,
    pub(crate) active: usize,
    pub config: Config,
    /// The cell keyboard actions and menu commands apply to.
    pub selected_cell: Option<CellAddress>,
    pub(crate) selection: Option<SelectionRange>,
    pub(crate) selection_start: Option<CellAddress>,
    pub(crate) selection_end: Option<CellAddress>,
    pub(crate) selecting: bool,
    pub formula_bar: FormulaBar,
    /// Cell with a direct edit in progress.
    pub(crate) editing: Option<CellAddress>,
    /// Declared cell types. Keyed by address, not rekeyed by structural edits.
    pub(crate) metadata: HashMap<CellAddress, CellKind>,
    pub(crate) formatting: HashMap<CellAddress, CellFormatting>,
    pub(crate) clipboard: Option<Clipboard>,
    pub(crate) sort: Option<SortState>,
    /// Whether anything has changed since the document was created or opened.
    pub modified: bool,
    next_id: u32,
    store: Box<dyn SheetStore>,
}

impl Document {
    /// Create a document backed by an in-memory store.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let config = config.normalized();
        let mut doc = Document {
            sheets: Vec::new(),
            active: 0,
            config,
            selected_cell: None,
            selection: None,
            selection_start: None,
            selection_end: None,
            selecting: false,
            formula_bar: FormulaBar::default(),
            editing: None,
            metadata: HashMap::new(),
            formatting: HashMap::new(),
            clipboard: None,
            sort: None,
            modified: false,
            next_id: 1,
            store: Box::new(MemoryStore::new()),
        };
        let sheets: Vec<Sheet> = (0..doc.config.initial_sheets)
            .map(|i| doc.blank_sheet(i + 1))
            .collect();
        doc.sheets = sheets;
        doc
    }

    /// Create a document and load whatever `store` holds.
    ///
    /// Unreadable or invalid stored data is logged and replaced by fresh
    /// sheets; it is never an error.
    pub fn with_store(store: Box<dyn SheetStore>, config: Config) -> Self {
        let mut doc = Self::with_config(config);
        match store.load_sheets() {
            Ok(Some(set)) => match set.validate() {
                Ok(()) => doc.adopt(set),
                Err(e) => log::warn!("Ignoring stored workbook: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Failed to load stored workbook: {}", e),
        }
        doc.store = store;
        doc
    }

    pub fn store(&self) -> &dyn SheetStore {
        self.store.as_ref()
    }

    fn blank_sheet(&mut self, number: usize) -> Sheet {
        if self.next_id == u32::MAX {
            self.renumber_sheets();
        }
        let id = self.next_id;
        self.next_id += 1;
        Sheet::blank(
            format!("Sheet {}", number),
            id,
            self.config.max_rows,
            self.config.columns,
        )
    }

    fn adopt(&mut self, set: SheetSet) {
        let max_id = set.sheets.iter().map(|s| s.id).max().unwrap_or(0);
        self.sheets = set.sheets;
        self.active = set.active_sheet;
        match max_id.checked_add(1) {
            Some(next) => self.next_id = next,
            None => self.renumber_sheets(),
        }
    }

    /// Give sheets the ids `1..=N` in order.
    fn renumber_sheets(&mut self) {
        for (i, sheet) in self.sheets.iter_mut().enumerate() {
            sheet.id = i as u32 + 1;
        }
        self.next_id = self.sheets.len() as u32 + 1;
    }

    /// Save the workbook and mark the document modified.
    ///
    /// Save failures are logged; the in-memory state stays authoritative.
    pub(crate) fn persist(&mut self) {
        self.modified = true;
        let set = self.sheet_set();
        if let Err(e) = self.store.save_sheets(&set) {
            log::error!("Failed to save workbook: {}", e);
        }
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheets[self.active]
    }

    pub(crate) fn sheet_mut(&mut self) -> &mut Sheet {
        &mut self.sheets[self.active]
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn active_sheet(&self) -> usize {
        self.active
    }

    /// Snapshot of all sheets plus the active index.
    pub fn sheet_set(&self) -> SheetSet {
        SheetSet {
            sheets: self.sheets.clone(),
            active_sheet: self.active,
        }
    }

    /// Forget selection, drag and sort state tied to the current sheet layout.
    pub(crate) fn reset_view_state(&mut self) {
        self.selected_cell = None;
        self.clear_selection();
        self.editing = None;
        self.sort = None;
    }

    /// Append a blank sheet named `Sheet N` and make it active.
    pub fn add_sheet(&mut self) -> usize {
        let sheet = self.blank_sheet(self.sheets.len() + 1);
        self.sheets.push(sheet);
        self.active = self.sheets.len() - 1;
        self.reset_view_state();
        self.persist();
        self.active
    }

    /// Remove a sheet. The last remaining sheet cannot be removed.
    ///
    /// Remaining sheets are renamed `Sheet 1..N` in order.
    pub fn remove_sheet(&mut self, index: usize) -> bool {
        if self.sheets.len() <= 1 || index >= self.sheets.len() {
            return false;
        }
        self.sheets.remove(index);
        for (i, sheet) in self.sheets.iter_mut().enumerate() {
            sheet.name = format!("Sheet {}", i + 1);
        }
        if index < self.active || self.active >= self.sheets.len() {
            self.active = self.active.saturating_sub(1);
        }
        self.reset_view_state();
        self.persist();
        true
    }

    pub fn select_sheet(&mut self, index: usize) -> bool {
        if index >= self.sheets.len() || index == self.active {
            return false;
        }
        self.active = index;
        self.reset_view_state();
        self.persist();
        true
    }

    /// Replace the workbook with a single blank sheet.
    pub fn new_file(&mut self) {
        self.next_id = 1;
        let sheet = self.blank_sheet(1);
        self.sheets = vec![sheet];
        self.active = 0;
        self.reset_view_state();
        self.formula_bar = FormulaBar::default();
        self.metadata.clear();
        self.formatting.clear();
        self.clipboard = None;
        self.persist();
    }

    /// Replace the workbook with imported sheets.
    ///
    /// The set is validated first; on error nothing changes. Sheet ids are
    /// reassigned and the first sheet becomes active.
    pub fn open_sheets(&mut self, set: SheetSet) -> Result<()> {
        set.validate()?;
        self.sheets = set.sheets;
        self.renumber_sheets();
        self.active = 0;
        self.reset_view_state();
        self.formula_bar = FormulaBar::default();
        self.persist();
        Ok(())
    }
}

#[cfg(test)]
impl Document {
    /// A default document whose store reports how many saves it has taken.
    pub(crate) fn with_save_counter() -> (Document, std::rc::Rc<std::cell::Cell<usize>>) {
        let (store, saves) = crate::storage::CountingStore::new();
        (Document::with_store(Box::new(store), Config::default()), saves)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SheetError;
    use gridsheet_engine::engine::CellValue;

    #[test]
    fn test_new_document_has_initial_sheets() {
        let doc = Document::new();
        assert_eq!(doc.sheets().len(), 2);
        assert_eq!(doc.sheets()[0].name, "Sheet 1");
        assert_eq!(doc.sheets()[1].name, "Sheet 2");
        assert_ne!(doc.sheets()[0].id, doc.sheets()[1].id);
        assert_eq!(doc.sheet().height(), 100);
        assert_eq!(doc.sheet().width(), 26);
        assert!(!doc.modified);
    }

    #[test]
    fn test_with_store_loads_valid_workbook() {
        let mut sheet = Sheet::blank("Budget", 7, 3, 2);
        sheet.rows[0][0] = CellValue::from("x");
        let set = SheetSet {
            sheets: vec![Sheet::blank("Other", 2, 1, 1), sheet],
            active_sheet: 1,
        };
        let doc = Document::with_store(Box::new(MemoryStore::with_sheets(set)), Config::default());
        assert_eq!(doc.active_sheet(), 1);
        assert_eq!(doc.sheet().name, "Budget");
        assert_eq!(doc.sheet().rows[0][0], CellValue::from("x"));
    }

    #[test]
    fn test_with_store_ignores_invalid_workbook() {
        let set = SheetSet {
            sheets: vec![Sheet::blank("Only", 1, 1, 1)],
            active_sheet: 4,
        };
        let doc = Document::with_store(Box::new(MemoryStore::with_sheets(set)), Config::default());
        assert_eq!(doc.sheets().len(), 2);
        assert_eq!(doc.sheet().name, "Sheet 1");
    }

    #[test]
    fn test_add_sheet_persists() {
        let mut doc = Document::new();
        let index = doc.add_sheet();
        assert_eq!(index, 2);
        assert_eq!(doc.active_sheet(), 2);
        assert_eq!(doc.sheet().name, "Sheet 3");
        assert!(doc.modified);
        let saved = doc.store().load_sheets().unwrap().unwrap();
        assert_eq!(saved.sheets.len(), 3);
        assert_eq!(saved.active_sheet, 2);
    }

    #[test]
    fn test_remove_sheet_renames_and_keeps_last() {
        let mut doc = Document::new();
        doc.add_sheet();
        doc.select_sheet(2);
        let third_id = doc.sheet().id;

        assert!(doc.remove_sheet(0));
        assert_eq!(doc.sheets().len(), 2);
        assert_eq!(doc.sheets()[0].name, "Sheet 1");
        assert_eq!(doc.sheets()[1].name, "Sheet 2");
        assert_eq!(doc.sheet().id, third_id);

        assert!(doc.remove_sheet(1));
        assert_eq!(doc.active_sheet(), 0);
        assert!(!doc.remove_sheet(0));
        assert_eq!(doc.sheets().len(), 1);
    }

    #[test]
    fn test_select_sheet_bounds() {
        let mut doc = Document::new();
        assert!(doc.select_sheet(1));
        assert!(!doc.select_sheet(1));
        assert!(!doc.select_sheet(9));
        assert_eq!(doc.active_sheet(), 1);
    }

    #[test]
    fn test_select_sheet_saves_active_index() {
        let (mut doc, saves) = Document::with_save_counter();
        assert_eq!(saves.get(), 0);
        assert!(doc.select_sheet(1));
        assert_eq!(saves.get(), 1);
        assert_eq!(doc.store().load_sheets().unwrap().unwrap().active_sheet, 1);

        assert!(!doc.select_sheet(1));
        assert_eq!(saves.get(), 1);
    }

    #[test]
    fn test_max_sheet_id_does_not_overflow() {
        let set = SheetSet {
            sheets: vec![Sheet::blank("a", u32::MAX, 1, 1), Sheet::blank("b", 3, 1, 1)],
            active_sheet: 0,
        };
        let mut doc = Document::with_store(Box::new(MemoryStore::with_sheets(set)), Config::default());
        assert_eq!(doc.sheets()[0].id, 1);
        assert_eq!(doc.sheets()[1].id, 2);
        doc.add_sheet();
        assert_eq!(doc.sheet().id, 3);

        let set = SheetSet {
            sheets: vec![Sheet::blank("a", u32::MAX - 1, 1, 1)],
            active_sheet: 0,
        };
        let mut doc = Document::with_store(Box::new(MemoryStore::with_sheets(set)), Config::default());
        assert_eq!(doc.sheet().id, u32::MAX - 1);
        doc.add_sheet();
        let ids: Vec<u32> = doc.sheets().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_new_file_resets_everything() {
        let mut doc = Document::new();
        doc.add_sheet();
        doc.set_cell_value(&CellAddress::new(0, "A"), "1").unwrap();
        doc.set_cell_type(&CellAddress::new(0, "A"), CellKind::Number);

        doc.new_file();
        assert_eq!(doc.sheets().len(), 1);
        assert_eq!(doc.sheet().name, "Sheet 1");
        assert!(doc.sheet().rows.iter().flatten().all(CellValue::is_empty));
        assert_eq!(doc.cell_type(&CellAddress::new(0, "A")), CellKind::Text);
    }

    #[test]
    fn test_open_sheets_validates_and_reassigns_ids() {
        let mut doc = Document::new();
        let bad = SheetSet {
            sheets: vec![],
            active_sheet: 0,
        };
        assert!(matches!(
            doc.open_sheets(bad),
            Err(SheetError::InvalidSheetSet(_))
        ));
        assert_eq!(doc.sheets().len(), 2);

        let set = SheetSet {
            sheets: vec![Sheet::blank("a", 40, 2, 2), Sheet::blank("b", 40, 2, 2)],
            active_sheet: 1,
        };
        doc.open_sheets(set).unwrap();
        assert_eq!(doc.active_sheet(), 0);
        assert_eq!(doc.sheets()[0].id, 1);
        assert_eq!(doc.sheets()[1].id, 2);
        assert_eq!(doc.sheet().name, "a");
    }
}
