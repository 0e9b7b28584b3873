//! Registry and value cache for externally linked documents.

use std::sync::Arc;

use chartseq_common::{CellValue, FileId};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::broadcast::{Listeners, Subscription};
use crate::error::{DocumentError, Result};

/// What happened to a linked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkUpdate {
    /// Cached values were reloaded or refreshed.
    Modified,
    /// The link was broken and its cached values dropped.
    Broken,
}

pub type LinkCallback = dyn Fn(FileId, LinkUpdate) + Send + Sync;

#[derive(Debug, Default)]
struct CachedSheet {
    cells: FxHashMap<(u32, u32), CellValue>,
}

#[derive(Debug)]
struct LinkedFile {
    name: String,
    sheets: FxHashMap<String, CachedSheet>,
}

#[derive(Debug, Default)]
struct LinkTable {
    files: Vec<LinkedFile>,
    by_name: FxHashMap<String, FileId>,
}

impl LinkTable {
    fn file(&self, id: FileId) -> Result<&LinkedFile> {
        self.files
            .get(id as usize)
            .ok_or(DocumentError::UnknownExternalFile(id))
    }

    fn file_mut(&mut self, id: FileId) -> Result<&mut LinkedFile> {
        self.files
            .get_mut(id as usize)
            .ok_or(DocumentError::UnknownExternalFile(id))
    }
}

/// File-id registry, cached external values and per-file change listeners.
#[derive(Debug, Default)]
pub struct ExternalLinks {
    table: RwLock<LinkTable>,
    listeners: Listeners<FileId, LinkCallback>,
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}

impl ExternalLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `name`, registering the file on first use.
    pub fn register_file(&self, name: &str) -> Result<FileId> {
        let key = fold(name);
        let mut table = self.table.write();
        if let Some(&id) = table.by_name.get(&key) {
            return Ok(id);
        }
        let id = FileId::try_from(table.files.len()).map_err(|_| DocumentError::TooManyExternalFiles)?;
        table.files.push(LinkedFile {
            name: name.to_string(),
            sheets: FxHashMap::default(),
        });
        table.by_name.insert(key, id);
        Ok(id)
    }

    pub fn file_id(&self, name: &str) -> Option<FileId> {
        self.table.read().by_name.get(&fold(name)).copied()
    }

    pub fn file_name(&self, id: FileId) -> Option<String> {
        self.table.read().file(id).ok().map(|f| f.name.clone())
    }

    pub fn file_count(&self) -> usize {
        self.table.read().files.len()
    }

    /// Replace the cached contents of one sheet of a linked file and announce the update.
    pub fn load_sheet<I>(&self, file: FileId, sheet: &str, cells: I) -> Result<()>
    where
        I: IntoIterator<Item = (u32, u32, CellValue)>,
    {
        {
            let mut table = self.table.write();
            let linked = table.file_mut(file)?;
            let cached = CachedSheet {
                cells: cells
                    .into_iter()
                    .filter(|(_, _, v)| !v.is_empty())
                    .map(|(r, c, v)| ((r, c), v))
                    .collect(),
            };
            linked.sheets.insert(fold(sheet), cached);
        }
        self.notify(file, LinkUpdate::Modified);
        Ok(())
    }

    /// Announce that a file's cached values were refreshed from the source.
    pub fn refresh(&self, file: FileId) -> Result<()> {
        self.table.read().file(file)?;
        self.notify(file, LinkUpdate::Modified);
        Ok(())
    }

    /// Drop a file's cached values. The id stays registered so the link can be restored.
    pub fn break_link(&self, file: FileId) -> Result<()> {
        self.table.write().file_mut(file)?.sheets.clear();
        self.notify(file, LinkUpdate::Broken);
        Ok(())
    }

    pub fn is_loaded(&self, file: FileId, sheet: &str) -> bool {
        self.table
            .read()
            .file(file)
            .is_ok_and(|f| f.sheets.contains_key(&fold(sheet)))
    }

    /// `None` when the sheet has not been loaded; `Some(Empty)` for a blank loaded cell.
    pub fn cached_value(&self, file: FileId, sheet: &str, row: u32, col: u32) -> Option<CellValue> {
        let table = self.table.read();
        let cached = table.file(file).ok()?.sheets.get(&fold(sheet))?;
        Some(cached.cells.get(&(row, col)).cloned().unwrap_or_default())
    }

    pub fn subscribe(&self, file: FileId, callback: Arc<LinkCallback>) -> Subscription {
        self.listeners.subscribe(file, callback)
    }

    pub fn listener_count(&self, file: FileId) -> usize {
        self.listeners.matching(|id| *id == file).len()
    }

    fn notify(&self, file: FileId, update: LinkUpdate) {
        #[cfg(feature = "tracing")]
        tracing::debug!(file, ?update, "external link update");
        for cb in self.listeners.matching(|id| *id == file) {
            cb(file, update);
        }
    }
}
