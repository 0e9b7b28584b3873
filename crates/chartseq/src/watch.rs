//! Subscriptions a sequence holds on document visibility and external links.
//!
//! Both watchers unregister from the document when dropped, so a sequence's
//! subscriptions live exactly as long as the sequence itself.

use std::sync::Arc;

use chartseq_common::FileId;
use chartseq_doc::{
    Document, ExternalLinks, LinkCallback, Subscription, VisibilityCallback, WatchedRanges,
};
use rustc_hash::FxHashMap;

/// Row and column visibility subscription over a set of ranges.
#[derive(Debug)]
pub struct HiddenRangeWatch {
    subscription: Subscription,
}

impl HiddenRangeWatch {
    pub fn register(doc: &Document, ranges: WatchedRanges, on_change: Arc<VisibilityCallback>) -> Self {
        Self {
            subscription: doc.subscribe_visibility(ranges, on_change),
        }
    }

    /// Replace the watched ranges without re-registering.
    pub fn rewatch(&self, doc: &Document, ranges: WatchedRanges) -> bool {
        doc.rewatch_visibility(self.subscription.id(), ranges)
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }
}

/// One subscription per referenced external file.
pub struct ExternalLinkWatch {
    files: FxHashMap<FileId, Subscription>,
    on_change: Arc<LinkCallback>,
}

impl std::fmt::Debug for ExternalLinkWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalLinkWatch")
            .field("files", &self.file_ids())
            .finish()
    }
}

impl ExternalLinkWatch {
    pub fn new(on_change: Arc<LinkCallback>) -> Self {
        Self {
            files: FxHashMap::default(),
            on_change,
        }
    }

    /// Start listening to `file`. Returns `false` if it was already watched.
    pub fn add_file_id(&mut self, links: &ExternalLinks, file: FileId) -> bool {
        if self.files.contains_key(&file) {
            return false;
        }
        let sub = links.subscribe(file, self.on_change.clone());
        self.files.insert(file, sub);
        true
    }

    pub fn remove_file_id(&mut self, file: FileId) -> bool {
        self.files.remove(&file).is_some()
    }

    /// Watch exactly `wanted`, adding and dropping subscriptions as needed.
    pub fn sync(&mut self, links: &ExternalLinks, wanted: &[FileId]) {
        self.files.retain(|file, _| wanted.contains(file));
        for &file in wanted {
            self.add_file_id(links, file);
        }
    }

    pub fn file_ids(&self) -> Vec<FileId> {
        let mut ids: Vec<_> = self.files.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
