//! In-memory spreadsheet document used as the data backend for chart sequences.
//!
//! Besides cell storage it provides what a live consumer needs to stay in sync:
//! edit and visibility broadcasts with RAII [`Subscription`]s, a registry of
//! externally linked files, and a shared [`BlockPositionCache`] for fast column walks.

pub mod block_position;
pub mod broadcast;
pub mod column;
pub mod document;
pub mod error;
pub mod external;
pub mod visibility;

pub use block_position::{BlockPositionCache, ColumnBlockPosition};
pub use broadcast::{ListenerId, Listeners, Subscription};
pub use column::{BlockSlot, CellKind, Column};
pub use document::{
    DocReader, Document, EditCallback, EditEvent, Transaction, VisibilityCallback,
    WatchedRanges, WeakDocument,
};
pub use error::{DocumentError, Result};
pub use external::{ExternalLinks, LinkCallback, LinkUpdate};
pub use visibility::{HideSource, SheetVisibility};
