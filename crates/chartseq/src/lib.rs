//! Live chart data sequences over a spreadsheet document.
//!
//! A [`DataProvider`] resolves range text, token lists or literal arrays into
//! [`DataSequence`]s. Each sequence caches its values in an immutable [`Snapshot`],
//! listens to the document for edits, visibility changes and external-link updates, and
//! tells its modify listeners when the cache went stale. Reads rebuild lazily.
//!
//! ```
//! use chartseq::{CellAddress, DataProvider, Document};
//!
//! let doc = Document::with_sheets(&["Sheet1"]).unwrap();
//! doc.set_value(CellAddress::new(0, 0, 0), 3.0).unwrap();
//! let provider = DataProvider::new(&doc);
//! let seq = provider.create_sequence_by_range("Sheet1!A1:A2", true).unwrap();
//! assert_eq!(seq.numerical_data().unwrap(), vec![3.0, 0.0]);
//! ```

pub mod args;
pub mod config;
pub mod error;
pub mod label;
pub mod listener;
pub mod provider;
mod rebuild;
mod resolve;
pub mod role;
pub mod sequence;
pub mod snapshot;
pub mod source;
pub mod time;
pub mod value_array;
pub mod watch;

pub use args::{ArgValue, PropertyValue, RowSource, SourceArguments};
pub use config::ProviderConfig;
pub use error::{ChartError, ErrorKind, Result};
pub use label::LabelOrigin;
pub use listener::{ModifyEvent, ModifyListener, SequenceId};
pub use provider::DataProvider;
pub use role::Role;
pub use sequence::DataSequence;
pub use snapshot::{CacheItem, ItemOrigin, SequenceValue, Snapshot};
pub use source::{DataSource, LabeledDataSequence};
pub use time::TimeWindow;
pub use value_array::{format_value_array, parse_value_array};
pub use watch::{ExternalLinkWatch, HiddenRangeWatch};

pub use chartseq_common as common;
pub use chartseq_common::{
    CellAddress, CellValue, ExternalArea, FileId, RangeAddress, ReferenceToken, SheetIndex,
    StructuralChange,
};
pub use chartseq_doc as doc;
pub use chartseq_doc::{
    BlockPositionCache, ColumnBlockPosition, Document, EditEvent, ExternalLinks, LinkUpdate,
    ListenerId, Subscription, WeakDocument,
};
