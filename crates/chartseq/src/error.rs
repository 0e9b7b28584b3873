use chartseq_common::{AddressError, RangeParseError};
use chartseq_doc::DocumentError;
use thiserror::Error;

/// Broad class of a [`ChartError`], as reported to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input: bad range syntax, unknown sheet, invalid time index or index argument.
    Argument,
    /// An index beyond the resolved slot count.
    OutOfRange,
    /// Document access or internal failure.
    Runtime,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    #[error("invalid argument: {0}")]
    Argument(String),
    #[error("index {index} out of range for {len} values")]
    OutOfRange { index: i64, len: usize },
    #[error("{0}")]
    Runtime(String),
    #[error("the document backing this sequence has been disposed")]
    DocumentDisposed,
}

impl ChartError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChartError::Argument(_) => ErrorKind::Argument,
            ChartError::OutOfRange { .. } => ErrorKind::OutOfRange,
            ChartError::Runtime(_) | ChartError::DocumentDisposed => ErrorKind::Runtime,
        }
    }

    pub fn argument(msg: impl Into<String>) -> Self {
        ChartError::Argument(msg.into())
    }
}

impl From<RangeParseError> for ChartError {
    fn from(err: RangeParseError) -> Self {
        ChartError::Argument(err.to_string())
    }
}

impl From<AddressError> for ChartError {
    fn from(err: AddressError) -> Self {
        ChartError::Argument(err.to_string())
    }
}

impl From<DocumentError> for ChartError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::TooManySheets | DocumentError::TooManyExternalFiles => {
                ChartError::Runtime(err.to_string())
            }
            other => ChartError::Argument(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChartError>;
