use chartseq_common::{AddressError, FileId, SheetIndex};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("no sheet at index {0}")]
    UnknownSheet(SheetIndex),
    #[error("no sheet named `{0}`")]
    UnknownSheetName(String),
    #[error("a sheet named `{0}` already exists")]
    DuplicateSheetName(String),
    #[error("`{0}` is not a valid sheet name")]
    InvalidSheetName(String),
    #[error("sheet limit reached")]
    TooManySheets,
    #[error("`{0}` is not a valid defined name")]
    InvalidName(String),
    #[error("no external file with id {0}")]
    UnknownExternalFile(FileId),
    #[error("external file limit reached")]
    TooManyExternalFiles,
    #[error(transparent)]
    Address(#[from] AddressError),
}

pub type Result<T> = std::result::Result<T, DocumentError>;
