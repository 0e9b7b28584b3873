use thiserror::Error;

/// Syntax errors raised while reading a range representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeParseError {
    #[error("empty range representation")]
    Empty,
    #[error("invalid cell reference `{0}`")]
    InvalidCell(String),
    #[error("column `{0}` is beyond XFD")]
    ColumnOutOfBounds(String),
    #[error("row `{0}` is outside 1..=1048576")]
    RowOutOfBounds(String),
    #[error("unterminated quoted name in `{0}`")]
    UnterminatedQuote(String),
    #[error("empty sheet name in `{0}`")]
    EmptySheetName(String),
    #[error("missing sheet qualifier in `{0}`")]
    MissingSheet(String),
    #[error("invalid name `{0}`")]
    InvalidName(String),
    #[error("unexpected text `{0}`")]
    Unexpected(String),
    #[error("external reference `{0}` cannot span a sheet band")]
    ExternalBand(String),
}

/// Errors raised while constructing addresses from already parsed parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("range start must not come after its end")]
    RangeOrder,
    #[error("sheet band start must not come after its end")]
    SheetOrder,
    #[error("row {0} is outside the sheet")]
    RowOutOfBounds(u32),
    #[error("column {0} is outside the sheet")]
    ColumnOutOfBounds(u32),
}
