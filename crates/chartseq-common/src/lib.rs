pub mod address;
pub mod coord;
pub mod error;
pub mod repr;
pub mod token;
pub mod value;

pub use address::*;
pub use coord::{A1Cell, MAX_COLS, MAX_ROWS, column_to_letters, letters_to_column};
pub use error::{AddressError, RangeParseError};
pub use repr::{
    AreaSpec, RangeSpec, RangeSpecList, format_api_list, format_xml_list, parse_api_list,
    parse_xml_list,
};
pub use token::{ExternalArea, ReferenceToken, StructuralChange, adjust_range};
pub use value::{CellErrorKind, CellValue, format_general};
