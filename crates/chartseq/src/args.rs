//! Arguments for building a data source, and their name/value-pair form.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, Result};

/// Whether each series runs down a column or along a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RowSource {
    #[default]
    Columns,
    Rows,
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SourceArguments {
    pub cell_range_representation: String,
    pub row_source: RowSource,
    pub first_cell_as_label: bool,
    pub has_categories: bool,
    /// Reordering applied to the value series: output series `i` is input series `mapping[i]`.
    pub sequence_mapping: Vec<usize>,
    /// Overrides the provider default when set.
    pub include_hidden_cells: Option<bool>,
    pub time_based: bool,
}

/// Untyped value of a named argument.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ArgValue {
    Bool(bool),
    Text(String),
    RowSource(RowSource),
    Indices(Vec<usize>),
}

/// One named argument, as exchanged with consumers that pass property lists.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PropertyValue {
    pub name: String,
    pub value: ArgValue,
}

impl PropertyValue {
    pub fn new(name: &str, value: ArgValue) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

pub const CELL_RANGE_REPRESENTATION: &str = "CellRangeRepresentation";
pub const DATA_ROW_SOURCE: &str = "DataRowSource";
pub const FIRST_CELL_AS_LABEL: &str = "FirstCellAsLabel";
pub const HAS_CATEGORIES: &str = "HasCategories";
pub const SEQUENCE_MAPPING: &str = "SequenceMapping";
pub const INCLUDE_HIDDEN_CELLS: &str = "IncludeHiddenCells";
pub const TIME_BASED: &str = "TimeBased";

fn mismatch(name: &str) -> ChartError {
    ChartError::argument(format!("argument '{name}' has the wrong type"))
}

impl SourceArguments {
    pub fn new(cell_range_representation: impl Into<String>) -> Self {
        Self {
            cell_range_representation: cell_range_representation.into(),
            ..Self::default()
        }
    }

    /// Read named arguments. Unknown names are ignored; known names with the wrong
    /// value type are argument errors.
    pub fn from_properties(props: &[PropertyValue]) -> Result<Self> {
        let mut args = SourceArguments::default();
        for prop in props {
            let name = prop.name.as_str();
            match (name, &prop.value) {
                (CELL_RANGE_REPRESENTATION, ArgValue::Text(s)) => {
                    args.cell_range_representation = s.clone();
                }
                (DATA_ROW_SOURCE, ArgValue::RowSource(r)) => args.row_source = *r,
                (FIRST_CELL_AS_LABEL, ArgValue::Bool(b)) => args.first_cell_as_label = *b,
                (HAS_CATEGORIES, ArgValue::Bool(b)) => args.has_categories = *b,
                (SEQUENCE_MAPPING, ArgValue::Indices(m)) => args.sequence_mapping = m.clone(),
                (INCLUDE_HIDDEN_CELLS, ArgValue::Bool(b)) => args.include_hidden_cells = Some(*b),
                (TIME_BASED, ArgValue::Bool(b)) => args.time_based = *b,
                (
                    CELL_RANGE_REPRESENTATION | DATA_ROW_SOURCE | FIRST_CELL_AS_LABEL
                    | HAS_CATEGORIES | SEQUENCE_MAPPING | INCLUDE_HIDDEN_CELLS | TIME_BASED,
                    _,
                ) => return Err(mismatch(name)),
                _ => {}
            }
        }
        Ok(args)
    }

    pub fn to_properties(&self) -> Vec<PropertyValue> {
        let mut props = vec![
            PropertyValue::new(
                CELL_RANGE_REPRESENTATION,
                ArgValue::Text(self.cell_range_representation.clone()),
            ),
            PropertyValue::new(DATA_ROW_SOURCE, ArgValue::RowSource(self.row_source)),
            PropertyValue::new(FIRST_CELL_AS_LABEL, ArgValue::Bool(self.first_cell_as_label)),
            PropertyValue::new(HAS_CATEGORIES, ArgValue::Bool(self.has_categories)),
        ];
        if !self.sequence_mapping.is_empty() {
            props.push(PropertyValue::new(
                SEQUENCE_MAPPING,
                ArgValue::Indices(self.sequence_mapping.clone()),
            ));
        }
        if let Some(include) = self.include_hidden_cells {
            props.push(PropertyValue::new(INCLUDE_HIDDEN_CELLS, ArgValue::Bool(include)));
        }
        if self.time_based {
            props.push(PropertyValue::new(TIME_BASED, ArgValue::Bool(true)));
        }
        props
    }
}
