#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Provider-wide settings handed to every sequence it creates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ProviderConfig {
    /// Default for sources whose arguments do not say whether hidden cells count.
    pub include_hidden_cells: bool,
    /// Upper bound on the slots one rebuild may produce. Larger rebuilds fail and keep
    /// the previous snapshot.
    pub max_cells_per_sequence: usize,
    /// Separator between ranges in the API representation.
    pub list_separator: char,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            include_hidden_cells: true,
            max_cells_per_sequence: 1 << 20,
            list_separator: ';',
        }
    }
}
