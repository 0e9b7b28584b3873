use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a consumer should interpret a sequence's values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Role {
    Categories,
    Label,
    ValuesX,
    #[default]
    ValuesY,
    ValuesSize,
    ValuesFirst,
    ValuesLast,
    ValuesMin,
    ValuesMax,
    ErrorBarsXPositive,
    ErrorBarsXNegative,
    ErrorBarsYPositive,
    ErrorBarsYNegative,
    Other(String),
}

const NAMES: &[(&str, Role)] = &[
    ("categories", Role::Categories),
    ("label", Role::Label),
    ("values-x", Role::ValuesX),
    ("values-y", Role::ValuesY),
    ("values-size", Role::ValuesSize),
    ("values-first", Role::ValuesFirst),
    ("values-last", Role::ValuesLast),
    ("values-min", Role::ValuesMin),
    ("values-max", Role::ValuesMax),
    ("error-bars-x-positive", Role::ErrorBarsXPositive),
    ("error-bars-x-negative", Role::ErrorBarsXNegative),
    ("error-bars-y-positive", Role::ErrorBarsYPositive),
    ("error-bars-y-negative", Role::ErrorBarsYNegative),
];

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Other(s) => s,
            known => NAMES
                .iter()
                .find(|(_, r)| r == known)
                .map_or("", |(name, _)| name),
        }
    }

    /// Unknown strings are kept verbatim as [`Role::Other`].
    pub fn parse(s: &str) -> Role {
        NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map_or_else(|| Role::Other(s.to_string()), |(_, r)| r.clone())
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Role::parse(s))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for (name, role) in NAMES {
            assert_eq!(Role::parse(name), *role);
            assert_eq!(role.to_string(), *name);
        }
        assert_eq!(Role::parse("values-z"), Role::Other("values-z".into()));
        assert_eq!(Role::Other("x".into()).as_str(), "x");
    }
}
