use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A semantic "M.m" context version, stored as a `(major, minor)` pair and
/// rendered as a string only at the JSON boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "String", into = "String")]
pub struct ContextVersion {
    major: u32,
    minor: u32,
}

impl ContextVersion {
    /// The first version ever assigned to a label: `1.0`.
    pub const FIRST: Self = Self { major: 1, minor: 0 };

    /// Construct directly from components.
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// The next minor version under the same major, e.g. `1.0` -> `1.1`.
    pub fn next_minor(self) -> Self {
        Self {
            major: self.major,
            minor: self.minor + 1,
        }
    }

    pub fn major(self) -> u32 {
        self.major
    }

    pub fn minor(self) -> u32 {
        self.minor
    }
}

impl fmt::Display for ContextVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ContextVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (major_s, minor_s) = s
            .split_once('.')
            .ok_or_else(|| Error::validation(format!("invalid version '{s}': expected 'M.m'")))?;
        let major = major_s
            .parse::<u32>()
            .map_err(|_| Error::validation(format!("invalid version '{s}': non-numeric major")))?;
        let minor = minor_s
            .parse::<u32>()
            .map_err(|_| Error::validation(format!("invalid version '{s}': non-numeric minor")))?;
        Ok(Self { major, minor })
    }
}

impl TryFrom<String> for ContextVersion {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ContextVersion> for String {
    fn from(v: ContextVersion) -> Self {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_renders_round_trip() {
        let v: ContextVersion = "1.2".parse().unwrap();
        assert_eq!(v.to_string(), "1.2");
        assert_eq!(v.major(), 1);
        assert_eq!(v.minor(), 2);
    }

    #[test]
    fn next_minor_increments_minor_only() {
        let v = ContextVersion::new(1, 2).next_minor();
        assert_eq!(v, ContextVersion::new(1, 3));
    }

    #[test]
    fn rejects_malformed_versions() {
        assert!("1".parse::<ContextVersion>().is_err());
        assert!("a.b".parse::<ContextVersion>().is_err());
    }

    #[test]
    fn ordering_is_component_wise() {
        assert!(ContextVersion::new(1, 9) < ContextVersion::new(2, 0));
        assert!(ContextVersion::new(1, 0) < ContextVersion::new(1, 1));
    }
}
