//! The dataset's three-component semantic version.
//!
//! The version string encodes the change-significance ladder between
//! ingestion runs: patch (repeat source, no structural change), minor (new
//! source ingested), major (new output directory introduced). Stored as a
//! plain string in [`super::model::Info`]; parsed and bumped here.

use std::fmt;
use std::str::FromStr;

use crate::error::CocotileError;

/// Which version component a run advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VersionTier {
    Patch,
    Minor,
    Major,
}

/// A `MAJOR.MINOR.PATCH` triple.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Standard bump semantics: increment the requested component and reset
    /// the lower ones, so a major bump supersedes any earlier minor/patch
    /// floor within the same run.
    pub fn bump(self, tier: VersionTier) -> Version {
        match tier {
            VersionTier::Patch => Version::new(self.major, self.minor, self.patch + 1),
            VersionTier::Minor => Version::new(self.major, self.minor + 1, 0),
            VersionTier::Major => Version::new(self.major + 1, 0, 0),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = CocotileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(CocotileError::VersionParse(s.to_string()));
        }
        let component = |p: &str| {
            p.parse::<u64>()
                .map_err(|_| CocotileError::VersionParse(s.to_string()))
        };
        Ok(Version::new(
            component(parts[0])?,
            component(parts[1])?,
            component(parts[2])?,
        ))
    }
}
