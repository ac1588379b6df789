//! Schema Versions - Major/Minor Version Tags
//!
//! A store declares the version of the data shape it understands.
//! Major bumps are incompatible and need an explicit migration;
//! minor bumps are compatible and migration is optional.

use serde::{Deserialize, Serialize};

/// Minor version assumed when none is declared or persisted.
pub const DEFAULT_MINOR_VERSION: u32 = 1;

/// A `(major, minor)` schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionTag {
    /// Incompatible schema generation.
    pub major: u32,
    /// Compatible revision within a major generation.
    pub minor: u32,
}

/// How a persisted version relates to the declared one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionDelta {
    /// Same major and minor: data passes through untouched.
    Same,
    /// Same major, different minor: migration is best-effort.
    MinorChanged,
    /// Different major: migration is mandatory.
    MajorChanged,
}

impl VersionTag {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Version with the default minor revision.
    pub const fn major(major: u32) -> Self {
        Self::new(major, DEFAULT_MINOR_VERSION)
    }

    /// Classify `persisted` relative to this (declared) version.
    pub const fn delta_from(&self, persisted: &Self) -> VersionDelta {
        if self.major != persisted.major {
            VersionDelta::MajorChanged
        } else if self.minor != persisted.minor {
            VersionDelta::MinorChanged
        } else {
            VersionDelta::Same
        }
    }
}

impl std::fmt::Display for VersionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
