//! Library coordinates - WHAT library (group/artifact + version).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `group/artifact` library coordinate, without version.
///
/// A bare `artifact` is shorthand for `artifact/artifact`, matching how
/// Maven-style coordinates are written in dependency manifests.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Coordinate(String);

impl Coordinate {
    pub fn new(coord: impl Into<String>) -> Self {
        let coord = coord.into();
        if coord.contains('/') {
            Coordinate(coord)
        } else {
            Coordinate(format!("{coord}/{coord}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The group half of the coordinate.
    pub fn group(&self) -> &str {
        self.0.split_once('/').map(|(g, _)| g).unwrap_or(&self.0)
    }

    /// The artifact half of the coordinate.
    pub fn artifact(&self) -> &str {
        self.0.split_once('/').map(|(_, a)| a).unwrap_or(&self.0)
    }
}

impl From<String> for Coordinate {
    fn from(s: String) -> Self {
        Coordinate::new(s)
    }
}

impl From<&str> for Coordinate {
    fn from(s: &str) -> Self {
        Coordinate::new(s)
    }
}

impl From<Coordinate> for String {
    fn from(c: Coordinate) -> Self {
        c.0
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resolved library: coordinate plus the version the resolver selected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Library {
    pub coord: Coordinate,
    pub version: String,
}

impl Library {
    pub fn new(coord: impl Into<Coordinate>, version: impl Into<String>) -> Self {
        Library {
            coord: coord.into(),
            version: version.into(),
        }
    }

    /// Get a display string like "group/artifact 1.2.3"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.coord, self.version)
    }
}
