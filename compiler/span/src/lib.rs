// Copyright (C) 2023-2024 The Vesper Team.
// This file is part of the Vesper library.

// The Vesper library is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// The Vesper library is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with the Vesper library. If not, see <https://www.gnu.org/licenses/>.

//! Source positions for the Vesper compiler.
//!
//! The front end tracks a line and a column per node; there is no byte-offset
//! machinery because diagnostics only ever report `module:line:column`.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in a module's source text.
///
/// Both fields are 1-based. The all-zero location is the "not yet defined"
/// sentinel carried by entities that were mentioned before their defining
/// occurrence, e.g. a class first seen as a base-class reference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column, counted in bytes from the start of the line.
    pub pos: u32,
}

impl Location {
    /// Returns a new [`Location`] for the given line and column.
    pub const fn new(line: u32, pos: u32) -> Self {
        Self { line, pos }
    }

    /// Whether this location points at real source text.
    pub const fn is_defined(&self) -> bool {
        self.line != 0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Location::new(3, 14).to_string(), "3:14");
    }

    #[test]
    fn default_is_undefined() {
        assert!(!Location::default().is_defined());
        assert!(Location::new(1, 1).is_defined());
    }
}
