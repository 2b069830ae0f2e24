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

//! Diagnostics for the Vesper front end.
//!
//! Every error the front end can produce is fatal: the first one aborts the
//! whole parse by unwinding through [`Result`] propagation and is rendered as
//! a single line of the form `error <message> <module>:<line>:<column>`.

#![forbid(unsafe_code)]

mod parser_error;
pub use parser_error::*;

/// The `Result` type used throughout the front end.
pub type Result<T, E = ParserError> = core::result::Result<T, E>;
