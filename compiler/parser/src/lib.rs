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

//! The parser to convert Vesper source text into modules of an [`vesper_ast::Ast`].
//!
//! The scanner is embedded in the parser: the grammar disambiguates on raw
//! bytes (`&` vs `&&`, `.&name`, keyword boundaries), so the byte-level
//! matchers live on the parser context instead of a separate token stream.
//! Parsing a module recursively parses its `using` dependencies first, which
//! makes `modules_in_order` a post-order of the import graph.

#![forbid(unsafe_code)]

pub(crate) mod lexer;

pub mod parser;
pub use parser::{parse, ModuleTextProvider};
