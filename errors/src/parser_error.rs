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

use vesper_span::Location;

use std::fmt;
use thiserror::Error;

/// Every diagnostic the parser can emit, with its message text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParserErrorKind {
    // Lexical errors.
    #[error("tabs aren't allowed as white space")]
    TabInWhitespace,
    #[error("overflow")]
    IntegerOverflow,
    #[error("digit with value {digit} is not allowed in {radix}-base number")]
    DigitOutOfRadix { digit: u64, radix: u64 },
    #[error("numeric overflow")]
    NumericOverflow,
    #[error("incomplete character constant")]
    IncompleteCharConstant,
    #[error("incomplete string constant")]
    IncompleteStringConstant,
    #[error("control characters in the string constant")]
    ControlCharInString,
    #[error("character code is outside the range 1..10ffff")]
    CharCodeOutOfRange,
    #[error("expected closing '\\'")]
    UnterminatedCharEscape,

    // Structural errors.
    #[error("expected '{0}'")]
    ExpectedToken(String),
    #[error("expected {0}")]
    ExpectedName(&'static str),
    #[error("expected type name")]
    ExpectedType,
    #[error("syntax error")]
    SyntaxError,
    #[error("expected a single expression in parenthesis or a lambda body")]
    MalformedParenthesized,
    #[error("lambda definition requires a parameter name")]
    LambdaParameterName,
    #[error("only methods return the this type")]
    ThisReturnOutsideMethod,
    #[error("expected a variable name in front of an assignment operator")]
    AssignTargetNotVariable,
    #[error("unexpected statements")]
    UnexpectedStatements,

    // Module-graph errors.
    #[error("circular dependency in modules: {0}")]
    CircularDependency(String),
    #[error("no source text for module {0}")]
    ModuleTextUnavailable(String),
    #[error("unknown name {name} in module {module}")]
    UnknownImportedName { name: String, module: String },
    #[error("names of the current module should not be prefixed with a module name")]
    CurrentModulePrefixed,
    #[error("module {import} is not visible from module {module}")]
    ModuleNotVisible { import: String, module: String },

    // Well-formedness errors detected while parsing.
    #[error("duplicated function name {name}, see {previous}")]
    DuplicateFunction { name: String, previous: Location },
    #[error("duplicated test name {name}, see {previous}")]
    DuplicateTest { name: String, previous: Location },
    #[error("duplicated constant name {name}, see {previous}")]
    DuplicateConstant { name: String, previous: Location },
    #[error("duplicated delegate name {name}, see {previous}")]
    DuplicateDelegate { name: String, previous: Location },
    #[error("field can't have '-' or '*' markers")]
    FieldWithMutMarker,
    #[error("reopened class must reuse existing type parameters")]
    ReopenedClassTypeParameters,
    #[error("interface can't have overrides")]
    InterfaceWithOverrides,
    #[error("empty body expected")]
    EmptyBodyExpected,
    #[error("not empty body expected")]
    NonEmptyBodyExpected,
    #[error("local variable names should not be prefixed with a module name")]
    LocalNameModulePrefixed,
    #[error("starting module has no entry point")]
    NoEntryPoint,
}

/// A fatal front-end diagnostic.
///
/// Carries the module and the `(line, pos)` at the point of detection.
/// Errors raised outside any module text (the entry-point check) have no
/// location and render without the trailing `module:line:column`.
#[derive(Clone, Debug, PartialEq)]
pub struct ParserError {
    pub kind: ParserErrorKind,
    pub module: Option<String>,
    pub location: Option<Location>,
}

impl ParserError {
    /// Returns an error pinned to a position inside `module`.
    pub fn new(kind: ParserErrorKind, module: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            module: Some(module.into()),
            location: Some(location),
        }
    }

    /// Returns an error with no source position.
    pub fn bare(kind: ParserErrorKind) -> Self {
        Self {
            kind,
            module: None,
            location: None,
        }
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error {}", self.kind)?;
        if let (Some(module), Some(location)) = (&self.module, &self.location) {
            write!(f, " {module}:{location}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParserError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_with_module_and_location() {
        let err = ParserError::new(ParserErrorKind::SyntaxError, "main", Location::new(4, 7));
        assert_eq!(err.to_string(), "error syntax error main:4:7");
    }

    #[test]
    fn renders_without_location() {
        let err = ParserError::bare(ParserErrorKind::NoEntryPoint);
        assert_eq!(err.to_string(), "error starting module has no entry point");
    }

    #[test]
    fn message_texts() {
        assert_eq!(
            ParserErrorKind::TabInWhitespace.to_string(),
            "tabs aren't allowed as white space"
        );
        assert_eq!(
            ParserErrorKind::ExpectedToken(";".into()).to_string(),
            "expected ';'"
        );
        assert_eq!(
            ParserErrorKind::DigitOutOfRadix { digit: 10, radix: 8 }.to_string(),
            "digit with value 10 is not allowed in 8-base number"
        );
    }
}
