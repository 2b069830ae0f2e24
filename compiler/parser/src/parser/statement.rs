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

//! Statements: expressions plus the local-binding form.

use super::expression::var_ref;
use super::ParserContext;

use vesper_ast::{Action, ActionKind, Block};
use vesper_errors::{ParserErrorKind, Result};

impl ParserContext<'_> {
    /// Parses `;`-separated statements until `}` or the end of input. A
    /// terminator right at a statement position contributes a `void`, so a
    /// block like `{ }` or a trailing `;` evaluates to void.
    pub(crate) fn parse_statement_sequence(&mut self, body: &mut Vec<Action>) -> Result<()> {
        loop {
            if self.byte(0) == b'}' || self.is_eof() {
                body.push(Action::new(self.loc(), ActionKind::ConstVoid));
                return Ok(());
            }
            body.push(self.parse_statement()?);
            if !self.eat(";")? {
                return Ok(());
            }
        }
    }

    /// An expression, or `name = expr;` introducing a local that scopes over
    /// the remaining statements of the sequence.
    pub(crate) fn parse_statement(&mut self) -> Result<Action> {
        let expr = self.parse_expression()?;
        if let ActionKind::Get { var: None, name, module } = &expr.kind {
            let (name, prefixed) = (name.clone(), module.is_some());
            if self.eat("=")? {
                if prefixed {
                    return Err(self.error(ParserErrorKind::LocalNameModulePrefixed));
                }
                let loc = expr.loc;
                let initializer = self.parse_expression()?;
                let binding = var_ref(name, loc, Some(initializer));
                self.expect(";")?;
                let mut body = Vec::new();
                self.parse_statement_sequence(&mut body)?;
                return Ok(Action::new(loc, ActionKind::Block(Block {
                    names: vec![binding],
                    body,
                })));
            }
        }
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_support::with_context;

    #[test]
    fn local_binding_scopes_over_the_rest_of_the_sequence() {
        let mut body = Vec::new();
        with_context("a = 1; b = a + 2; b", |p| {
            p.parse_statement_sequence(&mut body).unwrap()
        });
        assert_eq!(body.len(), 1);
        let ActionKind::Block(outer) = &body[0].kind else {
            panic!("expected outer binding block, got {:?}", body[0]);
        };
        assert_eq!(outer.names[0].borrow().name, "a");
        assert_eq!(
            outer.names[0].borrow().initializer.as_ref().unwrap().kind,
            ActionKind::ConstInt64(1)
        );
        assert_eq!(outer.body.len(), 1);
        let ActionKind::Block(inner) = &outer.body[0].kind else {
            panic!("expected inner binding block, got {:?}", outer.body[0]);
        };
        assert_eq!(inner.names[0].borrow().name, "b");
        assert!(matches!(
            inner.names[0].borrow().initializer.as_ref().unwrap().kind,
            ActionKind::Binary { .. }
        ));
        assert_eq!(inner.body.len(), 1);
        assert!(matches!(&inner.body[0].kind, ActionKind::Get { name, .. } if name == "b"));
    }

    #[test]
    fn empty_tail_contributes_void() {
        let mut body = Vec::new();
        with_context("1; ", |p| p.parse_statement_sequence(&mut body).unwrap());
        assert_eq!(body.len(), 2);
        assert_eq!(body[1].kind, ActionKind::ConstVoid);
    }

    #[test]
    fn module_prefixed_local_names_are_rejected() {
        let err = with_context("sys_x = 1; x", |p| {
            let mut body = Vec::new();
            p.parse_statement_sequence(&mut body).unwrap_err()
        });
        assert_eq!(err.kind, ParserErrorKind::LocalNameModulePrefixed);
    }

    #[test]
    fn plain_expressions_pass_through() {
        let action = with_context("f(1)", |p| p.parse_statement().unwrap());
        assert!(matches!(action.kind, ActionKind::Call { .. }));
    }
}
