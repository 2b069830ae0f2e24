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

//! The type-expression grammar.
//!
//! Types are encoded in the expression algebra: primitive markers are
//! constant nodes, pointer kinds are the same unary operations the
//! expression grammar uses, optionals are never-taken `If`s, and function,
//! lambda, and delegate types are the corresponding callable nodes with
//! unnamed, type-only parameters.

use super::expression::var_ref;
use super::ParserContext;

use vesper_ast::{
    Action, ActionKind, Block, Function, ImmediateDelegate, UnaryOperation, VarRef,
};
use vesper_errors::{ParserErrorKind, Result};

use std::cell::RefCell;
use std::rc::Rc;

impl ParserContext<'_> {
    /// Parses one type expression; see the sigil table in the module docs of
    /// [`crate::parser`].
    pub(crate) fn parse_type(&mut self) -> Result<Action> {
        let loc = self.loc();
        if self.eat("~")? {
            // Type-of: an arbitrary expression stands in for the type.
            return self.parse_expression();
        }
        if self.eat("int")? {
            return Ok(Action::new(loc, ActionKind::ConstInt64(0)));
        }
        if self.eat("double")? {
            return Ok(Action::new(loc, ActionKind::ConstDouble(0.0)));
        }
        if self.eat("bool")? {
            return Ok(Action::new(loc, ActionKind::ConstBool(false)));
        }
        if self.eat("void")? {
            return Ok(Action::new(loc, ActionKind::ConstVoid));
        }
        if self.eat("?")? {
            let condition = Action::new(loc, ActionKind::ConstBool(false));
            let inner = self.parse_type()?;
            return Ok(Action::new(loc, ActionKind::If {
                condition: Box::new(condition),
                body: Box::new(inner),
            }));
        }
        if self.eat("&")? {
            if self.eat("*")? {
                let target = self.mk_get("class or interface name")?;
                let conform = Action::unary(loc, UnaryOperation::Conform, target);
                return Ok(Action::unary(loc, UnaryOperation::MkWeak, conform));
            }
            if self.eat("+")? {
                let target = self.mk_get("class or interface name")?;
                let frozen = Action::unary(loc, UnaryOperation::Freeze, target);
                return Ok(Action::unary(loc, UnaryOperation::MkWeak, frozen));
            }
            if self.eat("(")? {
                let mut fun = Function::new("", loc);
                // The receiver class is patched at type resolution.
                fun.add_this_param(None);
                self.parse_type_parameters(&mut fun.names)?;
                fun.type_expression = self.parse_type()?;
                let delegate = Rc::new(RefCell::new(ImmediateDelegate { fun, base: None }));
                return Ok(Action::new(loc, ActionKind::Delegate(delegate)));
            }
            let target = self.mk_get("class or interface name")?;
            return Ok(Action::unary(loc, UnaryOperation::MkWeak, target));
        }
        if self.eat("+")? {
            let target = self.mk_get("class or interface name")?;
            return Ok(Action::unary(loc, UnaryOperation::Conform, target));
        }
        if self.eat("*")? {
            let target = self.mk_get("class or interface name")?;
            return Ok(Action::unary(loc, UnaryOperation::Freeze, target));
        }
        if self.eat("@")? {
            return self.mk_get("class or interface name");
        }
        if self.eat("fn")? {
            self.expect("(")?;
            let mut fun = Function::new("", loc);
            self.parse_type_parameters(&mut fun.names)?;
            fun.type_expression = self.parse_type()?;
            return Ok(Action::new(loc, ActionKind::Function(Rc::new(RefCell::new(fun)))));
        }
        if self.eat("(")? {
            let mut names = Vec::new();
            self.parse_type_parameters(&mut names)?;
            let result = self.parse_type()?;
            return Ok(Action::new(loc, ActionKind::MkLambda(Block {
                names,
                body: vec![result],
            })));
        }
        if self.at_id() {
            let target = self.mk_get("class or interface name")?;
            return Ok(Action::unary(loc, UnaryOperation::Ref, target));
        }
        Err(self.error(ParserErrorKind::ExpectedType))
    }

    /// Parses `type, type, ...)`: the unnamed parameters of function,
    /// lambda, and delegate types. The opening parenthesis is already
    /// consumed.
    fn parse_type_parameters(&mut self, names: &mut Vec<VarRef>) -> Result<()> {
        if self.eat(")")? {
            return Ok(());
        }
        loop {
            let loc = self.loc();
            let parameter_type = self.parse_type()?;
            names.push(var_ref("", loc, Some(parameter_type)));
            if self.eat(")")? {
                return Ok(());
            }
            self.expect(",")?;
        }
    }
}
