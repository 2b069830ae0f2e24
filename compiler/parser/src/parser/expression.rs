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

//! The expression precedence cascade.
//!
//! Lowest to highest: elses, ifs, ors, comparisons, adds, muls, unary.
//! Comparisons are desugared onto `Eq`/`Lt` with `Not` and operand swaps, so
//! the tree carries only those two relational kinds. The unary level is
//! split into the postfix loop (calls, indexing, field access, assignment
//! forms, casts) and the head (literals, prefix sigils, blocks, lambdas).

use super::{FnKind, ParserContext};
use crate::lexer::Number;

use vesper_ast::{
    Action, ActionKind, BinaryOperation, Block, Function, ImmediateDelegate, ModuleRef,
    UnaryOperation, Var, VarRef,
};
use vesper_errors::{ParserErrorKind, Result};
use vesper_span::Location;

use std::cell::RefCell;
use std::rc::Rc;

/// A fresh local for desugared blocks; unnamed when hoisting subexpressions.
pub(crate) fn var_ref(name: impl Into<String>, loc: Location, initializer: Option<Action>) -> VarRef {
    Rc::new(RefCell::new(Var {
        name: name.into(),
        initializer,
        is_const: false,
        loc,
    }))
}

impl ParserContext<'_> {
    pub(crate) fn parse_expression(&mut self) -> Result<Action> {
        self.parse_else_expression()
    }

    /// A left-associative fallback chain: `a : b : c`.
    fn parse_else_expression(&mut self) -> Result<Action> {
        let mut expr = self.parse_if_expression()?;
        while self.eat(":")? {
            let right = self.parse_if_expression()?;
            expr = Action::new(expr.loc, ActionKind::Else {
                left: Box::new(expr),
                right: Box::new(right),
            });
        }
        Ok(expr)
    }

    /// `c && rhs` and `c ? rhs`, right-associative. The right-hand side is a
    /// block declaring one local (named by an optional `= ident`, `_`
    /// otherwise) that the resolution pass binds to the condition's value.
    fn parse_if_expression(&mut self) -> Result<Action> {
        let expr = self.parse_or_expression()?;
        let is_and = self.eat("&&")?;
        if is_and || self.eat("?")? {
            let loc = expr.loc;
            let rhs_loc = self.loc();
            let name = if self.eat("=")? {
                self.expect_id("local name")?
            } else {
                "_".to_string()
            };
            let binding = var_ref(name, rhs_loc, None);
            let body = self.parse_if_expression()?;
            let rhs = Action::new(rhs_loc, ActionKind::Block(Block {
                names: vec![binding],
                body: vec![body],
            }));
            let kind = if is_and {
                ActionKind::LAnd {
                    left: Box::new(expr),
                    right: Box::new(rhs),
                }
            } else {
                ActionKind::If {
                    condition: Box::new(expr),
                    body: Box::new(rhs),
                }
            };
            return Ok(Action::new(loc, kind));
        }
        Ok(expr)
    }

    fn parse_or_expression(&mut self) -> Result<Action> {
        let mut expr = self.parse_comparison_expression()?;
        while self.eat("||")? {
            let right = self.parse_comparison_expression()?;
            expr = Action::new(expr.loc, ActionKind::LOr {
                left: Box::new(expr),
                right: Box::new(right),
            });
        }
        Ok(expr)
    }

    /// Non-chaining comparisons. Only `Eq` and `Lt` exist in the tree; the
    /// other four are `Not` wrappings and operand swaps.
    fn parse_comparison_expression(&mut self) -> Result<Action> {
        let expr = self.parse_additive_expression()?;
        let loc = expr.loc;
        if self.eat("==")? {
            let right = self.parse_additive_expression()?;
            return Ok(Action::binary(loc, BinaryOperation::Eq, expr, right));
        }
        if self.eat(">=")? {
            let right = self.parse_additive_expression()?;
            let lt = Action::binary(loc, BinaryOperation::Lt, expr, right);
            return Ok(Action::unary(loc, UnaryOperation::Not, lt));
        }
        if self.eat("<=")? {
            let right = self.parse_additive_expression()?;
            let lt = Action::binary(loc, BinaryOperation::Lt, right, expr);
            return Ok(Action::unary(loc, UnaryOperation::Not, lt));
        }
        if self.eat("<")? {
            let right = self.parse_additive_expression()?;
            return Ok(Action::binary(loc, BinaryOperation::Lt, expr, right));
        }
        if self.eat(">")? {
            let right = self.parse_additive_expression()?;
            return Ok(Action::binary(loc, BinaryOperation::Lt, right, expr));
        }
        if self.eat("!=")? {
            let right = self.parse_additive_expression()?;
            let eq = Action::binary(loc, BinaryOperation::Eq, expr, right);
            return Ok(Action::unary(loc, UnaryOperation::Not, eq));
        }
        Ok(expr)
    }

    fn parse_additive_expression(&mut self) -> Result<Action> {
        let mut expr = self.parse_multiplicative_expression()?;
        loop {
            let op = if self.eat("+")? {
                BinaryOperation::Add
            } else if self.eat("-")? {
                BinaryOperation::Sub
            } else {
                return Ok(expr);
            };
            let right = self.parse_multiplicative_expression()?;
            expr = Action::binary(expr.loc, op, expr, right);
        }
    }

    /// The mul level also hosts shifts and single-character `&`/`|`/`^`; the
    /// doubled sigils belong to the and/or levels, hence the lookahead.
    fn parse_multiplicative_expression(&mut self) -> Result<Action> {
        let mut expr = self.parse_postfix_expression()?;
        loop {
            let op = if self.eat("*")? {
                BinaryOperation::Mul
            } else if self.eat("/")? {
                BinaryOperation::Div
            } else if self.eat("%")? {
                BinaryOperation::Mod
            } else if self.eat("<<")? {
                BinaryOperation::Shl
            } else if self.eat(">>")? {
                BinaryOperation::Shr
            } else if self.eat_not_followed_by("&", b'&')? {
                BinaryOperation::And
            } else if self.eat_not_followed_by("|", b'|')? {
                BinaryOperation::Or
            } else if self.eat("^")? {
                BinaryOperation::Xor
            } else {
                return Ok(expr);
            };
            let right = self.parse_postfix_expression()?;
            expr = Action::binary(expr.loc, op, expr, right);
        }
    }

    fn eat_assign_op(&mut self) -> Result<Option<BinaryOperation>> {
        const ASSIGN_OPS: &[(&str, BinaryOperation)] = &[
            ("+=", BinaryOperation::Add),
            ("-=", BinaryOperation::Sub),
            ("*=", BinaryOperation::Mul),
            ("/=", BinaryOperation::Div),
            ("%=", BinaryOperation::Mod),
            ("<<=", BinaryOperation::Shl),
            (">>=", BinaryOperation::Shr),
            ("&=", BinaryOperation::And),
            ("|=", BinaryOperation::Or),
            ("^=", BinaryOperation::Xor),
        ];
        for (token, op) in ASSIGN_OPS {
            if self.eat(token)? {
                return Ok(Some(*op));
            }
        }
        Ok(None)
    }

    /// Rewrites an assignment target into a `Set`; only variable reads
    /// qualify.
    fn make_set_op(&mut self, assignee: Action, value: Action) -> Result<Action> {
        match assignee.kind {
            ActionKind::Get { var, name, module } => {
                Ok(Action::new(assignee.loc, ActionKind::Set {
                    var,
                    name,
                    module,
                    value: Box::new(value),
                }))
            }
            _ => Err(self.error(ParserErrorKind::AssignTargetNotVariable)),
        }
    }

    /// `base[i, ...] op= v`, hoisting the base and every index into locals so
    /// each is evaluated exactly once by the read-modify-write.
    fn desugar_indexed_compound(
        &mut self,
        loc: Location,
        base: Action,
        indexes: Vec<Action>,
        op: BinaryOperation,
    ) -> Result<Action> {
        let base_var = var_ref("", base.loc, Some(base));
        let mut names = vec![base_var.clone()];
        let mut index_reads = Vec::with_capacity(indexes.len());
        for index in indexes {
            let index_loc = index.loc;
            let index_var = var_ref("", index_loc, Some(index));
            index_reads.push(Action::get_var(index_loc, &index_var));
            names.push(index_var);
        }
        let read = Action::new(loc, ActionKind::GetAtIndex {
            indexed: Box::new(Action::get_var(loc, &base_var)),
            indexes: index_reads.clone(),
        });
        let right = self.parse_expression()?;
        let value = Action::binary(loc, op, read, right);
        let write = Action::new(loc, ActionKind::SetAtIndex {
            indexed: Box::new(Action::get_var(loc, &base_var)),
            indexes: index_reads,
            value: Box::new(value),
        });
        Ok(Action::new(loc, ActionKind::Block(Block {
            names,
            body: vec![write],
        })))
    }

    /// `base.f op= v`, hoisting the base into a local reused by the read and
    /// the write.
    fn desugar_field_compound(
        &mut self,
        loc: Location,
        base: Action,
        name: String,
        module: Option<ModuleRef>,
        op: BinaryOperation,
    ) -> Result<Action> {
        let base_var = var_ref("", base.loc, Some(base));
        let read = Action::new(loc, ActionKind::GetField {
            base: Box::new(Action::get_var(loc, &base_var)),
            name: name.clone(),
            module: module.clone(),
        });
        let right = self.parse_expression()?;
        let value = Action::binary(loc, op, read, right);
        let write = Action::new(loc, ActionKind::SetField {
            base: Box::new(Action::get_var(loc, &base_var)),
            name,
            module,
            value: Box::new(value),
        });
        Ok(Action::new(loc, ActionKind::Block(Block {
            names: vec![base_var],
            body: vec![write],
        })))
    }

    /// `.&name <fn-def>`: an inline function bound to the receiver.
    fn parse_immediate_delegate(&mut self, base: Action) -> Result<Action> {
        let loc = self.loc();
        let name = self.expect_id("delegate name")?;
        if let Some(previous) = self.delegates.get(&name) {
            return Err(self.error(ParserErrorKind::DuplicateDelegate {
                name,
                previous: *previous,
            }));
        }
        self.delegates.insert(name.clone(), loc);
        let mut fun = Function::new(name, loc);
        // The receiver class is unknown here; resolution patches `this`.
        fun.add_this_param(None);
        self.parse_fn_def(&mut fun, FnKind::Delegate)?;
        let delegate = Rc::new(RefCell::new(ImmediateDelegate {
            fun,
            base: Some(base),
        }));
        Ok(Action::new(loc, ActionKind::Delegate(delegate)))
    }

    /// The postfix loop: calls, indexing, field access and the assignment
    /// forms on each, immediate delegates, and casts.
    pub(crate) fn parse_postfix_expression(&mut self) -> Result<Action> {
        let mut expr = self.parse_primary_expression()?;
        loop {
            if self.eat("(")? {
                let mut params = Vec::new();
                while !self.eat(")")? {
                    params.push(self.parse_expression()?);
                    if self.eat(")")? {
                        break;
                    }
                    self.expect(",")?;
                }
                expr = Action::new(expr.loc, ActionKind::Call {
                    callee: Box::new(expr),
                    params,
                });
            } else if self.eat("[")? {
                let loc = self.loc();
                let mut indexes = Vec::new();
                loop {
                    indexes.push(self.parse_expression()?);
                    if !self.eat(",")? {
                        break;
                    }
                }
                self.expect("]")?;
                if let Some(op) = self.eat_assign_op()? {
                    expr = self.desugar_indexed_compound(loc, expr, indexes, op)?;
                } else if self.eat(":=")? {
                    let value = self.parse_expression()?;
                    expr = Action::new(loc, ActionKind::SetAtIndex {
                        indexed: Box::new(expr),
                        indexes,
                        value: Box::new(value),
                    });
                } else {
                    expr = Action::new(loc, ActionKind::GetAtIndex {
                        indexed: Box::new(expr),
                        indexes,
                    });
                }
            } else if self.eat(".")? {
                if self.eat("&")? {
                    expr = self.parse_immediate_delegate(expr)?;
                } else {
                    let loc = self.loc();
                    let long_name = self.expect_long_name("field name")?;
                    let (name, module) = (long_name.name, long_name.module);
                    if let Some(op) = self.eat_assign_op()? {
                        expr = self.desugar_field_compound(loc, expr, name, module, op)?;
                    } else if self.eat(":=")? {
                        let value = self.parse_expression()?;
                        expr = Action::new(loc, ActionKind::SetField {
                            base: Box::new(expr),
                            name,
                            module,
                            value: Box::new(value),
                        });
                    } else if self.eat("@=")? {
                        let value = self.parse_expression()?;
                        expr = Action::new(loc, ActionKind::SpliceField {
                            base: Box::new(expr),
                            name,
                            module,
                            value: Box::new(value),
                        });
                    } else {
                        expr = Action::new(loc, ActionKind::GetField {
                            base: Box::new(expr),
                            name,
                            module,
                        });
                    }
                }
            } else if self.eat(":=")? {
                let value = self.parse_expression()?;
                expr = self.make_set_op(expr, value)?;
            } else if let Some(op) = self.eat_assign_op()? {
                let loc = expr.loc;
                let right = self.parse_expression()?;
                let value = Action::binary(loc, op, expr.clone(), right);
                expr = self.make_set_op(expr, value)?;
            } else if self.eat("~")? {
                let target = self.parse_primary_expression()?;
                expr = Action::new(expr.loc, ActionKind::Cast {
                    value: Box::new(expr),
                    target: Box::new(target),
                });
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_parenthesized_expression(&mut self) -> Result<Action> {
        self.expect("(")?;
        let expr = self.parse_expression()?;
        self.expect(")")?;
        Ok(expr)
    }

    /// After `(`: either a parenthesized expression or a lambda. The form is
    /// decided by the token after `)`: a `{` tips it to a lambda, in which
    /// case the initial expression must be a bare name and becomes the first
    /// parameter.
    fn parse_parenthesized_or_lambda(&mut self, loc: Location) -> Result<Action> {
        let mut start_expr = None;
        let mut names: Vec<VarRef> = Vec::new();
        if !self.eat(")")? {
            start_expr = Some(self.parse_expression()?);
            while !self.eat(")")? {
                self.expect(",")?;
                let param_loc = self.loc();
                let param = self.expect_id("parameter")?;
                names.push(var_ref(param, param_loc, None));
            }
        }
        if self.eat("{")? {
            if let Some(first) = start_expr {
                match first.kind {
                    ActionKind::Get { name, .. } => {
                        names.insert(0, var_ref(name, first.loc, None));
                    }
                    _ => {
                        return Err(
                            self.error_at(ParserErrorKind::LambdaParameterName, first.loc)
                        );
                    }
                }
            }
            let mut body = Vec::new();
            self.parse_statement_sequence(&mut body)?;
            self.expect("}")?;
            return Ok(Action::new(loc, ActionKind::MkLambda(Block { names, body })));
        }
        if names.is_empty() {
            if let Some(expr) = start_expr {
                return Ok(expr);
            }
        }
        Err(self.error_at(ParserErrorKind::MalformedParenthesized, loc))
    }

    /// The unary head: literals, prefix sigils, conversions, blocks, and
    /// names.
    pub(crate) fn parse_primary_expression(&mut self) -> Result<Action> {
        let loc = self.loc();
        if self.eat("(")? {
            return self.parse_parenthesized_or_lambda(loc);
        }
        if self.eat("*")? {
            let operand = self.parse_postfix_expression()?;
            return Ok(Action::unary(loc, UnaryOperation::Freeze, operand));
        }
        if self.eat("@")? {
            let operand = self.parse_postfix_expression()?;
            return Ok(Action::unary(loc, UnaryOperation::Copy, operand));
        }
        if self.eat("&")? {
            let operand = self.parse_postfix_expression()?;
            return Ok(Action::unary(loc, UnaryOperation::MkWeak, operand));
        }
        if self.eat("!")? {
            let operand = self.parse_postfix_expression()?;
            return Ok(Action::unary(loc, UnaryOperation::Not, operand));
        }
        if self.eat("-")? {
            let operand = self.parse_postfix_expression()?;
            return Ok(Action::unary(loc, UnaryOperation::Neg, operand));
        }
        if self.eat("~")? {
            let operand = self.parse_postfix_expression()?;
            let all_ones = Action::new(loc, ActionKind::ConstInt64(-1));
            return Ok(Action::binary(loc, BinaryOperation::Xor, operand, all_ones));
        }
        if let Some(number) = self.eat_number()? {
            return Ok(match number {
                Number::Int(value) => Action::new(loc, ActionKind::ConstInt64(value as i64)),
                Number::Double(value) => Action::new(loc, ActionKind::ConstDouble(value)),
            });
        }
        if self.eat("{")? {
            let mut body = Vec::new();
            self.parse_statement_sequence(&mut body)?;
            self.expect("}")?;
            return Ok(Action::new(loc, ActionKind::Block(Block {
                names: Vec::new(),
                body,
            })));
        }
        // `+expr` is an always-taken conditional and `?expr` a never-taken
        // one: the present and absent optional forms.
        let matched_true = self.eat("+")?;
        if matched_true || self.eat("?")? {
            let condition = Action::new(loc, ActionKind::ConstBool(matched_true));
            let body = self.parse_postfix_expression()?;
            return Ok(Action::new(loc, ActionKind::If {
                condition: Box::new(condition),
                body: Box::new(body),
            }));
        }
        let matched_true = self.eat("true")?;
        if matched_true || self.eat("false")? {
            return Ok(Action::new(loc, ActionKind::ConstBool(matched_true)));
        }
        if self.eat("void")? {
            return Ok(Action::new(loc, ActionKind::ConstVoid));
        }
        if self.eat("int")? {
            let operand = self.parse_parenthesized_expression()?;
            return Ok(Action::unary(loc, UnaryOperation::ToInt, operand));
        }
        if self.eat("double")? {
            let operand = self.parse_parenthesized_expression()?;
            return Ok(Action::unary(loc, UnaryOperation::ToFloat, operand));
        }
        if self.eat("loop")? {
            let body = self.parse_postfix_expression()?;
            return Ok(Action::new(loc, ActionKind::Loop(Box::new(body))));
        }
        if self.eat("_")? {
            return Ok(Action::new(loc, ActionKind::Get {
                var: None,
                name: "_".to_string(),
                module: None,
            }));
        }
        if self.eat_ns("'") {
            let value = self.scan_char_literal()?;
            self.expect("'")?;
            return Ok(Action::new(loc, ActionKind::ConstInt64(value)));
        }
        if self.eat_ns("\"") {
            let value = self.scan_string_literal()?;
            return Ok(Action::new(loc, ActionKind::ConstString(value)));
        }
        if self.at_id() {
            return self.mk_get("name");
        }
        Err(self.error(ParserErrorKind::SyntaxError))
    }
}
