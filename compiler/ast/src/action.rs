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

use crate::{AbstractClass, DelegateRef, FnRef, ModuleRef, VarRef};

use vesper_span::Location;

use std::fmt;

/// An expression or statement node.
///
/// Statements are expressions in Vesper; the only statement-specific form is
/// the local binding, which the parser desugars into a [`ActionKind::Block`]
/// scoping the remainder of the statement sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    /// Position of the first token contributing to this node.
    pub loc: Location,
    pub kind: ActionKind,
}

impl Action {
    pub fn new(loc: Location, kind: ActionKind) -> Self {
        Self { loc, kind }
    }

    /// Wraps `operand` in a unary operation node at `loc`.
    pub fn unary(loc: Location, op: UnaryOperation, operand: Action) -> Self {
        Self::new(loc, ActionKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// Builds a binary operation node at `loc` with both operands in place.
    pub fn binary(loc: Location, op: BinaryOperation, left: Action, right: Action) -> Self {
        Self::new(loc, ActionKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// A read of `var`, used for parser-synthesized accesses to hoisted
    /// locals and the `this` parameter.
    pub fn get_var(loc: Location, var: &VarRef) -> Self {
        let name = var.borrow().name.clone();
        Self::new(loc, ActionKind::Get {
            var: Some(var.clone()),
            name,
            module: None,
        })
    }
}

/// A sequence of statements with the locals it scopes.
///
/// Also the payload of [`ActionKind::MkLambda`], where `names` are the lambda
/// parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    pub names: Vec<VarRef>,
    pub body: Vec<Action>,
}

/// The closed family of AST node kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionKind {
    ConstInt64(i64),
    ConstDouble(f64),
    ConstBool(bool),
    ConstVoid,
    ConstString(String),
    /// A read of a named variable. `var` is populated for parser-synthesized
    /// reads; user-written names are left for the resolution pass.
    Get {
        var: Option<VarRef>,
        name: String,
        module: Option<ModuleRef>,
    },
    /// An assignment to a named variable.
    Set {
        var: Option<VarRef>,
        name: String,
        module: Option<ModuleRef>,
        value: Box<Action>,
    },
    GetField {
        base: Box<Action>,
        name: String,
        module: Option<ModuleRef>,
    },
    SetField {
        base: Box<Action>,
        name: String,
        module: Option<ModuleRef>,
        value: Box<Action>,
    },
    /// In-place replacement of an owned field value, `base.f @= v`.
    SpliceField {
        base: Box<Action>,
        name: String,
        module: Option<ModuleRef>,
        value: Box<Action>,
    },
    GetAtIndex {
        indexed: Box<Action>,
        indexes: Vec<Action>,
    },
    SetAtIndex {
        indexed: Box<Action>,
        indexes: Vec<Action>,
        value: Box<Action>,
    },
    Call {
        callee: Box<Action>,
        params: Vec<Action>,
    },
    Block(Block),
    /// `condition ? body`; evaluates to an absent optional when the condition
    /// does not hold.
    If {
        condition: Box<Action>,
        body: Box<Action>,
    },
    /// `left : right`: the fallback arm of an optional chain.
    Else {
        left: Box<Action>,
        right: Box<Action>,
    },
    LAnd {
        left: Box<Action>,
        right: Box<Action>,
    },
    LOr {
        left: Box<Action>,
        right: Box<Action>,
    },
    Loop(Box<Action>),
    MkLambda(Block),
    /// An instantiation of a class, also the carrier of class references in
    /// type expressions. `cls` is `None` for delegate `this` parameters until
    /// the resolution pass patches them.
    MkInstance { cls: Option<AbstractClass> },
    Unary {
        op: UnaryOperation,
        operand: Box<Action>,
    },
    Binary {
        op: BinaryOperation,
        left: Box<Action>,
        right: Box<Action>,
    },
    /// `value ~ target`: a checked downcast.
    Cast {
        value: Box<Action>,
        target: Box<Action>,
    },
    /// A function type, `fn(params) result`.
    Function(FnRef),
    /// An immediate delegate, either a delegate type `&(params) result` or a
    /// `.&name` expression bound to a receiver.
    Delegate(DelegateRef),
}

/// Unary operations, including the pointer-kind constructors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOperation {
    Neg,
    Not,
    ToInt,
    ToFloat,
    /// `*x`: a frozen shared reference.
    Freeze,
    /// `+x` in type position: a conforming reference.
    Conform,
    /// `&x`: a weak reference.
    MkWeak,
    /// `@x`: a deep copy into an own reference.
    Copy,
    /// A plain (pinned) reference to a class instance.
    Ref,
}

impl UnaryOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "!",
            Self::ToInt => "int",
            Self::ToFloat => "double",
            Self::Freeze => "*",
            Self::Conform => "+",
            Self::MkWeak => "&",
            Self::Copy => "@",
            Self::Ref => "ref",
        }
    }
}

impl fmt::Display for UnaryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary operations. Comparison syntax is desugared onto `Eq` and `Lt` with
/// [`UnaryOperation::Not`] and operand swaps, so no other relational kinds
/// exist in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOperation {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    And,
    Or,
    Xor,
    Eq,
    Lt,
}

impl BinaryOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::Eq => "==",
            Self::Lt => "<",
        }
    }
}

impl fmt::Display for BinaryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
