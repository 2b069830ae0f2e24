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

use crate::{AbstractClass, Action, ActionKind};

use vesper_span::Location;

use std::cell::RefCell;
use std::rc::Rc;

/// Method mutability, as declared by the member marker.
///
/// `*` marks a mutating method, `-` a method callable on any receiver, and
/// no marker an immutable one.
#[repr(i8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mut {
    Mutating = -1,
    Any = 0,
    Immutable = 1,
}

/// A local, parameter, or constant.
#[derive(Clone, Debug, PartialEq)]
pub struct Var {
    /// Empty for unnamed parameters in type positions and hoisted locals.
    pub name: String,
    /// For parameters this is the declared type expression; for locals and
    /// constants the initializing expression.
    pub initializer: Option<Action>,
    pub is_const: bool,
    pub loc: Location,
}

impl Var {
    pub fn new(name: impl Into<String>, loc: Location) -> Self {
        Self {
            name: name.into(),
            initializer: None,
            is_const: false,
            loc,
        }
    }
}

pub type VarRef = Rc<RefCell<Var>>;

/// A function, also the payload shared by methods and delegates.
#[derive(Debug, PartialEq)]
pub struct Function {
    pub name: String,
    /// Parameters in source order. Index 0 is the synthetic `this` for
    /// methods and delegates.
    pub names: Vec<VarRef>,
    /// The return type expression, or the factory's `this` read.
    pub type_expression: Action,
    pub body: Vec<Action>,
    /// Declared with a trailing `;`; the body is supplied by the host.
    pub is_platform: bool,
    pub is_test: bool,
    /// Declared to return `this`; the body yields the receiver.
    pub is_factory: bool,
    pub loc: Location,
}

impl Function {
    pub fn new(name: impl Into<String>, loc: Location) -> Self {
        Self {
            name: name.into(),
            names: Vec::new(),
            type_expression: Action::new(loc, ActionKind::ConstVoid),
            body: Vec::new(),
            is_platform: false,
            is_test: false,
            is_factory: false,
            loc,
        }
    }

    /// Appends the synthetic `this` parameter; callers invoke this before
    /// any other parameter is added so it lands at index 0. `cls` is `None`
    /// for delegates, whose receiver class is patched during resolution.
    pub fn add_this_param(&mut self, cls: Option<AbstractClass>) {
        let loc = self.loc;
        let initializer = Action::new(loc, ActionKind::MkInstance { cls });
        let mut this_param = Var::new("this", loc);
        this_param.initializer = Some(initializer);
        self.names.push(Rc::new(RefCell::new(this_param)));
    }
}

pub type FnRef = Rc<RefCell<Function>>;

/// A method: a function plus receiver mutability and override bookkeeping.
#[derive(Debug)]
pub struct Method {
    pub fun: Function,
    pub mut_: Mut,
    /// Name of the module qualifying an override's method name; `None` for
    /// an unqualified override, the declaring module's name for new methods.
    pub base_module: Option<String>,
}

/// A function value bound to a receiver expression at its use site, or a
/// delegate type when `base` is `None`.
#[derive(Debug, PartialEq)]
pub struct ImmediateDelegate {
    pub fun: Function,
    pub base: Option<Action>,
}

pub type DelegateRef = Rc<RefCell<ImmediateDelegate>>;
