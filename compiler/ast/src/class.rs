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

use crate::{Action, Method};

use vesper_span::Location;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A class or interface.
///
/// The registry hands out one entity per name; a later `class C { ... }` for a
/// name that already exists reopens the same entity and appends to it.
/// `loc.line == 0` until the first defining occurrence.
#[derive(Debug)]
pub struct Class {
    pub name: String,
    /// Type parameters; only the first defining occurrence may declare them.
    pub params: Vec<ClassParamRef>,
    pub fields: Vec<Field>,
    pub new_methods: Vec<Method>,
    /// Overrides grouped per base class, keyed by entity identity. An entry
    /// with an empty method list records plain conformance (`+Base;`).
    pub overloads: Vec<(ClassRef, Vec<Method>)>,
    pub is_interface: bool,
    pub is_test: bool,
    pub loc: Location,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            fields: Vec::new(),
            new_methods: Vec::new(),
            overloads: Vec::new(),
            is_interface: false,
            is_test: false,
            loc: Location::default(),
        }
    }

    /// Returns the override list for `base`, creating the conformance entry
    /// on first mention.
    pub fn overloads_entry(&mut self, base: &ClassRef) -> &mut Vec<Method> {
        let index = match self.overloads.iter().position(|(b, _)| b == base) {
            Some(index) => index,
            None => {
                self.overloads.push((base.clone(), Vec::new()));
                self.overloads.len() - 1
            }
        };
        &mut self.overloads[index].1
    }
}

/// A shared handle to a [`Class`], compared by identity.
#[derive(Clone)]
pub struct ClassRef(pub Rc<RefCell<Class>>);

impl ClassRef {
    pub fn new(class: Class) -> Self {
        Self(Rc::new(RefCell::new(class)))
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ClassRef {}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(class) => write!(f, "Class({})", class.name),
            Err(_) => f.write_str("Class(..)"),
        }
    }
}

/// A class type parameter with its variance.
///
/// Both flags set means invariant; `is_out == false` means contravariant
/// (`>` marker), `is_in == false` means covariant (`<` marker).
#[derive(Debug)]
pub struct ClassParam {
    pub name: String,
    pub base: ClassRef,
    pub is_in: bool,
    pub is_out: bool,
    pub loc: Location,
}

/// A shared handle to a [`ClassParam`], compared by identity.
#[derive(Clone)]
pub struct ClassParamRef(pub Rc<RefCell<ClassParam>>);

impl ClassParamRef {
    pub fn new(param: ClassParam) -> Self {
        Self(Rc::new(RefCell::new(param)))
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }
}

impl PartialEq for ClassParamRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ClassParamRef {}

impl fmt::Debug for ClassParamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(param) => write!(f, "ClassParam({})", param.name),
            Err(_) => f.write_str("ClassParam(..)"),
        }
    }
}

/// Either a class or one of the current class's type parameters: the two
/// things a name in type position can instantiate.
#[derive(Clone, Debug, PartialEq)]
pub enum AbstractClass {
    Class(ClassRef),
    Param(ClassParamRef),
}

impl From<&ClassRef> for AbstractClass {
    fn from(class: &ClassRef) -> Self {
        Self::Class(class.clone())
    }
}

impl From<&ClassParamRef> for AbstractClass {
    fn from(param: &ClassParamRef) -> Self {
        Self::Param(param.clone())
    }
}

/// A field with the initializer that also encodes its declared type.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub initializer: Action,
    pub loc: Location,
}
