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

use crate::{Action, Class, ClassRef, FnRef, Function, Var, VarRef};

use vesper_span::Location;

use indexmap::IndexMap;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A native function pointer exported to the generated code. `None` in
/// standalone compiler builds, where only the symbol names matter.
pub type NativeFn = Option<fn()>;

/// What an import alias can bind to.
#[derive(Clone, Debug)]
pub enum ClassOrFunction {
    Class(ClassRef),
    Function(FnRef),
}

/// One compilation unit: a named source text with its imports and
/// declarations.
#[derive(Debug)]
pub struct Module {
    pub name: String,
    /// Modules visible under their name as a `name_` prefix.
    pub direct_imports: IndexMap<String, ModuleRef>,
    /// Local names bound to entities of imported modules.
    pub aliases: IndexMap<String, ClassOrFunction>,
    pub classes: IndexMap<String, ClassRef>,
    pub functions: IndexMap<String, FnRef>,
    pub tests: IndexMap<String, FnRef>,
    pub constants: IndexMap<String, VarRef>,
    /// Holds the module's top-level statements; empty body if there are none.
    pub entry_point: FnRef,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            entry_point: Rc::new(RefCell::new(Function::new("", Location::default()))),
            name,
            direct_imports: IndexMap::new(),
            aliases: IndexMap::new(),
            classes: IndexMap::new(),
            functions: IndexMap::new(),
            tests: IndexMap::new(),
            constants: IndexMap::new(),
        }
    }
}

/// A shared handle to a [`Module`], compared by identity.
#[derive(Clone)]
pub struct ModuleRef(pub Rc<RefCell<Module>>);

impl ModuleRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(Module::new(name))))
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    /// Looks up a class by name, creating a forward-reference entity (with an
    /// undefined location) on first mention. The class table is the per-module
    /// arena that makes reopening and forward references work.
    pub fn get_class(&self, name: &str) -> ClassRef {
        let mut module = self.0.borrow_mut();
        if let Some(existing) = module.classes.get(name) {
            return existing.clone();
        }
        let class = ClassRef::new(Class::new(name));
        module.classes.insert(name.to_string(), class.clone());
        class
    }
}

impl PartialEq for ModuleRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ModuleRef {}

impl fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(module) => write!(f, "Module({})", module.name),
            Err(_) => f.write_str("Module(..)"),
        }
    }
}

/// The shared registry for one compilation unit.
///
/// Owns every module; `modules_in_order` records parse-completion order,
/// which is a post-order of the import graph.
#[derive(Debug)]
pub struct Ast {
    pub modules: IndexMap<String, ModuleRef>,
    pub modules_in_order: Vec<ModuleRef>,
    pub starting_module: Option<ModuleRef>,
    /// The built-in module, registered before any parsing happens.
    pub sys: ModuleRef,
    pub object: Option<ClassRef>,
    pub blob: Option<ClassRef>,
    pub str_builder: Option<ClassRef>,
    pub own_array: Option<ClassRef>,
    pub weak_array: Option<ClassRef>,
    pub string_cls: Option<ClassRef>,
    /// Runtime symbols exported to generated code, in registration order.
    pub platform_exports: IndexMap<String, NativeFn>,
}

impl Ast {
    /// Returns a registry containing only the empty `sys` module. Call
    /// [`crate::register_runtime_content`] to populate the built-ins.
    pub fn new() -> Self {
        let sys = ModuleRef::new("sys");
        let mut modules = IndexMap::new();
        modules.insert("sys".to_string(), sys.clone());
        Self {
            modules,
            modules_in_order: vec![sys.clone()],
            starting_module: None,
            sys,
            object: None,
            blob: None,
            str_builder: None,
            own_array: None,
            weak_array: None,
            string_cls: None,
            platform_exports: IndexMap::new(),
        }
    }

    /// Creates and registers a fresh module, wiring up the implicit `sys`
    /// import for everything but `sys` itself.
    pub fn add_module(&mut self, name: &str) -> ModuleRef {
        let module = ModuleRef::new(name);
        if name != "sys" {
            module
                .0
                .borrow_mut()
                .direct_imports
                .insert("sys".to_string(), self.sys.clone());
        }
        self.modules.insert(name.to_string(), module.clone());
        module
    }

    /// Creates (or returns) a class in the `sys` module.
    pub fn mk_class(&mut self, name: &str) -> ClassRef {
        self.sys.get_class(name)
    }

    /// Registers a platform free function in the `sys` module.
    pub fn mk_fn(&mut self, name: &str, result: Action, params: Vec<Action>) -> FnRef {
        let mut fun = Function::new(name, Location::default());
        for param in params {
            let mut var = Var::new("", param.loc);
            var.initializer = Some(param);
            fun.names.push(Rc::new(RefCell::new(var)));
        }
        fun.type_expression = result;
        fun.is_platform = true;
        let fun = Rc::new(RefCell::new(fun));
        self.sys
            .0
            .borrow_mut()
            .functions
            .insert(name.to_string(), fun.clone());
        fun
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}
