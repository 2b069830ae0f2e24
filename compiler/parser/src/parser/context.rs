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

use crate::lexer::is_id_head;
use crate::parser::ModuleTextProvider;

use vesper_ast::{
    AbstractClass, Action, ActionKind, Ast, ClassOrFunction, ClassRef, ModuleRef,
};
use vesper_errors::{ParserError, ParserErrorKind, Result};
use vesper_span::Location;

use indexmap::IndexMap;

/// One parser instance per module text.
///
/// The registry, the in-flight dependency path, and the text provider are
/// shared with recursive parses triggered by `using`. The scanner state
/// (`cur`, `line`, `pos`) is local to this module's text.
pub struct ParserContext<'a> {
    pub(crate) ast: &'a mut Ast,
    pub(crate) provider: &'a mut dyn ModuleTextProvider,
    pub(crate) dep_path: &'a mut Vec<String>,
    pub(crate) module: ModuleRef,
    pub(crate) module_name: String,
    pub(crate) text: String,
    /// Byte cursor into `text`.
    pub(crate) cur: usize,
    /// 1-based line of the cursor.
    pub(crate) line: u32,
    /// 1-based column of the cursor.
    pub(crate) pos: u32,
    /// Set while a class body is parsed, to resolve its type parameters.
    pub(crate) current_class: Option<ClassRef>,
    /// Immediate-delegate names seen by this parser instance.
    pub(crate) delegates: IndexMap<String, Location>,
}

/// An identifier optionally qualified by a module-alias prefix, `mod_name`.
pub(crate) struct LongName {
    pub name: String,
    pub module: Option<ModuleRef>,
}

impl<'a> ParserContext<'a> {
    pub(crate) fn new(
        ast: &'a mut Ast,
        module: ModuleRef,
        text: String,
        provider: &'a mut dyn ModuleTextProvider,
        dep_path: &'a mut Vec<String>,
    ) -> Self {
        let module_name = module.name();
        Self {
            ast,
            provider,
            dep_path,
            module,
            module_name,
            text,
            cur: 0,
            line: 1,
            pos: 1,
            current_class: None,
            delegates: IndexMap::new(),
        }
    }

    /// The current scanner position.
    pub(crate) fn loc(&self) -> Location {
        Location::new(self.line, self.pos)
    }

    /// A fatal diagnostic at the current position.
    pub(crate) fn error(&self, kind: ParserErrorKind) -> ParserError {
        ParserError::new(kind, self.module_name.clone(), self.loc())
    }

    /// A fatal diagnostic at an explicit position.
    pub(crate) fn error_at(&self, kind: ParserErrorKind, loc: Location) -> ParserError {
        ParserError::new(kind, self.module_name.clone(), loc)
    }

    /// Reads `id` or `prefix_id`. A prefix must name a direct import; the
    /// current module's own name may not be used as a prefix.
    pub(crate) fn expect_long_name(&mut self, what: &'static str) -> Result<LongName> {
        let id = self.expect_id(what)?;
        if !self.eat("_")? {
            return Ok(LongName {
                name: id,
                module: None,
            });
        }
        let import = self.module.0.borrow().direct_imports.get(&id).cloned();
        if let Some(module) = import {
            return Ok(LongName {
                name: self.expect_id(what)?,
                module: Some(module),
            });
        }
        if id == self.module_name {
            Err(self.error(ParserErrorKind::CurrentModulePrefixed))
        } else {
            Err(self.error(ParserErrorKind::ModuleNotVisible {
                import: id,
                module: self.module_name.clone(),
            }))
        }
    }

    /// Resolves a class name: alias table first for unqualified names, then
    /// the owning module's class arena (which creates forward references).
    pub(crate) fn get_class_by_name(&mut self, what: &'static str) -> Result<ClassRef> {
        let LongName { name, module } = self.expect_long_name(what)?;
        let target = match module {
            Some(module) => module,
            None => {
                let alias = self.module.0.borrow().aliases.get(&name).cloned();
                if let Some(ClassOrFunction::Class(class)) = alias {
                    return Ok(class);
                }
                self.module.clone()
            }
        };
        Ok(target.get_class(&name))
    }

    /// Reads a name as an expression. A single-segment name matching one of
    /// the current class's type parameters resolves to that parameter; all
    /// other names become `Get` nodes for the resolution pass.
    pub(crate) fn mk_get(&mut self, what: &'static str) -> Result<Action> {
        let loc = self.loc();
        let LongName { name, module } = self.expect_long_name(what)?;
        if module.is_none() {
            if let Some(class) = &self.current_class {
                let param = class
                    .0
                    .borrow()
                    .params
                    .iter()
                    .find(|p| p.0.borrow().name == name)
                    .cloned();
                if let Some(param) = param {
                    return Ok(Action::new(loc, ActionKind::MkInstance {
                        cls: Some(AbstractClass::Param(param)),
                    }));
                }
            }
        }
        Ok(Action::new(loc, ActionKind::Get {
            var: None,
            name,
            module,
        }))
    }

    /// Whether the cursor sits on an identifier head byte.
    pub(crate) fn at_id(&self) -> bool {
        is_id_head(self.byte(0))
    }
}
