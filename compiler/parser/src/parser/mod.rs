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

//! The module driver: recursive parse-on-import with cycle detection.

use vesper_ast::{register_runtime_content, Ast, ClassOrFunction, ModuleRef};
use vesper_errors::{ParserError, ParserErrorKind, Result};
use vesper_span::Location;

use tracing::{debug, trace};

mod context;
pub(crate) use context::*;

pub mod expression;
pub mod file;
pub(crate) use file::FnKind;
pub mod statement;
pub mod type_;

/// Supplies a module's source text by name.
pub trait ModuleTextProvider {
    fn text_of(&mut self, name: &str) -> Result<String>;
}

impl<F> ModuleTextProvider for F
where
    F: FnMut(&str) -> Result<String>,
{
    fn text_of(&mut self, name: &str) -> Result<String> {
        self(name)
    }
}

/// Parses `start_module_name` and, transitively, everything it imports.
///
/// Populates `ast.starting_module` and appends each module to
/// `ast.modules_in_order` as its parse completes. The starting module must
/// carry top-level statements to serve as the entry point.
pub fn parse(
    ast: &mut Ast,
    start_module_name: &str,
    provider: &mut dyn ModuleTextProvider,
) -> Result<()> {
    register_runtime_content(ast);
    let mut dep_path = Vec::new();
    let starting = parse_module(ast, start_module_name, provider, &mut dep_path)?;
    let has_entry = !starting.0.borrow().entry_point.borrow().body.is_empty();
    if !has_entry {
        return Err(ParserError::bare(ParserErrorKind::NoEntryPoint));
    }
    ast.starting_module = Some(starting);
    Ok(())
}

/// Parses one module, returning the registered entity if it is already known.
pub(crate) fn parse_module(
    ast: &mut Ast,
    name: &str,
    provider: &mut dyn ModuleTextProvider,
    dep_path: &mut Vec<String>,
) -> Result<ModuleRef> {
    if dep_path.iter().any(|m| m == name) {
        let mut path = dep_path.clone();
        path.push(name.to_string());
        return Err(ParserError::new(
            ParserErrorKind::CircularDependency(path.join(" ")),
            name,
            Location::new(1, 1),
        ));
    }
    if let Some(existing) = ast.modules.get(name) {
        return Ok(existing.clone());
    }
    debug!(module = name, "parsing module");
    let module = ast.add_module(name);
    dep_path.push(name.to_string());
    let result = parse_module_text(ast, &module, provider, dep_path);
    dep_path.pop();
    result?;
    debug!(module = name, "module parsed");
    Ok(module)
}

fn parse_module_text(
    ast: &mut Ast,
    module: &ModuleRef,
    provider: &mut dyn ModuleTextProvider,
    dep_path: &mut Vec<String>,
) -> Result<()> {
    let text = provider.text_of(&module.name())?;
    let mut parser = ParserContext::new(ast, module.clone(), text, provider, dep_path);
    parser.parse_module_body()
}

impl ParserContext<'_> {
    /// Imports, declarations, then the entry-point statement sequence.
    pub(crate) fn parse_module_body(&mut self) -> Result<()> {
        self.eat_ws()?;
        while self.eat("using")? {
            self.parse_using()?;
        }
        self.ast.modules_in_order.push(self.module.clone());
        self.parse_declarations()?;
        if !self.is_eof() {
            let mut body = Vec::new();
            self.parse_statement_sequence(&mut body)?;
            let module = self.module.0.borrow();
            module.entry_point.borrow_mut().body = body;
        }
        if !self.is_eof() {
            return Err(self.error(ParserErrorKind::UnexpectedStatements));
        }
        Ok(())
    }

    /// One `using name;` or `using name { alias [= original]; ... }` directive.
    /// The referenced module is parsed before this one continues.
    fn parse_using(&mut self) -> Result<()> {
        let using_name = self.expect_id("imported module")?;
        let used = if using_name == "sys" {
            self.ast.sys.clone()
        } else {
            parse_module(self.ast, &using_name, self.provider, self.dep_path)?
        };
        trace!(module = %self.module_name, import = %using_name, "import resolved");
        self.module
            .0
            .borrow_mut()
            .direct_imports
            .insert(using_name.clone(), used.clone());
        if !self.eat("{")? {
            return self.expect(";");
        }
        loop {
            let my_id = self.expect_id("alias name")?;
            let their_id = if self.eat("=")? {
                self.expect_id("name in module")?
            } else {
                my_id.clone()
            };
            // Functions shadow classes in the imported module's namespace.
            let target = {
                let used = used.0.borrow();
                if let Some(function) = used.functions.get(&their_id) {
                    Some(ClassOrFunction::Function(function.clone()))
                } else {
                    used.classes
                        .get(&their_id)
                        .map(|class| ClassOrFunction::Class(class.clone()))
                }
            };
            match target {
                Some(target) => {
                    self.module.0.borrow_mut().aliases.insert(my_id, target);
                }
                None => {
                    return Err(self.error(ParserErrorKind::UnknownImportedName {
                        name: their_id,
                        module: using_name,
                    }));
                }
            }
            self.expect(";")?;
            if self.eat("}")? {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use vesper_errors::ParserErrorKind;

    /// Runs `f` over a parser context whose module text is `text`, with an
    /// empty provider and a fresh registry.
    pub(crate) fn with_context<T>(text: &str, f: impl FnOnce(&mut ParserContext<'_>) -> T) -> T {
        let mut ast = Ast::new();
        register_runtime_content(&mut ast);
        let module = ast.add_module("test");
        let mut provider = |name: &str| -> Result<String> {
            Err(ParserError::bare(ParserErrorKind::ModuleTextUnavailable(
                name.to_string(),
            )))
        };
        let mut dep_path = vec!["test".to_string()];
        let mut parser =
            ParserContext::new(&mut ast, module, text.to_string(), &mut provider, &mut dep_path);
        f(&mut parser)
    }
}
