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

//! Top-level declarations: constants, classes and interfaces, functions, and
//! tests.

use super::expression::var_ref;
use super::{LongName, ParserContext};

use vesper_ast::{Action, ActionKind, ClassParam, ClassParamRef, ClassRef, Field, Function, Method, Mut};
use vesper_errors::{ParserErrorKind, Result};

use std::cell::RefCell;
use std::rc::Rc;

/// What kind of callable a `<fn-def>` belongs to; decides whether a `this`
/// return is legal and whether a receiver parameter exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FnKind {
    Function,
    Method,
    Delegate,
}

impl ParserContext<'_> {
    /// Parses declarations until a byte that starts none of them; the caller
    /// treats the remainder as entry-point statements.
    pub(crate) fn parse_declarations(&mut self) -> Result<()> {
        loop {
            if self.eat("const")? {
                self.parse_constant()?;
                continue;
            }
            let is_test = self.eat("test")?;
            let is_interface = self.eat("interface")?;
            if is_interface || self.eat("class")? {
                self.parse_class(is_interface, is_test)?;
            } else if self.eat("fn")? {
                self.parse_function(is_test, false)?;
            } else if is_test {
                self.parse_function(true, true)?;
            } else {
                return Ok(());
            }
        }
    }

    /// `const name = expr;`
    fn parse_constant(&mut self) -> Result<()> {
        let loc = self.loc();
        let name = self.expect_id("const name")?;
        let previous = self
            .module
            .0
            .borrow()
            .constants
            .get(&name)
            .map(|c| c.borrow().loc);
        if let Some(previous) = previous {
            return Err(self.error(ParserErrorKind::DuplicateConstant { name, previous }));
        }
        self.expect("=")?;
        let initializer = self.parse_expression()?;
        let constant = var_ref(name.clone(), loc, Some(initializer));
        constant.borrow_mut().is_const = true;
        self.module.0.borrow_mut().constants.insert(name, constant);
        self.expect(";")
    }

    /// `fn name <fn-def>` or, with `is_bare_test`, `test name <fn-def>`.
    fn parse_function(&mut self, is_test: bool, is_bare_test: bool) -> Result<()> {
        let loc = self.loc();
        let name = self.expect_id(if is_bare_test { "test name" } else { "function name" })?;
        let previous = {
            let module = self.module.0.borrow();
            let namespace = if is_bare_test { &module.tests } else { &module.functions };
            namespace.get(&name).map(|f| f.borrow().loc)
        };
        if let Some(previous) = previous {
            let kind = if is_bare_test {
                ParserErrorKind::DuplicateTest { name, previous }
            } else {
                ParserErrorKind::DuplicateFunction { name, previous }
            };
            return Err(self.error(kind));
        }
        let mut fun = Function::new(name.clone(), loc);
        fun.is_test = is_test;
        self.parse_fn_def(&mut fun, FnKind::Function)?;
        let fun = Rc::new(RefCell::new(fun));
        let mut module = self.module.0.borrow_mut();
        if is_bare_test {
            module.tests.insert(name, fun);
        } else {
            module.functions.insert(name, fun);
        }
        Ok(())
    }

    /// A class or interface declaration, possibly reopening an existing
    /// entity.
    fn parse_class(&mut self, is_interface: bool, is_test: bool) -> Result<()> {
        let class = self.get_class_by_name("class or interface name")?;
        self.current_class = Some(class.clone());
        let first_occurrence = !class.0.borrow().loc.is_defined();
        {
            let mut c = class.0.borrow_mut();
            c.loc = self.loc();
            c.is_interface = is_interface;
            c.is_test = is_test;
        }
        if self.eat("(")? {
            if !first_occurrence {
                return Err(self.error(ParserErrorKind::ReopenedClassTypeParameters));
            }
            loop {
                let param = self.parse_class_param()?;
                class.0.borrow_mut().params.push(param);
                if !self.eat(",")? {
                    break;
                }
            }
            self.expect(")")?;
        }
        self.expect("{")?;
        while !self.eat("}")? {
            if self.eat("+")? {
                self.parse_conformance(&class, is_interface)?;
            } else {
                self.parse_member(&class, is_interface)?;
            }
        }
        self.current_class = None;
        Ok(())
    }

    /// One type parameter with its variance: `name [> base | < base]`.
    fn parse_class_param(&mut self) -> Result<ClassParamRef> {
        let loc = self.loc();
        let name = self.expect_id("type parameter name")?;
        let mut is_in = true;
        let mut is_out = true;
        if self.eat(">")? {
            is_out = false;
        } else if self.eat("<")? {
            is_in = false;
        }
        let base = self.get_class_by_name("base class for type parameter")?;
        Ok(ClassParamRef::new(ClassParam {
            name,
            base,
            is_in,
            is_out,
            loc,
        }))
    }

    /// `+ Base ;` or `+ Base { override* }`.
    fn parse_conformance(&mut self, class: &ClassRef, is_interface: bool) -> Result<()> {
        let base = self.get_class_by_name("base class or interface")?;
        class.0.borrow_mut().overloads_entry(&base);
        if self.eat("{")? {
            if is_interface {
                return Err(self.error(ParserErrorKind::InterfaceWithOverrides));
            }
            while !self.eat("}")? {
                let LongName { name, module } = self.expect_long_name("override method name")?;
                let base_module = module.map(|m| m.name());
                let method = self.make_method(name, base_module, class, is_interface)?;
                class.0.borrow_mut().overloads_entry(&base).push(method);
            }
            Ok(())
        } else {
            self.expect(";")
        }
    }

    /// A field (`name = expr;`) or a method, with the optional mutability
    /// marker that only methods may carry.
    fn parse_member(&mut self, class: &ClassRef, is_interface: bool) -> Result<()> {
        let mut_ = if self.eat("*")? {
            Mut::Mutating
        } else if self.eat("-")? {
            Mut::Any
        } else {
            Mut::Immutable
        };
        let loc = self.loc();
        let name = self.expect_id("method or field name")?;
        if self.eat("=")? {
            if mut_ != Mut::Immutable {
                return Err(self.error(ParserErrorKind::FieldWithMutMarker));
            }
            let initializer = self.parse_expression()?;
            class.0.borrow_mut().fields.push(Field {
                name,
                initializer,
                loc,
            });
            self.expect(";")
        } else {
            let mut method =
                self.make_method(name, Some(self.module_name.clone()), class, is_interface)?;
            method.mut_ = mut_;
            class.0.borrow_mut().new_methods.push(method);
            Ok(())
        }
    }

    /// Builds a method: synthesizes the `this` parameter, parses the fn-def,
    /// and checks the body against the interface/class shape.
    fn make_method(
        &mut self,
        name: String,
        base_module: Option<String>,
        class: &ClassRef,
        is_interface: bool,
    ) -> Result<Method> {
        let mut fun = Function::new(name, self.loc());
        fun.add_this_param(Some(class.into()));
        self.parse_fn_def(&mut fun, FnKind::Method)?;
        if is_interface != fun.body.is_empty() {
            return Err(self.error(if is_interface {
                ParserErrorKind::EmptyBodyExpected
            } else {
                ParserErrorKind::NonEmptyBodyExpected
            }));
        }
        Ok(Method {
            fun,
            mut_: Mut::Immutable,
            base_module,
        })
    }

    /// `( [type name, ...] ) [ this { body } | ; | { body } | type ; | type { body } ]`
    ///
    /// `this` makes a factory whose result is the receiver; a `;` right after
    /// the parameter list or the return type declares a platform callable
    /// with no body.
    pub(crate) fn parse_fn_def(&mut self, fun: &mut Function, kind: FnKind) -> Result<()> {
        self.expect("(")?;
        while !self.eat(")")? {
            let loc = self.loc();
            let parameter_type = self.parse_type()?;
            let name = self.expect_id("parameter name")?;
            fun.names.push(var_ref(name, loc, Some(parameter_type)));
            if self.eat(")")? {
                break;
            }
            self.expect(",")?;
        }
        if self.eat("this")? {
            if kind != FnKind::Method {
                return Err(self.error(ParserErrorKind::ThisReturnOutsideMethod));
            }
            fun.is_factory = true;
            let this_param = match fun.names.first() {
                Some(this_param) => this_param.clone(),
                None => return Err(self.error(ParserErrorKind::ThisReturnOutsideMethod)),
            };
            fun.type_expression = Action::get_var(self.loc(), &this_param);
            self.expect("{")?;
        } else if self.eat(";")? {
            fun.type_expression = Action::new(self.loc(), ActionKind::ConstVoid);
            fun.is_platform = true;
            return Ok(());
        } else if self.eat("{")? {
            fun.type_expression = Action::new(self.loc(), ActionKind::ConstVoid);
        } else {
            fun.type_expression = self.parse_type()?;
            if self.eat(";")? {
                fun.is_platform = true;
                return Ok(());
            }
            self.expect("{")?;
        }
        self.parse_statement_sequence(&mut fun.body)?;
        if fun.is_factory {
            // A factory evaluates to its receiver.
            fun.body.push(fun.type_expression.clone());
        }
        self.expect("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_support::with_context;
    use vesper_ast::BinaryOperation;

    fn parse_source(text: &str) -> vesper_ast::ModuleRef {
        with_context(text, |p| {
            p.parse_module_body().unwrap();
            p.module.clone()
        })
    }

    fn parse_module_err(text: &str) -> ParserErrorKind {
        with_context(text, |p| p.parse_module_body().unwrap_err().kind)
    }

    #[test]
    fn constants() {
        let module = parse_source("const answer = 42;");
        let module = module.0.borrow();
        let answer = module.constants.get("answer").unwrap().borrow();
        assert!(answer.is_const);
        assert_eq!(
            answer.initializer.as_ref().unwrap().kind,
            ActionKind::ConstInt64(42)
        );
    }

    #[test]
    fn duplicate_constant_is_fatal() {
        let kind = parse_module_err("const a = 1; const a = 2;");
        assert!(matches!(kind, ParserErrorKind::DuplicateConstant { .. }));
    }

    #[test]
    fn platform_function_shape() {
        let module = parse_source("fn f(int a) int;");
        let module = module.0.borrow();
        let f = module.functions.get("f").unwrap().borrow();
        assert!(f.is_platform);
        assert!(f.body.is_empty());
        assert_eq!(f.type_expression.kind, ActionKind::ConstInt64(0));
        assert_eq!(f.names.len(), 1);
        assert_eq!(f.names[0].borrow().name, "a");
    }

    #[test]
    fn void_function_and_parameter_order() {
        let module = parse_source("fn f(int a, bool b) { a }");
        let module = module.0.borrow();
        let f = module.functions.get("f").unwrap().borrow();
        assert!(!f.is_platform);
        assert_eq!(f.type_expression.kind, ActionKind::ConstVoid);
        let names: Vec<String> = f.names.iter().map(|v| v.borrow().name.clone()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn duplicate_function_name_is_fatal() {
        let kind = parse_module_err("fn f() { 1 } fn f() { 2 }");
        assert!(matches!(kind, ParserErrorKind::DuplicateFunction { .. }));
    }

    #[test]
    fn bare_tests_live_in_their_own_namespace() {
        let module = parse_source("fn t() { 1 } test t() { 2 }");
        let module = module.0.borrow();
        assert!(module.functions.contains_key("t"));
        assert!(module.tests.contains_key("t"));
        assert!(module.tests.get("t").unwrap().borrow().is_test);
    }

    #[test]
    fn duplicate_test_name_is_fatal() {
        let kind = parse_module_err("test t() { 1 } test t() { 2 }");
        assert!(matches!(kind, ParserErrorKind::DuplicateTest { .. }));
    }

    #[test]
    fn this_return_outside_methods_is_fatal() {
        let kind = parse_module_err("fn f() this { 1 }");
        assert_eq!(kind, ParserErrorKind::ThisReturnOutsideMethod);
    }

    #[test]
    fn class_with_field_and_mutating_method() {
        let module = parse_source("class C { x = 0; *inc() int { x := x + 1 } }");
        let module = module.0.borrow();
        let class = module.classes.get("C").unwrap();
        let class = class.0.borrow();
        assert!(!class.is_interface);
        assert_eq!(class.fields.len(), 1);
        assert_eq!(class.fields[0].name, "x");
        let inc = &class.new_methods[0];
        assert_eq!(inc.fun.name, "inc");
        assert_eq!(inc.mut_, Mut::Mutating);
        assert_eq!(inc.fun.names[0].borrow().name, "this");
        let ActionKind::Set { name, value, .. } = &inc.fun.body[0].kind else {
            panic!("expected assignment body, got {:?}", inc.fun.body[0]);
        };
        assert_eq!(name, "x");
        let ActionKind::Binary { op: BinaryOperation::Add, left, right } = &value.kind else {
            panic!("expected + value, got {value:?}");
        };
        assert!(matches!(&left.kind, ActionKind::Get { name, .. } if name == "x"));
        assert_eq!(right.kind, ActionKind::ConstInt64(1));
    }

    #[test]
    fn mut_markers_map_to_mutability() {
        let module = parse_source("class C { a() int { 1 } -b() int { 1 } *c() int { 1 } }");
        let module = module.0.borrow();
        let class = module.classes.get("C").unwrap();
        let class = class.0.borrow();
        let muts: Vec<Mut> = class.new_methods.iter().map(|m| m.mut_).collect();
        assert_eq!(muts, [Mut::Immutable, Mut::Any, Mut::Mutating]);
    }

    #[test]
    fn markers_are_illegal_on_fields() {
        let kind = parse_module_err("class C { *x = 0; }");
        assert_eq!(kind, ParserErrorKind::FieldWithMutMarker);
    }

    #[test]
    fn interface_methods_have_empty_bodies() {
        let module = parse_source("interface I { f() int; }");
        let module = module.0.borrow();
        let class = module.classes.get("I").unwrap();
        let class = class.0.borrow();
        assert!(class.is_interface);
        assert!(class.new_methods[0].fun.body.is_empty());
    }

    #[test]
    fn class_bodies_must_not_be_empty_and_interfaces_must() {
        assert_eq!(
            parse_module_err("class I { f() int; }"),
            ParserErrorKind::NonEmptyBodyExpected
        );
        assert_eq!(
            parse_module_err("interface I { f() int { 1 } }"),
            ParserErrorKind::EmptyBodyExpected
        );
    }

    #[test]
    fn factory_methods_append_their_receiver() {
        let module = parse_source("class C { make() this { 0 } }");
        let module = module.0.borrow();
        let class = module.classes.get("C").unwrap();
        let class = class.0.borrow();
        let make = &class.new_methods[0];
        assert!(make.fun.is_factory);
        let last = make.fun.body.last().unwrap();
        assert!(matches!(&last.kind, ActionKind::Get { var: Some(_), name, .. } if name == "this"));
    }

    #[test]
    fn reopening_accumulates_members_in_encounter_order() {
        let module = parse_source("class C { f = 0; } class C { g = 0; }");
        let module = module.0.borrow();
        assert_eq!(module.classes.len(), 1);
        let class = module.classes.get("C").unwrap();
        let class = class.0.borrow();
        let fields: Vec<&str> = class.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, ["f", "g"]);
    }

    #[test]
    fn type_parameters_only_on_the_first_occurrence() {
        let kind = parse_module_err("class C(T Object) { } class C(U Object) { }");
        assert_eq!(kind, ParserErrorKind::ReopenedClassTypeParameters);
    }

    #[test]
    fn type_parameter_variance_markers() {
        let module = parse_source("class C(A Object, B > Object, D < Object) { }");
        let module = module.0.borrow();
        let class = module.classes.get("C").unwrap();
        let class = class.0.borrow();
        let flags: Vec<(bool, bool)> = class
            .params
            .iter()
            .map(|p| {
                let p = p.0.borrow();
                (p.is_in, p.is_out)
            })
            .collect();
        assert_eq!(flags, [(true, true), (true, false), (false, true)]);
        assert_eq!(class.params[0].0.borrow().base.name(), "Object");
    }

    #[test]
    fn conformance_without_overrides() {
        let module = parse_source("interface I { f() int; } class C { + I; g() int { 1 } }");
        let module = module.0.borrow();
        let class = module.classes.get("C").unwrap();
        let class = class.0.borrow();
        assert_eq!(class.overloads.len(), 1);
        assert_eq!(class.overloads[0].0.name(), "I");
        assert!(class.overloads[0].1.is_empty());
    }

    #[test]
    fn override_blocks_attach_to_their_base() {
        let module =
            parse_source("interface I { f() int; } class C { + I { f() int { 1 } } }");
        let module = module.0.borrow();
        let class = module.classes.get("C").unwrap();
        let class = class.0.borrow();
        assert_eq!(class.overloads[0].1.len(), 1);
        assert_eq!(class.overloads[0].1[0].fun.name, "f");
        assert!(class.new_methods.is_empty());
    }

    #[test]
    fn interfaces_cannot_carry_override_blocks() {
        let kind = parse_module_err("interface I { + J { f() int; } }");
        assert_eq!(kind, ParserErrorKind::InterfaceWithOverrides);
    }

    #[test]
    fn test_marker_applies_to_classes_and_functions() {
        let module = parse_source("test class C { f = 0; } test fn g() { 1 }");
        let module = module.0.borrow();
        assert!(module.classes.get("C").unwrap().0.borrow().is_test);
        assert!(module.functions.get("g").unwrap().borrow().is_test);
    }

    #[test]
    fn forward_referenced_base_gets_a_class_entity() {
        let module = parse_source("class C { + Later; f() int { 1 } }");
        let module = module.0.borrow();
        let later = module.classes.get("Later").unwrap();
        assert!(!later.0.borrow().loc.is_defined());
    }
}
