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

//! Whole-program parses driven through an in-memory text provider.

use vesper_ast::{ActionKind, Ast, ClassOrFunction, ModuleRef};
use vesper_errors::{ParserError, ParserErrorKind, Result};
use vesper_parser::parse;
use vesper_span::Location;

use std::collections::HashMap;

fn provider(sources: &[(&str, &str)]) -> impl FnMut(&str) -> Result<String> {
    let sources: HashMap<String, String> = sources
        .iter()
        .map(|(name, text)| (name.to_string(), text.to_string()))
        .collect();
    move |name: &str| {
        sources.get(name).cloned().ok_or_else(|| {
            ParserError::bare(ParserErrorKind::ModuleTextUnavailable(name.to_string()))
        })
    }
}

fn parse_program(start: &str, sources: &[(&str, &str)]) -> Ast {
    let mut ast = Ast::new();
    let mut provider = provider(sources);
    parse(&mut ast, start, &mut provider).unwrap();
    ast
}

fn parse_program_err(start: &str, sources: &[(&str, &str)]) -> ParserError {
    let mut ast = Ast::new();
    let mut provider = provider(sources);
    parse(&mut ast, start, &mut provider).unwrap_err()
}

fn order(ast: &Ast) -> Vec<String> {
    ast.modules_in_order.iter().map(ModuleRef::name).collect()
}

#[test]
fn single_module_program() {
    let ast = parse_program("main", &[("main", "fn main() void { log(\"hi\"); }\nmain()")]);
    assert_eq!(order(&ast), ["sys", "main"]);
    let main = ast.modules.get("main").unwrap().0.borrow();
    let function = main.functions.get("main").unwrap().borrow();
    // The body is the call plus the void contributed by the trailing `;`.
    let ActionKind::Call { callee, params } = &function.body[0].kind else {
        panic!("expected a call, got {:?}", function.body[0]);
    };
    assert!(matches!(&callee.kind, ActionKind::Get { name, .. } if name == "log"));
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].kind, ActionKind::ConstString("hi".to_string()));
    assert_eq!(ast.starting_module.as_ref().map(ModuleRef::name).as_deref(), Some("main"));
}

#[test]
fn imports_complete_before_the_importer() {
    let ast = parse_program("main", &[
        ("main", "using a;\nfn f() int { 1 }\nf()"),
        ("a", "fn g() int { 2 }"),
    ]);
    assert_eq!(order(&ast), ["sys", "a", "main"]);
    let main = ast.modules.get("main").unwrap().0.borrow();
    assert!(main.direct_imports.contains_key("a"));
    assert!(main.direct_imports.contains_key("sys"));
}

#[test]
fn diamond_imports_parse_each_module_once() {
    let ast = parse_program("main", &[
        ("main", "using a;\nusing b;\n1"),
        ("a", "using shared;"),
        ("b", "using shared;"),
        ("shared", "fn s() int { 1 }"),
    ]);
    assert_eq!(order(&ast), ["sys", "shared", "a", "b", "main"]);
    let a = ast.modules.get("a").unwrap().0.borrow();
    let b = ast.modules.get("b").unwrap().0.borrow();
    assert_eq!(
        a.direct_imports.get("shared").unwrap(),
        b.direct_imports.get("shared").unwrap()
    );
}

#[test]
fn circular_imports_are_fatal() {
    let err = parse_program_err("a", &[
        ("a", "using b;\n1"),
        ("b", "using a;\n1"),
    ]);
    let ParserErrorKind::CircularDependency(path) = &err.kind else {
        panic!("expected a cycle, got {err:?}");
    };
    assert!(path.contains('a') && path.contains('b'), "path was {path}");
    assert_eq!(err.module.as_deref(), Some("a"));
}

#[test]
fn aliases_bind_functions_before_classes() {
    let ast = parse_program("main", &[
        ("main", "using a { g; C; renamed = g; }\n1"),
        ("a", "class g { f = 0; } class C { f = 0; } fn g() int { 2 }"),
    ]);
    let main = ast.modules.get("main").unwrap().0.borrow();
    assert!(matches!(main.aliases.get("g"), Some(ClassOrFunction::Function(_))));
    assert!(matches!(main.aliases.get("C"), Some(ClassOrFunction::Class(_))));
    assert!(matches!(main.aliases.get("renamed"), Some(ClassOrFunction::Function(_))));
}

#[test]
fn unknown_alias_names_are_fatal() {
    let err = parse_program_err("main", &[
        ("main", "using a { missing; }\n1"),
        ("a", "fn g() int { 2 }"),
    ]);
    assert!(matches!(
        err.kind,
        ParserErrorKind::UnknownImportedName { .. }
    ));
}

#[test]
fn module_prefixes_resolve_through_direct_imports() {
    let ast = parse_program("main", &[
        ("main", "using a;\nx = a_make();\nx"),
        ("a", "fn make() int { 1 }"),
    ]);
    let main = ast.modules.get("main").unwrap().0.borrow();
    let entry = main.entry_point.borrow();
    let ActionKind::Block(block) = &entry.body[0].kind else {
        panic!("expected binding block");
    };
    let init = block.names[0].borrow().initializer.clone().unwrap();
    let ActionKind::Call { callee, .. } = init.kind else {
        panic!("expected call initializer");
    };
    let ActionKind::Get { name, module, .. } = &callee.kind else {
        panic!("expected name read");
    };
    assert_eq!(name, "make");
    assert_eq!(module.as_ref().map(ModuleRef::name).as_deref(), Some("a"));
}

#[test]
fn unknown_module_prefix_is_fatal() {
    let err = parse_program_err("main", &[("main", "x = nowhere_f();\nx")]);
    assert!(matches!(err.kind, ParserErrorKind::ModuleNotVisible { .. }));
}

#[test]
fn current_module_prefix_is_fatal() {
    let err = parse_program_err("main", &[("main", "fn f() int { 1 }\nmain_f()")]);
    assert_eq!(err.kind, ParserErrorKind::CurrentModulePrefixed);
}

#[test]
fn classes_reopen_across_modules() {
    let ast = parse_program("main", &[
        ("main", "using a;\nclass a_C { g = 1; }\n1"),
        ("a", "class C { f = 0; }"),
    ]);
    let a = ast.modules.get("a").unwrap().0.borrow();
    let class = a.classes.get("C").unwrap().0.borrow();
    let fields: Vec<&str> = class.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, ["f", "g"]);
    let main = ast.modules.get("main").unwrap().0.borrow();
    assert!(main.classes.is_empty());
}

#[test]
fn entry_point_bindings_nest() {
    let ast = parse_program("main", &[("main", "a = 1; b = a + 2; b")]);
    let main = ast.modules.get("main").unwrap().0.borrow();
    let entry = main.entry_point.borrow();
    assert_eq!(entry.body.len(), 1);
    let ActionKind::Block(outer) = &entry.body[0].kind else {
        panic!("expected outer block, got {:?}", entry.body[0]);
    };
    assert_eq!(outer.names[0].borrow().name, "a");
    let ActionKind::Block(inner) = &outer.body[0].kind else {
        panic!("expected inner block");
    };
    assert_eq!(inner.names[0].borrow().name, "b");
    assert!(matches!(&inner.body[0].kind, ActionKind::Get { name, .. } if name == "b"));
}

#[test]
fn starting_module_needs_an_entry_point() {
    let err = parse_program_err("main", &[("main", "fn main() void { log(\"hi\"); }")]);
    assert_eq!(err.kind, ParserErrorKind::NoEntryPoint);
    assert_eq!(err.to_string(), "error starting module has no entry point");
}

#[test]
fn imported_modules_do_not_need_entry_points() {
    let ast = parse_program("main", &[
        ("main", "using a;\n1"),
        ("a", "fn g() int { 2 }"),
    ]);
    let a = ast.modules.get("a").unwrap().0.borrow();
    assert!(a.entry_point.borrow().body.is_empty());
}

#[test]
fn unterminated_string_reports_the_end_of_input() {
    let err = parse_program_err("main", &[("main", "a = \"hi")]);
    assert_eq!(err.kind, ParserErrorKind::IncompleteStringConstant);
    assert_eq!(err.module.as_deref(), Some("main"));
    assert_eq!(err.location, Some(Location::new(1, 8)));
}

#[test]
fn trailing_garbage_after_the_entry_point_is_fatal() {
    let err = parse_program_err("main", &[("main", "1 2")]);
    assert_eq!(err.kind, ParserErrorKind::UnexpectedStatements);
}

#[test]
fn diagnostics_render_with_module_line_and_column() {
    let err = parse_program_err("main", &[("main", "fn f( { 1 }\nf()")]);
    let rendered = err.to_string();
    assert!(rendered.starts_with("error "), "{rendered}");
    assert!(rendered.contains("main:1:"), "{rendered}");
}

#[test]
fn explicit_sys_import_uses_the_registry() {
    let ast = parse_program("main", &[("main", "using sys;\nlog(\"x\")")]);
    assert_eq!(order(&ast), ["sys", "main"]);
    let main = ast.modules.get("main").unwrap().0.borrow();
    assert_eq!(main.direct_imports.get("sys").unwrap(), &ast.sys);
}

#[test]
fn missing_module_text_is_fatal() {
    let err = parse_program_err("main", &[("main", "using gone;\n1")]);
    assert!(matches!(err.kind, ParserErrorKind::ModuleTextUnavailable(_)));
}

fn render_module(module: &ModuleRef) -> String {
    let module = module.0.borrow();
    let mut rendered = format!("{module:?}");
    for (name, class) in &module.classes {
        rendered.push_str(&format!("\n{name}: {:?}", &*class.0.borrow()));
    }
    rendered
}

#[test]
fn parsing_is_deterministic_across_fresh_registries() {
    let sources: &[(&str, &str)] = &[
        (
            "main",
            "using a;\nconst k = 3;\nclass C { x = 0; *inc() int { x := x + k } }\nfn main() void { log(\"hi\"); }\nmain()",
        ),
        ("a", "interface I { f() int; }\nfn g() int { 2 }"),
    ];
    let first = parse_program("main", sources);
    let second = parse_program("main", sources);
    assert_eq!(order(&first), order(&second));
    for (name, module) in &first.modules {
        let other = second.modules.get(name).unwrap();
        assert_eq!(render_module(module), render_module(other), "module {name}");
    }
}
