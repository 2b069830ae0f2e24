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

//! Registration of the `sys` module's built-in surface.
//!
//! The resolution pass and the back end expect `Object`, the container
//! hierarchy, `String`, `Thread`, the free runtime functions, and the
//! platform-export symbol table to exist before any user module is parsed.
//! In standalone compiler builds the native pointers are absent and only the
//! symbol names are registered.

use crate::{
    AbstractClass, Action, ActionKind, Ast, ClassParam, ClassParamRef, ClassRef, Field, Function,
    ImmediateDelegate, Method, Mut, UnaryOperation, Var,
};

use vesper_span::Location;

use std::cell::RefCell;
use std::rc::Rc;

/// An `int` type marker.
pub fn tp_int64() -> Action {
    Action::new(Location::default(), ActionKind::ConstInt64(0))
}

/// A `double` type marker.
pub fn tp_double() -> Action {
    Action::new(Location::default(), ActionKind::ConstDouble(0.0))
}

/// A `bool` type marker.
pub fn tp_bool() -> Action {
    Action::new(Location::default(), ActionKind::ConstBool(false))
}

/// A `void` type marker.
pub fn tp_void() -> Action {
    Action::new(Location::default(), ActionKind::ConstVoid)
}

/// Wraps `inner` into an optional: a never-taken `If`.
pub fn tp_optional(inner: Action) -> Action {
    let loc = Location::default();
    Action::new(loc, ActionKind::If {
        condition: Box::new(Action::new(loc, ActionKind::ConstBool(false))),
        body: Box::new(inner),
    })
}

fn mk_instance(cls: impl Into<AbstractClass>) -> Action {
    Action::new(Location::default(), ActionKind::MkInstance {
        cls: Some(cls.into()),
    })
}

/// A pinned reference type to `cls`.
pub fn get_ref(cls: impl Into<AbstractClass>) -> Action {
    Action::unary(Location::default(), UnaryOperation::Ref, mk_instance(cls))
}

/// A conforming reference type to `cls`.
pub fn get_conform_ref(cls: impl Into<AbstractClass>) -> Action {
    Action::unary(
        Location::default(),
        UnaryOperation::Conform,
        mk_instance(cls),
    )
}

/// A weak reference type to `cls`.
pub fn get_weak(cls: impl Into<AbstractClass>) -> Action {
    Action::unary(
        Location::default(),
        UnaryOperation::MkWeak,
        mk_instance(cls),
    )
}

/// An own reference type to `cls`.
pub fn get_own(cls: impl Into<AbstractClass>) -> Action {
    mk_instance(cls)
}

/// A delegate type with the given parameter types and result.
pub fn tp_delegate(params: Vec<Action>, result: Action) -> Action {
    let mut fun = Function::new("", Location::default());
    fun.add_this_param(None);
    for param in params {
        let mut var = Var::new("", param.loc);
        var.initializer = Some(param);
        fun.names.push(Rc::new(RefCell::new(var)));
    }
    fun.type_expression = result;
    let delegate = Rc::new(RefCell::new(ImmediateDelegate { fun, base: None }));
    Action::new(Location::default(), ActionKind::Delegate(delegate))
}

/// A field with its type-carrying initializer.
pub fn mk_field(name: &str, initializer: Action) -> Field {
    Field {
        name: name.to_string(),
        initializer,
        loc: Location::default(),
    }
}

fn build_method(mut_: Mut, cls: &ClassRef, name: &str, result: Action, params: Vec<Action>) -> Method {
    let mut fun = Function::new(name, Location::default());
    fun.add_this_param(Some(AbstractClass::Class(cls.clone())));
    for param in params {
        let mut var = Var::new("", param.loc);
        var.initializer = Some(param);
        fun.names.push(Rc::new(RefCell::new(var)));
    }
    fun.type_expression = result;
    fun.is_platform = true;
    Method {
        fun,
        mut_,
        base_module: Some("sys".to_string()),
    }
}

/// Adds an intrinsic method to `cls`.
pub fn mk_method(mut_: Mut, cls: &ClassRef, name: &str, result: Action, params: Vec<Action>) {
    let method = build_method(mut_, cls, name, result, params);
    cls.0.borrow_mut().new_methods.push(method);
}

fn add_class_param(cls: &ClassRef, base: &ClassRef) -> ClassParamRef {
    let param = ClassParamRef::new(ClassParam {
        name: "T".to_string(),
        base: base.clone(),
        is_in: true,
        is_out: true,
        loc: Location::default(),
    });
    cls.0.borrow_mut().params.push(param.clone());
    param
}

fn conform_to(cls: &ClassRef, base: &ClassRef) {
    cls.0.borrow_mut().overloads_entry(base);
}

/// Populates `ast` with the `sys` built-ins and the platform-export table.
/// Does nothing when called again on the same registry.
pub fn register_runtime_content(ast: &mut Ast) {
    if ast.object.is_some() {
        return;
    }

    let object = ast.mk_class("Object");
    ast.object = Some(object.clone());

    let container = ast.mk_class("Container");
    {
        let mut c = container.0.borrow_mut();
        c.fields.push(mk_field("_size", tp_int64()));
        c.fields.push(mk_field("_data", tp_int64()));
    }
    mk_method(Mut::Any, &container, "capacity", tp_int64(), vec![]);
    mk_method(Mut::Mutating, &container, "insertItems", tp_void(), vec![
        tp_int64(),
        tp_int64(),
    ]);
    mk_method(Mut::Mutating, &container, "moveItems", tp_bool(), vec![
        tp_int64(),
        tp_int64(),
        tp_int64(),
    ]);

    let blob = ast.mk_class("Blob");
    conform_to(&blob, &container);
    for accessor in ["get8At", "get16At", "get32At", "get64At"] {
        mk_method(Mut::Any, &blob, accessor, tp_int64(), vec![tp_int64()]);
    }
    for mutator in ["set8At", "set16At", "set32At", "set64At"] {
        mk_method(Mut::Mutating, &blob, mutator, tp_void(), vec![
            tp_int64(),
            tp_int64(),
        ]);
    }
    mk_method(Mut::Mutating, &blob, "deleteBytes", tp_void(), vec![
        tp_int64(),
        tp_int64(),
    ]);
    mk_method(Mut::Mutating, &blob, "copyBytesTo", tp_bool(), vec![
        tp_int64(),
        get_conform_ref(&blob),
        tp_int64(),
        tp_int64(),
    ]);
    mk_method(Mut::Mutating, &blob, "putChAt", tp_int64(), vec![
        tp_int64(),
        tp_int64(),
    ]);
    ast.blob = Some(blob.clone());

    let str_builder = ast.mk_class("StrBuilder");
    conform_to(&str_builder, &blob);
    ast.str_builder = Some(str_builder);

    let own_array = ast.mk_class("Array");
    conform_to(&own_array, &container);
    {
        let t = add_class_param(&own_array, &object);
        mk_method(Mut::Any, &own_array, "getAt", tp_optional(get_ref(&t)), vec![tp_int64()]);
        mk_method(Mut::Mutating, &own_array, "setAt", get_ref(&t), vec![
            tp_int64(),
            get_own(&t),
        ]);
        mk_method(Mut::Mutating, &own_array, "setOptAt", tp_void(), vec![
            tp_int64(),
            tp_optional(get_own(&t)),
        ]);
        mk_method(Mut::Mutating, &own_array, "delete", tp_void(), vec![
            tp_int64(),
            tp_int64(),
        ]);
        mk_method(Mut::Mutating, &own_array, "spliceAt", tp_bool(), vec![
            tp_int64(),
            tp_optional(get_ref(&t)),
        ]);
    }
    ast.own_array = Some(own_array);

    let weak_array = ast.mk_class("WeakArray");
    conform_to(&weak_array, &container);
    {
        let t = add_class_param(&weak_array, &object);
        mk_method(Mut::Any, &weak_array, "getAt", get_weak(&t), vec![tp_int64()]);
        mk_method(Mut::Mutating, &weak_array, "setAt", tp_void(), vec![
            tp_int64(),
            get_weak(&t),
        ]);
        mk_method(Mut::Mutating, &weak_array, "delete", tp_void(), vec![
            tp_int64(),
            tp_int64(),
        ]);
    }
    ast.weak_array = Some(weak_array);

    let string_cls = ast.mk_class("String");
    {
        let mut c = string_cls.0.borrow_mut();
        c.fields.push(mk_field("_cursor", tp_int64()));
        c.fields.push(mk_field("_buffer", tp_int64()));
    }
    mk_method(Mut::Mutating, &string_cls, "fromBlob", tp_bool(), vec![
        get_conform_ref(&blob),
        tp_int64(),
        tp_int64(),
    ]);
    mk_method(Mut::Mutating, &string_cls, "getCh", tp_int64(), vec![]);
    ast.string_cls = Some(string_cls.clone());

    ast.mk_fn(
        "getParent",
        tp_optional(get_ref(&object)),
        vec![get_conform_ref(&object)],
    );
    ast.mk_fn("log", tp_void(), vec![get_conform_ref(&string_cls)]);
    ast.mk_fn("terminate", tp_void(), vec![tp_int64()]);
    ast.mk_fn("setMainObject", tp_void(), vec![tp_optional(get_ref(&object))]);
    ast.mk_fn("postTimer", tp_void(), vec![
        tp_int64(),
        tp_delegate(vec![], tp_void()),
    ]);

    let thread = ast.mk_class("Thread");
    {
        let mut c = thread.0.borrow_mut();
        c.fields.push(mk_field("_internal", tp_int64()));
    }
    {
        let mut start = build_method(Mut::Mutating, &thread, "start", tp_void(), vec![get_ref(
            &object,
        )]);
        start.fun.is_factory = true;
        if let Some(this_param) = start.fun.names.first().cloned() {
            start.fun.type_expression = Action::get_var(Location::default(), &this_param);
        }
        thread.0.borrow_mut().new_methods.push(start);
    }
    mk_method(Mut::Mutating, &thread, "root", get_weak(&object), vec![]);

    for symbol in PLATFORM_SYMBOLS {
        ast.platform_exports.insert(symbol.to_string(), None);
    }
}

/// Runtime symbols the back end links against, in registration order.
const PLATFORM_SYMBOLS: &[&str] = &[
    "vs_init",
    "vs_copy",
    "vs_copy_object_field",
    "vs_copy_weak_field",
    "vs_allocate_obj",
    "vs_mk_weak",
    "vs_deref_weak",
    "vs_reg_copy_fixer",
    "vs_retain_own",
    "vs_retain_shared",
    "vs_retain_weak",
    "vs_release_own",
    "vs_release_shared",
    "vs_release_pin",
    "vs_release_weak",
    "vs_dispose_obj",
    "vs_set_parent",
    "vs_splice",
    "vs_freeze",
    "vs_unlock_thread_queue",
    "vs_get_thread_param",
    "vs_prepare_post_message",
    "vs_put_thread_param",
    "vs_put_thread_param_weak_ptr",
    "vs_put_thread_param_own_ptr",
    "vs_finalize_post_message",
    "vs_handle_main_thread",
    "vs_copy_sys_Container",
    "vs_dtor_sys_Container",
    "vs_visit_sys_Container",
    "vs_copy_sys_Blob",
    "vs_dtor_sys_Blob",
    "vs_visit_sys_Blob",
    "vs_copy_sys_Array",
    "vs_dtor_sys_Array",
    "vs_visit_sys_Array",
    "vs_copy_sys_WeakArray",
    "vs_dtor_sys_WeakArray",
    "vs_visit_sys_WeakArray",
    "vs_copy_sys_String",
    "vs_dtor_sys_String",
    "vs_visit_sys_String",
    "vs_copy_sys_Thread",
    "vs_dtor_sys_Thread",
    "vs_visit_sys_Thread",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_once() {
        let mut ast = Ast::new();
        register_runtime_content(&mut ast);
        let classes = ast.sys.0.borrow().classes.len();
        register_runtime_content(&mut ast);
        assert_eq!(ast.sys.0.borrow().classes.len(), classes);
    }

    #[test]
    fn sys_surface_is_complete() {
        let mut ast = Ast::new();
        register_runtime_content(&mut ast);
        let sys = ast.sys.0.borrow();
        for class in [
            "Object",
            "Container",
            "Blob",
            "StrBuilder",
            "Array",
            "WeakArray",
            "String",
            "Thread",
        ] {
            assert!(sys.classes.contains_key(class), "missing class {class}");
        }
        for function in ["getParent", "log", "terminate", "setMainObject", "postTimer"] {
            assert!(sys.functions.contains_key(function), "missing fn {function}");
        }
        assert!(ast.platform_exports.contains_key("vs_init"));
        assert!(ast.platform_exports.contains_key("vs_visit_sys_Thread"));
    }

    #[test]
    fn intrinsic_methods_carry_this_and_mutability() {
        let mut ast = Ast::new();
        register_runtime_content(&mut ast);
        let blob = ast.blob.clone().unwrap();
        let blob = blob.0.borrow();
        let set8 = blob
            .new_methods
            .iter()
            .find(|m| m.fun.name == "set8At")
            .unwrap();
        assert_eq!(set8.mut_, Mut::Mutating);
        assert_eq!(set8.fun.names[0].borrow().name, "this");
        assert_eq!(set8.fun.names.len(), 3);
        assert!(set8.fun.is_platform);
    }

    #[test]
    fn thread_start_is_a_factory() {
        let mut ast = Ast::new();
        register_runtime_content(&mut ast);
        let thread = ast.sys.get_class("Thread");
        let thread = thread.0.borrow();
        let start = thread
            .new_methods
            .iter()
            .find(|m| m.fun.name == "start")
            .unwrap();
        assert!(start.fun.is_factory);
        assert!(matches!(
            start.fun.type_expression.kind,
            ActionKind::Get { var: Some(_), .. }
        ));
    }
}
