use std::sync::Arc;

use crate::{
    config::{CompileOptions, VmConfig},
    reader::read,
    runtime::{
        arity::Arity,
        builtin_function::Builtin,
        closure::Closure,
        error::Fault,
        namespace::Namespace,
        symbol::Symbol,
        value::Value,
        vm::Vm,
    },
};

use super::function_call::make_closure;

fn closure(vm: &Vm, ns: &Arc<Namespace>, source: &str) -> Arc<Closure> {
    match vm.eval(ns, &read(source).unwrap()).unwrap() {
        Value::Closure(closure) => closure,
        other => panic!("expected a closure, got {}", other),
    }
}

#[test]
fn invoke_checks_arity_before_running() {
    let vm = Vm::new();
    let ns = Namespace::user();
    let pair = closure(&vm, &ns, "(lambda (a b) (cons a b))");
    let err = vm.invoke(&pair, vec![Value::Integer(1)]).unwrap_err();
    assert_eq!(
        err,
        Fault::UnmatchedArity {
            expected: "2".to_string(),
            got: 1
        }
    );
    let ok = vm
        .invoke(&pair, vec![Value::Integer(1), Value::Null])
        .unwrap();
    assert_eq!(ok.to_string(), "(1)");
}

#[test]
fn call_dispatches_builtins_directly() {
    let vm = Vm::new();
    let double = Builtin::new("double", Arity::fixed(1), |_, args| {
        Ok(Value::Integer(args[0].as_number()?.as_f64() as i64 * 2))
    });
    let result = vm
        .call(&Value::Builtin(Arc::new(double)), vec![Value::Integer(21)])
        .unwrap();
    assert_eq!(result, Value::Integer(42));
}

#[test]
fn calling_a_non_callable_faults() {
    let err = Vm::new()
        .call(&Value::Integer(3), Vec::new())
        .unwrap_err();
    assert_eq!(
        err,
        Fault::TypeMismatch {
            expected: "callable",
            found: "integer"
        }
    );
}

#[test]
fn make_closure_requires_a_procedure_template() {
    let err = make_closure(Value::Null, Vec::new()).unwrap_err();
    assert_eq!(
        err,
        Fault::TypeMismatch {
            expected: "procedure",
            found: "null"
        }
    );
}

#[test]
fn tail_call_into_a_builtin_returns_its_value() {
    let vm = Vm::new();
    let ns = Namespace::user();
    let wrap = closure(&vm, &ns, "(lambda (x) (list x x))");
    let result = vm.invoke(&wrap, vec![Value::Integer(4)]).unwrap();
    assert_eq!(result.to_string(), "(4 4)");
}

#[test]
fn tail_call_into_another_closure_checks_its_arity() {
    let vm = Vm::with_config(VmConfig {
        compile: CompileOptions::without_inlining(),
        ..Default::default()
    });
    let ns = Namespace::user();
    // Bound only after the caller is compiled, so the call is not checked
    // statically.
    let caller = closure(&vm, &ns, "(lambda (x) (callee x))");
    let callee = closure(&vm, &ns, "(lambda (a b) b)");
    ns.bind(&Symbol::new("callee"), Value::Closure(callee)).unwrap();
    let err = vm.invoke(&caller, vec![Value::Integer(1)]).unwrap_err();
    assert!(matches!(err, Fault::UnmatchedArity { got: 1, .. }));
}

#[test]
fn builtins_may_reenter_the_vm() {
    let vm = Vm::new();
    let ns = Namespace::user();
    let sum = closure(&vm, &ns, "(lambda (& xs) (apply + xs))");
    let result = vm
        .invoke(&sum, vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
        .unwrap();
    assert_eq!(result, Value::Integer(6));
}
