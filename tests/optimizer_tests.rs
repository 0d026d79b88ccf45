mod common;

use std::sync::Arc;

use alder::{
    CompileOptions, Namespace, Value, Vm,
    bytecode::op_code::{OpCode, disassemble},
    runtime::closure::Closure,
};
use common::{eval_in, read, vm_with};

const PROGRAMS: &[&str] = &[
    "(def sq (lambda (x) (* x x))) (+ (sq 3) (sq 4))",
    "(def pick (lambda ((x) x) ((x y) y))) (list (pick 1) (pick 1 2))",
    "(def k (lambda (a) (lambda (b) a))) ((k 'kept) 'dropped)",
    "(def rest (lambda (a & more) more)) (rest 1 2 3)",
    "(def nope (lambda () (panic 'no))) (recover (lambda () (nope)) (lambda (e) e))",
    "(def twice (lambda (f x) (f (f x)))) (twice (lambda (y) (+ y 10)) 1)",
    "(def add3 (lambda (a b c) (+ a b c))) (add3 (add3 1 2 3) (add3 4 5 6) 7)",
    "(declare odd) \
     (def even (lambda (n) (if (== n 0) true (odd (- n 1))))) \
     (def odd (lambda (n) (if (== n 0) false (even (- n 1))))) \
     (even 300001)",
];

fn compiled(vm: &Vm, ns: &Arc<Namespace>, source: &str) -> Arc<Closure> {
    vm.compile(ns, &read(source)).unwrap()
}

#[test]
fn test_inlining_preserves_results() {
    for source in PROGRAMS {
        let inlined = eval_in(&Vm::new(), &Namespace::user(), source).unwrap();
        let plain = eval_in(
            &vm_with(CompileOptions::without_inlining()),
            &Namespace::user(),
            source,
        )
        .unwrap();
        assert_eq!(inlined, plain, "{}", source);
    }
}

#[test]
fn test_small_global_closure_is_inlined() {
    let vm = Vm::new();
    let ns = Namespace::user();
    eval_in(&vm, &ns, "(def sq (lambda (x) (* x x)))").unwrap();

    let closure = compiled(&vm, &ns, "(+ (sq 3) 1)");
    let code = closure.procedure.code();
    assert!(
        code.iter().any(|i| i.opcode() == OpCode::PushArgs),
        "{}",
        disassemble(code)
    );
    assert!(!code.iter().any(|i| i.opcode() == OpCode::Call1));
    assert_eq!(vm.invoke(&closure, Vec::new()).unwrap(), Value::Integer(10));
}

#[test]
fn test_inlining_disabled_keeps_calls() {
    let vm = vm_with(CompileOptions::without_inlining());
    let ns = Namespace::user();
    eval_in(&vm, &ns, "(def sq (lambda (x) (* x x)))").unwrap();

    let closure = compiled(&vm, &ns, "(+ (sq 3) 1)");
    let code = closure.procedure.code();
    assert!(!code.iter().any(|i| i.opcode() == OpCode::PushArgs));
    assert!(code.iter().any(|i| i.opcode() == OpCode::Call1));
}

#[test]
fn test_self_referencing_closures_are_not_inlinable() {
    let vm = Vm::new();
    let ns = Namespace::user();
    let value = eval_in(&vm, &ns, "(lambda loop (n) (if (== n 0) 0 (loop (- n 1))))").unwrap();
    let Value::Closure(closure) = value else {
        panic!("expected a closure");
    };
    assert!(!closure.procedure.is_inlinable());
}

#[test]
fn test_long_bodies_are_not_inlinable() {
    let options = CompileOptions {
        max_inline_len: 3,
        ..CompileOptions::default()
    };
    let vm = vm_with(options);
    let ns = Namespace::user();
    let short = eval_in(&vm, &ns, "(lambda (x) x)").unwrap();
    let long = eval_in(&vm, &ns, "(lambda (x) (+ x x x x))").unwrap();
    match (short, long) {
        (Value::Closure(short), Value::Closure(long)) => {
            assert!(short.procedure.is_inlinable());
            assert!(!long.procedure.is_inlinable());
        }
        other => panic!("expected closures, got {:?}", other),
    }
}

#[test]
fn test_inlined_tail_call_stays_a_tail_call() {
    let vm = Vm::new();
    let ns = Namespace::user();
    eval_in(&vm, &ns, "(def fwd (lambda (f x) (f x)))").unwrap();
    let closure = compiled(&vm, &ns, "(fwd car '(1 2))");
    let code = closure.procedure.code();
    assert!(code.iter().any(|i| i.opcode() == OpCode::PushArgs));
    assert!(!code.iter().any(|i| i.opcode() == OpCode::PopArgs));
    assert_eq!(code.last().map(|i| i.opcode()), Some(OpCode::TailCall));
    assert_eq!(vm.invoke(&closure, Vec::new()).unwrap(), Value::Integer(1));
}

#[test]
fn test_mutual_recursion_through_an_inlined_callee_stays_flat() {
    let vm = Vm::new();
    let ns = Namespace::user();
    eval_in(
        &vm,
        &ns,
        "(declare od)
         (def ev (lambda (n) (if (== n 0) true (od (- n 1)))))
         (def od (lambda (n) (if (== n 0) false (ev (- n 1)))))",
    )
    .unwrap();

    let Value::Closure(od) = eval_in(&vm, &ns, "od").unwrap() else {
        panic!("od is not a closure");
    };
    let code = od.procedure.code();
    assert!(
        code.iter().any(|i| i.opcode() == OpCode::PushArgs),
        "{}",
        disassemble(code)
    );
    assert!(
        !code
            .iter()
            .any(|i| matches!(i.opcode(), OpCode::Call | OpCode::Call1)),
        "{}",
        disassemble(code)
    );

    assert_eq!(
        eval_in(&vm, &ns, "(ev 1000001)").unwrap(),
        Value::Bool(false)
    );
    let plain = vm_with(CompileOptions::without_inlining());
    assert_eq!(
        eval_in(
            &plain,
            &Namespace::user(),
            "(declare od)
             (def ev (lambda (n) (if (== n 0) true (od (- n 1)))))
             (def od (lambda (n) (if (== n 0) false (ev (- n 1)))))
             (ev 1000001)"
        )
        .unwrap(),
        Value::Bool(false)
    );
}
