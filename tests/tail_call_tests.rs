mod common;

use alder::{Namespace, Value, Vm, bytecode::op_code::OpCode};
use common::{eval_in, run};

fn contains_tail_call(vm: &Vm, ns: &std::sync::Arc<Namespace>, name: &str) -> bool {
    match eval_in(vm, ns, name).unwrap() {
        Value::Closure(closure) => closure
            .procedure
            .code()
            .iter()
            .any(|i| i.opcode() == OpCode::TailCall),
        other => panic!("{} is not a closure: {}", name, other),
    }
}

#[test]
fn test_tail_call_deep_recursion_countdown() {
    let source = "
        (def count-down (lambda (n) (if (== n 0) 'done (count-down (- n 1)))))
        (count-down 1000000)";
    assert_eq!(common::eval(source).unwrap(), Value::symbol("done"));
}

#[test]
fn test_tail_call_factorial_accumulator() {
    let source = "
        (def fact (lambda (n acc) (if (== n 0) acc (fact (- n 1) (* acc n)))))
        (fact 20 1)";
    assert_eq!(
        common::eval(source).unwrap(),
        Value::Integer(2_432_902_008_176_640_000)
    );
}

#[test]
fn test_non_tail_recursion_still_works() {
    let source = "
        (def sum-to (lambda (n) (if (== n 0) 0 (+ n (sum-to (- n 1))))))
        (sum-to 200)";
    assert_eq!(common::eval(source).unwrap(), Value::Integer(20_100));
}

#[test]
fn test_tail_call_in_if_branches() {
    let vm = Vm::new();
    let ns = Namespace::user();
    eval_in(
        &vm,
        &ns,
        "(def collatz (lambda (n steps)
           (if (== n 1)
             steps
             (if (== (mod n 2) 0)
               (collatz (/ n 2) (+ steps 1))
               (collatz (+ (* 3 n) 1) (+ steps 1))))))",
    )
    .unwrap();
    assert!(contains_tail_call(&vm, &ns, "collatz"));
    assert_eq!(
        eval_in(&vm, &ns, "(collatz 27 0)").unwrap(),
        Value::Integer(111)
    );
}

#[test]
fn test_named_lambda_loops_in_place() {
    let source = "
        ((lambda loop (n acc) (if (== n 0) acc (loop (- n 1) (+ acc n))))
         100000 0)";
    assert_eq!(run(source), Value::Integer(5_000_050_000));
}

#[test]
fn test_mutual_recursion_through_letrec() {
    let source = "
        (letrec (even? (lambda (n) (if (== n 0) true (odd? (- n 1))))
                 odd? (lambda (n) (if (== n 0) false (even? (- n 1)))))
          (list (even? 100000) (odd? 100001) (even? 7)))";
    assert_eq!(
        run(source),
        Value::list([Value::Bool(true), Value::Bool(true), Value::Bool(false)])
    );
}

#[test]
fn test_tail_call_between_closures_of_different_sizes() {
    // `wide` needs more locals than `narrow`, so the shared frame has to
    // grow when control passes between them.
    let source = "
        (declare narrow)
        (def wide (lambda (n)
          (let (a 1 b 2 c 3 d 4 e 5 f 6 g 7 h 8 i 9 j 10)
            (narrow (- n (- j i))))))
        (def narrow (lambda (n) (if (== n 0) 'landed (wide n))))
        (wide 50000)";
    assert_eq!(common::eval(source).unwrap(), Value::symbol("landed"));
}

#[test]
fn test_tail_call_to_builtin_returns_its_result() {
    assert_eq!(
        run("((lambda (xs) (count xs)) '(1 2 3))"),
        Value::Integer(3)
    );
}
