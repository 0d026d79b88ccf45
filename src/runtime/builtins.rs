//! The core builtins. Several carry an intrinsic opcode so that static calls
//! with a fitting argument count compile to the opcode instead of a call.
use std::sync::Arc;

use crate::{
    bytecode::{compiler::special::SPECIAL_FORMS, op_code::OpCode},
    runtime::{
        arity::Arity,
        builtin_function::{Builtin, Intrinsic},
        error::Fault,
        namespace::Namespace,
        number::Number,
        symbol::Symbol,
        value::Value,
        vm::{Vm, compare},
    },
};

fn numbers(args: &[Value]) -> Result<Vec<Number>, Fault> {
    args.iter().map(Value::as_number).collect()
}

fn builtin_add(_: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
    let sum = numbers(&args)?
        .into_iter()
        .fold(Number::Integer(0), Number::add);
    Ok(sum.into())
}

fn builtin_mul(_: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
    let product = numbers(&args)?
        .into_iter()
        .fold(Number::Integer(1), Number::mul);
    Ok(product.into())
}

fn builtin_sub(_: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
    let numbers = numbers(&args)?;
    match numbers.split_first() {
        Some((first, [])) => Ok(first.neg().into()),
        Some((first, rest)) => Ok(rest.iter().fold(*first, |acc, n| acc.sub(*n)).into()),
        None => Err(Fault::UnmatchedArity {
            expected: Arity::at_least(1).to_string(),
            got: 0,
        }),
    }
}

fn builtin_div(_: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
    let numbers = numbers(&args)?;
    match numbers.split_first() {
        Some((first, [])) => Ok(Number::Integer(1).div(*first)?.into()),
        Some((first, rest)) => {
            let mut quotient = *first;
            for n in rest {
                quotient = quotient.div(*n)?;
            }
            Ok(quotient.into())
        }
        None => Err(Fault::UnmatchedArity {
            expected: Arity::at_least(1).to_string(),
            got: 0,
        }),
    }
}

fn builtin_mod(_: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
    Ok(args[0].as_number()?.rem(args[1].as_number()?)?.into())
}

/// Checks `op` between every adjacent pair of arguments.
fn chain(op: OpCode, args: &[Value]) -> Result<Value, Fault> {
    for pair in args.windows(2) {
        let holds = match op {
            OpCode::Eq => pair[0] == pair[1],
            _ => compare(op, &pair[0], &pair[1])?,
        };
        if !holds {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

fn builtin_not(_: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
    Ok(Value::Bool(!args[0].is_truthy()))
}

fn builtin_car(_: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
    args[0].car()
}

fn builtin_cdr(_: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
    args[0].cdr()
}

fn builtin_cons(_: &Vm, mut args: Vec<Value>) -> Result<Value, Fault> {
    let item = std::mem::take(&mut args[0]);
    args[1].prepend(item)
}

fn builtin_list(_: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
    Ok(Value::list(args))
}

fn builtin_vector(_: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
    Ok(Value::vector(args))
}

/// `vector`, also the target of vector forms whose elements need evaluating.
pub fn vector_constructor() -> Builtin {
    Builtin::new("vector", Arity::any(), builtin_vector)
}

fn builtin_is_empty(_: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
    args[0].is_empty().map(Value::Bool)
}

fn builtin_count(_: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
    Ok(Value::Integer(args[0].to_vec()?.len() as i64))
}

fn builtin_nth(_: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
    let index = match &args[1] {
        Value::Integer(i) => *i,
        other => return Err(Fault::mismatch("integer", other)),
    };
    let items = args[0].to_vec()?;
    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i).cloned())
        .ok_or(Fault::IndexOutOfRange {
            index,
            len: items.len(),
        })
}

/// `(apply f a b ... list)` calls `f` with the leading values followed by
/// the elements of the trailing list.
fn builtin_apply(vm: &Vm, mut args: Vec<Value>) -> Result<Value, Fault> {
    let spread = args.pop().unwrap_or_default().to_vec()?;
    let callee = args.remove(0);
    args.extend(spread);
    vm.call(&callee, args)
}

/// `(recover thunk handler)` calls `thunk`; if it faults, calls `handler`
/// with the fault as a value instead.
fn builtin_recover(vm: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
    match vm.call(&args[0], Vec::new()) {
        Ok(value) => Ok(value),
        Err(fault) => vm.call(&args[1], vec![fault.to_value()]),
    }
}

fn builtin_panic(_: &Vm, mut args: Vec<Value>) -> Result<Value, Fault> {
    Err(Fault::Panic(std::mem::take(&mut args[0])))
}

fn comparison(name: &str, op: OpCode) -> Builtin {
    Builtin::new(name, Arity::at_least(1), move |_, args| chain(op, &args))
        .with_intrinsic(Intrinsic::Binary(op))
}

/// Every core builtin, in binding order.
pub fn core_builtins() -> Vec<Builtin> {
    vec![
        Builtin::new("+", Arity::any(), builtin_add).with_intrinsic(Intrinsic::Fold(OpCode::Add)),
        Builtin::new("-", Arity::at_least(1), builtin_sub)
            .with_intrinsic(Intrinsic::Binary(OpCode::Sub)),
        Builtin::new("*", Arity::any(), builtin_mul).with_intrinsic(Intrinsic::Fold(OpCode::Mul)),
        Builtin::new("/", Arity::at_least(1), builtin_div)
            .with_intrinsic(Intrinsic::Binary(OpCode::Div)),
        Builtin::new("mod", Arity::fixed(2), builtin_mod)
            .with_intrinsic(Intrinsic::Binary(OpCode::Mod)),
        comparison("=", OpCode::Eq),
        comparison("==", OpCode::NumEq),
        comparison("<", OpCode::NumLt),
        comparison("<=", OpCode::NumLte),
        comparison(">", OpCode::NumGt),
        comparison(">=", OpCode::NumGte),
        Builtin::new("not", Arity::fixed(1), builtin_not)
            .with_intrinsic(Intrinsic::Unary(OpCode::Not)),
        Builtin::new("car", Arity::fixed(1), builtin_car)
            .with_intrinsic(Intrinsic::Unary(OpCode::Car)),
        Builtin::new("cdr", Arity::fixed(1), builtin_cdr)
            .with_intrinsic(Intrinsic::Unary(OpCode::Cdr)),
        Builtin::new("cons", Arity::fixed(2), builtin_cons)
            .with_intrinsic(Intrinsic::Binary(OpCode::Cons)),
        Builtin::new("list", Arity::any(), builtin_list),
        vector_constructor(),
        Builtin::new("empty?", Arity::fixed(1), builtin_is_empty)
            .with_intrinsic(Intrinsic::Unary(OpCode::Empty)),
        Builtin::new("nth", Arity::fixed(2), builtin_nth),
        Builtin::new("count", Arity::fixed(1), builtin_count),
        Builtin::new("apply", Arity::at_least(2), builtin_apply),
        Builtin::new("recover", Arity::fixed(2), builtin_recover),
        Builtin::new("panic", Arity::fixed(1), builtin_panic),
    ]
}

/// Binds the special forms and core builtins into `namespace`.
pub fn install(namespace: &Namespace) -> Result<(), Fault> {
    for special in SPECIAL_FORMS {
        namespace.bind(&Symbol::new(special.name()), Value::Special(*special))?;
    }
    for builtin in core_builtins() {
        let name = Symbol::new(builtin.name());
        namespace.bind(&name, Value::Builtin(Arc::new(builtin)))?;
    }
    Ok(())
}

impl Namespace {
    /// A fresh `core` namespace holding the special forms and builtins.
    pub fn core() -> Arc<Namespace> {
        let core = Namespace::new("core");
        if let Err(fault) = install(&core) {
            panic!("core namespace bound twice: {}", fault);
        }
        core
    }

    /// A fresh `user` namespace on top of a fresh core.
    pub fn user() -> Arc<Namespace> {
        Namespace::child(&Namespace::core(), "user")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Value>) -> Result<Value, Fault> {
        let vm = Vm::new();
        let ns = Namespace::core();
        let builtin = ns.resolve(&Symbol::new(name)).unwrap();
        vm.call(&builtin, args)
    }

    #[test]
    fn arithmetic_folds_over_arguments() {
        let args = vec![Value::Integer(10), Value::Integer(3), Value::Integer(2)];
        assert_eq!(call("+", args.clone()).unwrap(), Value::Integer(15));
        assert_eq!(call("-", args.clone()).unwrap(), Value::Integer(5));
        assert_eq!(call("*", args).unwrap(), Value::Integer(60));
        assert_eq!(call("-", vec![Value::Integer(4)]).unwrap(), Value::Integer(-4));
        assert_eq!(call("+", vec![]).unwrap(), Value::Integer(0));
        assert_eq!(
            call("/", vec![Value::Integer(1), Value::Integer(0)]).unwrap_err(),
            Fault::DivideByZero
        );
    }

    #[test]
    fn comparisons_chain() {
        let ascending = vec![Value::Integer(1), Value::Integer(2), Value::Float(2.5)];
        assert_eq!(call("<", ascending.clone()).unwrap(), Value::Bool(true));
        assert_eq!(call(">", ascending).unwrap(), Value::Bool(false));
        assert_eq!(
            call("==", vec![Value::Integer(2), Value::Float(2.0)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            call("=", vec![Value::Integer(2), Value::Float(2.0)]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn nth_reports_out_of_range() {
        let list = Value::list([Value::Integer(1)]);
        assert_eq!(
            call("nth", vec![list.clone(), Value::Integer(0)]).unwrap(),
            Value::Integer(1)
        );
        assert_eq!(
            call("nth", vec![list, Value::Integer(3)]).unwrap_err(),
            Fault::IndexOutOfRange { index: 3, len: 1 }
        );
    }

    #[test]
    fn apply_spreads_the_last_argument() {
        let ns = Namespace::core();
        let plus = ns.resolve(&Symbol::new("+")).unwrap();
        let result = call(
            "apply",
            vec![
                plus,
                Value::Integer(1),
                Value::list([Value::Integer(2), Value::Integer(3)]),
            ],
        )
        .unwrap();
        assert_eq!(result, Value::Integer(6));
    }

    #[test]
    fn builtins_check_their_arity() {
        let err = call("car", vec![]).unwrap_err();
        assert_eq!(
            err,
            Fault::UnmatchedArity {
                expected: "1".to_string(),
                got: 0
            }
        );
    }

    #[test]
    fn user_namespace_sees_core() {
        let user = Namespace::user();
        assert!(user.is_bound(&Symbol::new("lambda")));
        assert!(user.is_bound(&Symbol::new("recover")));
    }
}
