use std::cmp::Ordering;

use crate::{
    bytecode::op_code::OpCode,
    runtime::{error::Fault, value::Value},
};

/// Applies a two-operand opcode. `left` is the operand that was on top of
/// the stack.
pub(super) fn execute_binary_operation(
    op: OpCode,
    left: Value,
    right: Value,
) -> Result<Value, Fault> {
    match op {
        OpCode::Eq => Ok(Value::Bool(left == right)),
        OpCode::Cons => right.prepend(left),
        OpCode::NumEq | OpCode::NumLt | OpCode::NumLte | OpCode::NumGt | OpCode::NumGte => {
            compare(op, &left, &right).map(Value::Bool)
        }
        _ => {
            let (l, r) = (left.as_number()?, right.as_number()?);
            let result = match op {
                OpCode::Add => l.add(r),
                OpCode::Sub => l.sub(r),
                OpCode::Mul => l.mul(r),
                OpCode::Div => l.div(r)?,
                OpCode::Mod => l.rem(r)?,
                _ => panic!("{} is not a binary operation", op),
            };
            Ok(result.into())
        }
    }
}

/// Numeric comparison. Any comparison involving NaN is false.
pub(crate) fn compare(op: OpCode, left: &Value, right: &Value) -> Result<bool, Fault> {
    let ordering = left.as_number()?.compare(right.as_number()?);
    Ok(match (op, ordering) {
        (_, None) => false,
        (OpCode::NumEq, Some(o)) => o == Ordering::Equal,
        (OpCode::NumLt, Some(o)) => o == Ordering::Less,
        (OpCode::NumLte, Some(o)) => o != Ordering::Greater,
        (OpCode::NumGt, Some(o)) => o == Ordering::Greater,
        (OpCode::NumGte, Some(o)) => o != Ordering::Less,
        (other, _) => panic!("{} is not a comparison", other),
    })
}

/// Applies a one-operand opcode.
pub(super) fn execute_unary_operation(op: OpCode, operand: Value) -> Result<Value, Fault> {
    match op {
        OpCode::Neg => Ok(operand.as_number()?.neg().into()),
        OpCode::Not => Ok(Value::Bool(!operand.is_truthy())),
        OpCode::Car => operand.car(),
        OpCode::Cdr => operand.cdr(),
        OpCode::Empty => operand.is_empty().map(Value::Bool),
        other => panic!("{} is not a unary operation", other),
    }
}
