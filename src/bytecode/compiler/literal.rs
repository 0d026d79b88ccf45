use crate::{
    bytecode::{
        compiler::{CompileError, CompileResult},
        encoder::Encoder,
        op_code::{MAX_OPERAND, OpCode},
    },
    runtime::value::Value,
};

/// Emits the cheapest instruction that pushes `value`.
pub(super) fn compile_literal(encoder: &mut Encoder<'_>, value: &Value) -> CompileResult<()> {
    match value {
        Value::Null => encoder.emit(OpCode::Nil),
        Value::Bool(true) => encoder.emit(OpCode::True),
        Value::Bool(false) => encoder.emit(OpCode::False),
        Value::Integer(n) if n.unsigned_abs() <= MAX_OPERAND as u64 => {
            let op = if *n < 0 { OpCode::NegInt } else { OpCode::PosInt };
            encoder.emit_with(op, n.unsigned_abs() as usize)?;
        }
        other => encoder.emit_const(other.clone())?,
    }
    Ok(())
}

/// Whether `form` evaluates to itself.
pub(super) fn is_constant(form: &Value) -> bool {
    match form {
        Value::Symbol(_) | Value::Pair(_) => false,
        Value::Vector(items) => items.iter().all(is_constant),
        _ => true,
    }
}

/// `(quote form)`
pub(super) fn compile_quote(encoder: &mut Encoder<'_>, args: &[Value]) -> CompileResult<()> {
    match args {
        [form] => compile_literal(encoder, form),
        _ => Err(CompileError::bad_form("quote", "expects exactly one form")),
    }
}
