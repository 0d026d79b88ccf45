use std::sync::Arc;

use crate::{
    bytecode::{
        compiler::{CompileError, CompileResult, compile_form, form_items, symbol::emit_resolve},
        encoder::Encoder,
        op_code::OpCode,
    },
    runtime::{builtins::vector_constructor, symbol::Symbol, value::Value},
};

/// `(head args...)`
///
/// A symbol head that is not lexical and is bound globally at compile time
/// is a static target. Anything else is called through a runtime lookup or
/// by evaluating the head.
pub(super) fn compile_call(encoder: &mut Encoder<'_>, form: &Value) -> CompileResult<()> {
    let items = form_items("call", form)?;
    let Some((head, args)) = items.split_first() else {
        return Err(CompileError::bad_form("call", "empty call"));
    };

    if let Value::Symbol(name) = head {
        if !encoder.is_lexical(name) {
            return match encoder.globals().resolve(name) {
                Ok(target) => compile_static(encoder, name, target, args),
                Err(_) => {
                    compile_args(encoder, args)?;
                    emit_resolve(encoder, name)?;
                    emit_call(encoder, args.len())
                }
            };
        }
    }

    compile_args(encoder, args)?;
    compile_form(encoder, head)?;
    emit_call(encoder, args.len())
}

fn compile_static(
    encoder: &mut Encoder<'_>,
    name: &Symbol,
    target: Value,
    args: &[Value],
) -> CompileResult<()> {
    match &target {
        Value::Special(special) => return special.expand(encoder, args),
        Value::Builtin(builtin) => {
            if let Some((op, times)) = builtin.intrinsic().and_then(|i| i.expand(args.len())) {
                compile_args(encoder, args)?;
                for _ in 0..times {
                    encoder.emit(op);
                }
                return Ok(());
            }
        }
        _ => {}
    }

    if let Ok(callable) = target.as_callable() {
        let arity = callable.arity();
        if !arity.accepts(args.len()) {
            return Err(CompileError::ArityMismatch {
                name: name.to_string(),
                expected: arity.to_string(),
                got: args.len(),
            });
        }
    }

    compile_args(encoder, args)?;
    encoder.emit_const(target)?;
    emit_call(encoder, args.len())
}

/// `[items...]` with at least one element that needs evaluating: a call
/// to `vector`.
pub(super) fn compile_vector(encoder: &mut Encoder<'_>, items: &[Value]) -> CompileResult<()> {
    compile_args(encoder, items)?;
    encoder.emit_const(Value::Builtin(Arc::new(vector_constructor())))?;
    emit_call(encoder, items.len())
}

/// Arguments are emitted last to first, so the first argument ends on top
/// and the last one is evaluated first.
fn compile_args(encoder: &mut Encoder<'_>, args: &[Value]) -> CompileResult<()> {
    for arg in args.iter().rev() {
        compile_form(encoder, arg)?;
    }
    Ok(())
}

fn emit_call(encoder: &mut Encoder<'_>, count: usize) -> CompileResult<()> {
    match count {
        0 => encoder.emit(OpCode::Call0),
        1 => encoder.emit(OpCode::Call1),
        n => encoder.emit_with(OpCode::Call, n)?,
    }
    Ok(())
}
