use crate::{
    bytecode::{compiler::CompileResult, encoder::Encoder, op_code::OpCode},
    runtime::{symbol::Symbol, value::Value},
};

/// Lexical names load from their cell. Globals bound at compile time are
/// bind-once and load as constants; the rest resolve at run time.
pub(super) fn compile_symbol(encoder: &mut Encoder<'_>, name: &Symbol) -> CompileResult<()> {
    if let Some(cell) = encoder.resolve(name) {
        return encoder.load(cell);
    }
    match encoder.globals().resolve(name) {
        Ok(value) => encoder.emit_const(value),
        Err(_) => emit_resolve(encoder, name),
    }
}

pub(super) fn emit_resolve(encoder: &mut Encoder<'_>, name: &Symbol) -> CompileResult<()> {
    encoder.emit_const(Value::Symbol(name.clone()))?;
    encoder.emit(OpCode::Resolve);
    Ok(())
}
