use crate::{
    bytecode::{
        compiler::{CompileError, CompileResult, compile_form},
        encoder::Encoder,
        op_code::OpCode,
    },
    runtime::value::Value,
};

/// `(if predicate consequent alternative?)`
///
/// ```text
///     <predicate>
///     CondJump then
///     <alternative>
///     Jump end
/// then:
///     <consequent>
/// end:
/// ```
pub(super) fn compile_if(encoder: &mut Encoder<'_>, args: &[Value]) -> CompileResult<()> {
    let (predicate, consequent, alternative) = match args {
        [p, c] => (p, c, None),
        [p, c, a] => (p, c, Some(a)),
        _ => {
            return Err(CompileError::bad_form(
                "if",
                "expects a predicate, a consequent and an optional alternative",
            ));
        }
    };

    let then = encoder.new_label();
    let end = encoder.new_label();

    compile_form(encoder, predicate)?;
    encoder.emit_with(OpCode::CondJump, then)?;
    match alternative {
        Some(form) => compile_form(encoder, form)?,
        None => encoder.emit(OpCode::Nil),
    }
    encoder.emit_with(OpCode::Jump, end)?;
    encoder.anchor(then)?;
    compile_form(encoder, consequent)?;
    encoder.anchor(end)
}
