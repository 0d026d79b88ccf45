//! Code generation: stateless functions that walk forms and emit
//! instructions through an [`Encoder`].
use std::sync::Arc;

use crate::{
    bytecode::{encoder::Encoder, op_code::OpCode},
    config::CompileOptions,
    runtime::{arity::Arity, namespace::Namespace, procedure::Procedure, value::Value},
};

mod bindings;
mod branch;
mod call;
mod errors;
mod lambda;
mod literal;
pub mod special;
mod symbol;

pub use errors::CompileError;
pub use lambda::{ParamCase, ParamCases};

pub type CompileResult<T> = Result<T, CompileError>;


/// Compiles `form` as the body of a procedure taking no arguments.
pub fn compile(
    globals: &Arc<Namespace>,
    form: &Value,
    options: &CompileOptions,
) -> CompileResult<Arc<Procedure>> {
    let mut encoder = Encoder::new(Arc::clone(globals), options.clone());
    compile_form(&mut encoder, form)?;
    encoder.emit(OpCode::Return);
    let procedure = Procedure::new(encoder.finish(), Arity::fixed(0), options)?;
    Ok(Arc::new(procedure))
}

/// Emits code leaving the value of `form` on the operand stack.
///
/// Symbols are looked up and lists are calls. A vector evaluates each of
/// its elements, but one holding only self-evaluating values is a constant.
/// Everything else evaluates to itself.
pub fn compile_form(encoder: &mut Encoder<'_>, form: &Value) -> CompileResult<()> {
    match form {
        Value::Symbol(name) => symbol::compile_symbol(encoder, name),
        Value::Pair(_) => call::compile_call(encoder, form),
        Value::Vector(items) if !literal::is_constant(form) => {
            call::compile_vector(encoder, items)
        }
        other => literal::compile_literal(encoder, other),
    }
}

/// Emits `forms` in order, keeping only the last value. An empty block is
/// null.
pub fn compile_block(encoder: &mut Encoder<'_>, forms: &[Value]) -> CompileResult<()> {
    let Some((last, init)) = forms.split_last() else {
        encoder.emit(OpCode::Nil);
        return Ok(());
    };
    for form in init {
        compile_form(encoder, form)?;
        encoder.emit(OpCode::Pop);
    }
    compile_form(encoder, last)
}

/// The elements of a list or vector form.
pub(crate) fn form_items(form: &'static str, value: &Value) -> CompileResult<Vec<Value>> {
    value
        .to_vec()
        .map_err(|_| CompileError::bad_form(form, format!("expected a list, got `{}`", value)))
}
