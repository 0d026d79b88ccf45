//! Compile-time special forms. Each is bound as a value in the core
//! namespace; a static call to one runs its handler instead of a call.
use std::fmt;

use crate::{
    bytecode::{
        compiler::{CompileResult, bindings, branch, compile_block, lambda, literal},
        encoder::Encoder,
    },
    runtime::value::Value,
};

pub type SpecialFn = for<'p> fn(&mut Encoder<'p>, &[Value]) -> CompileResult<()>;

#[derive(Clone, Copy)]
pub struct Special {
    name: &'static str,
    handler: SpecialFn,
}

impl Special {
    pub const fn new(name: &'static str, handler: SpecialFn) -> Self {
        Self { name, handler }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Generates code for this form applied to the unevaluated `args`.
    pub fn expand(&self, encoder: &mut Encoder<'_>, args: &[Value]) -> CompileResult<()> {
        (self.handler)(encoder, args)
    }
}

impl PartialEq for Special {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for Special {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Special({})", self.name)
    }
}

fn compile_do(encoder: &mut Encoder<'_>, args: &[Value]) -> CompileResult<()> {
    compile_block(encoder, args)
}

pub static SPECIAL_FORMS: &[Special] = &[
    Special::new("if", branch::compile_if),
    Special::new("do", compile_do),
    Special::new("quote", literal::compile_quote),
    Special::new("lambda", lambda::compile_lambda),
    Special::new("let", bindings::compile_let),
    Special::new("letrec", bindings::compile_letrec),
    Special::new("def", bindings::compile_def),
    Special::new("declare", bindings::compile_declare),
    Special::new("private", bindings::compile_private),
];
