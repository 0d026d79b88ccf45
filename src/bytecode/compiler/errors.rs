use thiserror::Error;

use crate::{
    bytecode::op_code::EncodingError,
    runtime::{symbol::Symbol, value::Value},
};

/// Errors raised while compiling one form. They abort that form only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("label {0} is referenced but never anchored")]
    UnanchoredLabel(usize),
    #[error("label {0} is anchored more than once")]
    DuplicateLabel(usize),
    #[error("stack depth mismatch at instruction {pc}: {expected} vs {found}")]
    StackImbalance {
        pc: usize,
        expected: usize,
        found: usize,
    },
    #[error("stack underflow at instruction {pc}")]
    StackUnderflow { pc: usize },
    #[error("code falls off the end without returning")]
    MissingReturn,
    #[error("`{0}` is already bound in this scope")]
    DuplicateBinding(Symbol),
    #[error("parameter case `{0}` can never be reached")]
    UnreachableCase(String),
    #[error("`{name}` expects {expected} arguments, got {got}")]
    ArityMismatch {
        name: String,
        expected: String,
        got: usize,
    },
    #[error("malformed `{form}`: {reason}")]
    BadForm { form: &'static str, reason: String },
}

impl CompileError {
    pub(crate) fn bad_form(form: &'static str, reason: impl Into<String>) -> Self {
        CompileError::BadForm {
            form,
            reason: reason.into(),
        }
    }

    pub(crate) fn expected_symbol(form: &'static str, found: &Value) -> Self {
        Self::bad_form(form, format!("expected a symbol, got `{}`", found))
    }
}
