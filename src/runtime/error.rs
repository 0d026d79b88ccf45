use thiserror::Error;

use crate::runtime::{symbol::Symbol, value::Value};

/// A runtime fault. Faults unwind through the interpreter loop and the host
/// call chain as `Err` values until a `recover` intercepts them or they
/// reach the top-level caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Fault {
    #[error("type mismatch: expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("division by zero")]
    DivideByZero,
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("wrong number of arguments: expected {expected}, got {got}")]
    UnmatchedArity { expected: String, got: usize },
    #[error("symbol `{0}` is not bound")]
    UnboundSymbol(Symbol),
    #[error("symbol `{0}` is already bound")]
    AlreadyBound(Symbol),
    #[error("reference dereferenced before it was bound")]
    UnboundRef,
    #[error("reference is already bound")]
    RefAlreadyBound,
    #[error("{0}")]
    Panic(Value),
}

impl Fault {
    pub fn mismatch(expected: &'static str, found: &Value) -> Self {
        Fault::TypeMismatch {
            expected,
            found: found.type_name(),
        }
    }

    /// The value a `recover` handler receives.
    pub fn to_value(&self) -> Value {
        match self {
            Fault::Panic(value) => value.clone(),
            other => Value::string(&other.to_string()),
        }
    }
}
