use std::{fmt, sync::Arc};

use crate::{
    bytecode::op_code::OpCode,
    runtime::{arity::Arity, error::Fault, value::Value, vm::Vm},
};

pub type BuiltinFn = Arc<dyn Fn(&Vm, Vec<Value>) -> Result<Value, Fault> + Send + Sync>;

/// How a static call to a builtin may be expanded in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    /// One argument, one opcode.
    Unary(OpCode),
    /// Exactly two arguments, one opcode.
    Binary(OpCode),
    /// Two or more arguments folded left with `n - 1` opcodes.
    Fold(OpCode),
}

impl Intrinsic {
    /// The opcode and repeat count for a call with `count` arguments, if the
    /// call can be expanded.
    pub fn expand(self, count: usize) -> Option<(OpCode, usize)> {
        match self {
            Intrinsic::Unary(op) if count == 1 => Some((op, 1)),
            Intrinsic::Binary(op) if count == 2 => Some((op, 1)),
            Intrinsic::Fold(op) if count >= 2 => Some((op, count - 1)),
            _ => None,
        }
    }
}

/// A host function callable from bytecode.
pub struct Builtin {
    name: String,
    arity: Arity,
    intrinsic: Option<Intrinsic>,
    func: BuiltinFn,
}

impl Builtin {
    pub fn new<F>(name: &str, arity: Arity, func: F) -> Self
    where
        F: Fn(&Vm, Vec<Value>) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            arity,
            intrinsic: None,
            func: Arc::new(func),
        }
    }

    pub fn with_intrinsic(mut self, intrinsic: Intrinsic) -> Self {
        self.intrinsic = Some(intrinsic);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn intrinsic(&self) -> Option<Intrinsic> {
        self.intrinsic
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Anything the `Call` opcodes can invoke.
pub trait Callable {
    fn arity(&self) -> &Arity;

    fn call(&self, vm: &Vm, args: Vec<Value>) -> Result<Value, Fault>;

    fn check_arity(&self, count: usize) -> Result<(), Fault> {
        self.arity().check(count)
    }
}

impl Callable for Builtin {
    fn arity(&self) -> &Arity {
        &self.arity
    }

    fn call(&self, vm: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
        self.check_arity(args.len())?;
        (self.func)(vm, args)
    }
}
