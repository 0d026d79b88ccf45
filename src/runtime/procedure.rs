use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use tracing::debug;

use crate::{
    bytecode::{
        compiler::CompileResult,
        encoded::Encoded,
        op_code::{Instruction, Instructions, OpCode},
        optimize,
        verify::verify,
    },
    config::CompileOptions,
    runtime::{
        arity::Arity, closure::Closure, namespace::Namespace, symbol::Symbol, value::Value,
    },
};

/// An immutable compiled body. Invoking a procedure with captured values
/// does not run it; it instantiates a [`Closure`].
pub struct Procedure {
    pub(crate) code: Instructions,
    pub(crate) constants: Vec<Value>,
    /// Instruction address of each label.
    pub(crate) labels: Vec<usize>,
    pub(crate) stack_size: usize,
    pub(crate) local_count: usize,
    pub(crate) label_count: usize,
    arity: Arity,
    globals: Arc<Namespace>,
    name: Option<Symbol>,
    inlinable: bool,
}

impl Procedure {
    /// Optimizes and verifies `encoded`, then freezes it.
    pub fn new(encoded: Encoded, arity: Arity, options: &CompileOptions) -> CompileResult<Self> {
        let encoded = optimize::optimize(encoded, options)?;
        let verified = verify(&encoded)?;
        let inlinable = encoded.code.len() <= options.max_inline_len
            && !encoded
                .code
                .iter()
                .any(|i| matches!(i.opcode(), OpCode::PushArgs | OpCode::Current));

        debug!(
            name = encoded.name.as_ref().map(Symbol::as_str),
            code_len = encoded.code.len(),
            stack_size = verified.stack_size,
            locals = encoded.local_count,
            inlinable,
            "built procedure"
        );

        Ok(Self {
            code: encoded.code,
            constants: encoded.constants,
            labels: verified.labels,
            stack_size: verified.stack_size,
            local_count: encoded.local_count,
            label_count: encoded.label_count,
            arity,
            globals: encoded.globals,
            name: encoded.name,
            inlinable,
        })
    }

    /// Captures `captured` into a new closure over this body.
    pub fn instantiate(self: &Arc<Self>, captured: &[Value]) -> Closure {
        Closure::new(Arc::clone(self), captured.to_vec())
    }

    pub fn arity(&self) -> &Arity {
        &self.arity
    }

    pub fn name(&self) -> Option<&Symbol> {
        self.name.as_ref()
    }

    pub fn globals(&self) -> &Arc<Namespace> {
        &self.globals
    }

    pub fn code(&self) -> &[Instruction] {
        &self.code
    }

    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    pub fn stack_size(&self) -> usize {
        self.stack_size
    }

    pub fn local_count(&self) -> usize {
        self.local_count
    }

    /// Slots one call needs: operand stack plus locals.
    pub fn frame_size(&self) -> usize {
        self.stack_size + self.local_count
    }

    pub fn is_inlinable(&self) -> bool {
        self.inlinable
    }
}

/// Structural: two procedures are equal when they accept the same argument
/// counts and run the same code against the same constants and globals.
impl PartialEq for Procedure {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
            || (self.arity == other.arity
                && self.code == other.code
                && self.constants == other.constants
                && Arc::ptr_eq(&self.globals, &other.globals))
    }
}

impl Eq for Procedure {}

impl Hash for Procedure {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.arity.hash(state);
        self.code.hash(state);
        self.constants.hash(state);
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("code_len", &self.code.len())
            .field("stack_size", &self.stack_size)
            .field("local_count", &self.local_count)
            .finish()
    }
}
