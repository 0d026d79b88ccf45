use std::sync::Arc;

use crate::{
    bytecode::op_code::{Instruction, Instructions, OpCode},
    runtime::{namespace::Namespace, symbol::Symbol, value::Value},
};

/// A finished, not yet verified compilation unit.
///
/// Every label a jump references must be anchored exactly once by a
/// `Label` instruction; the verifier enforces this before a procedure is
/// built from the unit.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub code: Instructions,
    pub constants: Vec<Value>,
    pub local_count: usize,
    pub label_count: usize,
    pub globals: Arc<Namespace>,
    pub name: Option<Symbol>,
}

impl Encoded {
    /// Adds `value` to the constant pool unless an equal value is present.
    pub fn add_constant(&mut self, value: Value) -> usize {
        add_constant(&mut self.constants, value)
    }

    pub fn contains_op(&self, op: OpCode) -> bool {
        self.code.iter().any(|i| i.opcode() == op)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.code
    }
}

pub(crate) fn add_constant(constants: &mut Vec<Value>, value: Value) -> usize {
    if let Some(index) = constants.iter().position(|c| *c == value) {
        return index;
    }
    constants.push(value);
    constants.len() - 1
}
