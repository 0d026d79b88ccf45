use crate::bytecode::{encoded::Encoded, op_code::OpCode};

fn fused(literal: OpCode) -> Option<OpCode> {
    match literal {
        OpCode::True => Some(OpCode::RetTrue),
        OpCode::False => Some(OpCode::RetFalse),
        OpCode::Nil => Some(OpCode::RetNull),
        _ => None,
    }
}

/// Fuses `True`/`False`/`Nil` directly followed by `Return` into one
/// return opcode.
pub(super) fn fold_literal_returns(encoded: &mut Encoded) {
    let code = std::mem::take(&mut encoded.code);
    let mut out = Vec::with_capacity(code.len());
    let mut iter = code.into_iter().peekable();
    while let Some(instruction) = iter.next() {
        let returns_next = iter
            .peek()
            .is_some_and(|next| next.opcode() == OpCode::Return);
        match fused(instruction.opcode()) {
            Some(op) if returns_next => {
                out.push(op.instr());
                iter.next();
            }
            _ => out.push(instruction),
        }
    }
    encoded.code = out;
}
