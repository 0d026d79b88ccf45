use crate::bytecode::{
    compiler::CompileResult,
    encoded::Encoded,
    op_code::{Instruction, OpCode},
};

use super::skip_labels;

fn argument_count(instruction: Instruction) -> Option<usize> {
    match instruction.opcode() {
        OpCode::Call0 => Some(0),
        OpCode::Call1 => Some(1),
        OpCode::Call => Some(instruction.operand()),
        _ => None,
    }
}

/// Rewrites calls in tail position into `TailCall`.
///
/// A call is in tail position when only labels stand between it and a
/// `Return`. The `Return` is dropped when it directly follows the call;
/// otherwise other paths still jump to it.
pub(super) fn convert_tail_calls(encoded: &mut Encoded) -> CompileResult<()> {
    let code = std::mem::take(&mut encoded.code);
    let mut out = Vec::with_capacity(code.len());
    let mut pc = 0;
    while pc < code.len() {
        let instruction = code[pc];
        pc += 1;
        let Some(count) = argument_count(instruction) else {
            out.push(instruction);
            continue;
        };
        match skip_labels(&code, pc) {
            Some((at, next)) if next.opcode() == OpCode::Return => {
                out.push(OpCode::TailCall.with(count)?);
                if at == pc {
                    pc += 1;
                }
            }
            _ => out.push(instruction),
        }
    }
    encoded.code = out;
    Ok(())
}
