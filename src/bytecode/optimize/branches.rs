use crate::bytecode::{encoded::Encoded, op_code::OpCode};

use super::{label_addresses, skip_labels};

/// Replaces a `Jump` whose target label leads straight to `Return` with the
/// `Return` itself.
///
/// A branch's alternative jumps to the shared epilogue after the
/// consequent; when that epilogue is just a return, both arms now end in
/// their own `Return`, which exposes calls in either arm to tail-call
/// conversion.
pub(super) fn normalize_branch_returns(encoded: &mut Encoded) {
    let addresses = label_addresses(&encoded.code);
    for pc in 0..encoded.code.len() {
        let instruction = encoded.code[pc];
        if instruction.opcode() != OpCode::Jump {
            continue;
        }
        let Some(Some(target)) = addresses.get(instruction.operand()) else {
            continue;
        };
        if let Some((_, next)) = skip_labels(&encoded.code, *target) {
            if next.opcode() == OpCode::Return {
                encoded.code[pc] = OpCode::Return.instr();
            }
        }
    }
}
