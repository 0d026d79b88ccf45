//! Whole-unit rewrites applied to a freshly generated instruction stream.
//!
//! Passes run in a fixed order, each on the output of the previous one:
//! branch-return normalization, literal-return folding, tail-call
//! conversion and inlining. None of them changes observable behavior.
use crate::{
    bytecode::{
        compiler::CompileResult,
        encoded::Encoded,
        op_code::{ActOn, Instruction, OpCode},
    },
    config::CompileOptions,
};

mod branches;
mod inline;
mod literals;
mod tail_calls;


pub fn optimize(mut encoded: Encoded, options: &CompileOptions) -> CompileResult<Encoded> {
    branches::normalize_branch_returns(&mut encoded);
    literals::fold_literal_returns(&mut encoded);
    tail_calls::convert_tail_calls(&mut encoded)?;
    if options.inline {
        inline::inline_calls(&mut encoded, options)?;
    }
    Ok(encoded)
}

/// The first instruction at or after `from` that is not a label.
fn skip_labels(code: &[Instruction], from: usize) -> Option<(usize, Instruction)> {
    code.iter()
        .enumerate()
        .skip(from)
        .find(|(_, i)| i.opcode() != OpCode::Label)
        .map(|(pc, i)| (pc, *i))
}

/// Address of each anchored label, indexed by label number.
fn label_addresses(code: &[Instruction]) -> Vec<Option<usize>> {
    let mut addresses = Vec::new();
    for (pc, instruction) in code.iter().enumerate() {
        let effect = instruction.effect();
        if effect.operand == ActOn::Labels && effect.anchors {
            let label = instruction.operand();
            if addresses.len() <= label {
                addresses.resize(label + 1, None);
            }
            addresses[label] = Some(pc);
        }
    }
    addresses
}
