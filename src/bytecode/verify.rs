//! Static verification of an encoded unit.
//!
//! Walks every control-flow path with the opcode effect table, checking that
//! labels are anchored exactly once, that each instruction is reached with a
//! single stack depth, and that no path pops more than it pushed. The
//! deepest point reached becomes the unit's operand stack size. The
//! interpreter relies on all of this and does not re-check it.
use crate::bytecode::{
    compiler::{CompileError, CompileResult},
    encoded::Encoded,
    op_code::{ActOn, Instruction},
};

/// Label addresses for a unit that has no jump to that label.
pub const UNANCHORED: usize = usize::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    pub stack_size: usize,
    /// Address of each label's anchor, indexed by label number.
    pub labels: Vec<usize>,
}

pub fn verify(encoded: &Encoded) -> CompileResult<Verified> {
    let code = &encoded.code;
    let labels = anchor_labels(code, encoded.label_count)?;

    let mut depths: Vec<Option<usize>> = vec![None; code.len()];
    let mut work = vec![(0usize, 0usize)];
    let mut stack_size = 0;

    while let Some((pc, depth)) = work.pop() {
        let Some(instruction) = code.get(pc) else {
            return Err(CompileError::MissingReturn);
        };
        match depths[pc] {
            Some(seen) if seen == depth => continue,
            Some(seen) => {
                return Err(CompileError::StackImbalance {
                    pc,
                    expected: seen,
                    found: depth,
                });
            }
            None => depths[pc] = Some(depth),
        }

        let effect = instruction.effect();
        let pops = instruction.pops();
        if pops > depth {
            return Err(CompileError::StackUnderflow { pc });
        }
        let next = depth - pops + effect.push;
        stack_size = stack_size.max(next);

        if effect.operand == ActOn::Labels && !effect.anchors {
            work.push((labels[instruction.operand()], next));
        }
        if !effect.exits {
            work.push((pc + 1, next));
        }
    }

    Ok(Verified { stack_size, labels })
}

fn anchor_labels(code: &[Instruction], label_count: usize) -> CompileResult<Vec<usize>> {
    let highest = code
        .iter()
        .filter(|i| i.effect().operand == ActOn::Labels)
        .map(|i| i.operand() + 1)
        .max()
        .unwrap_or(0);
    let mut labels = vec![UNANCHORED; label_count.max(highest)];

    for (pc, instruction) in code.iter().enumerate() {
        if instruction.effect().anchors {
            let slot = &mut labels[instruction.operand()];
            if *slot != UNANCHORED {
                return Err(CompileError::DuplicateLabel(instruction.operand()));
            }
            *slot = pc;
        }
    }

    for instruction in code {
        let effect = instruction.effect();
        if effect.operand == ActOn::Labels
            && !effect.anchors
            && labels[instruction.operand()] == UNANCHORED
        {
            return Err(CompileError::UnanchoredLabel(instruction.operand()));
        }
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bytecode::op_code::{Instructions, OpCode},
        runtime::namespace::Namespace,
    };

    fn unit(code: Instructions, label_count: usize) -> Encoded {
        Encoded {
            code,
            constants: Vec::new(),
            local_count: 0,
            label_count,
            globals: Namespace::new("test"),
            name: None,
        }
    }

    fn op(op: OpCode, operand: usize) -> Instruction {
        op.with(operand).unwrap()
    }

    #[test]
    fn computes_max_depth_across_branches() {
        let code = vec![
            OpCode::True.instr(),
            op(OpCode::CondJump, 0),
            op(OpCode::PosInt, 1),
            op(OpCode::PosInt, 2),
            OpCode::Add.instr(),
            op(OpCode::Jump, 1),
            op(OpCode::Label, 0),
            op(OpCode::PosInt, 3),
            op(OpCode::Label, 1),
            OpCode::Return.instr(),
        ];
        let verified = verify(&unit(code, 2)).unwrap();
        assert_eq!(verified.stack_size, 2);
        assert_eq!(verified.labels, vec![6, 8]);
    }

    #[test]
    fn rejects_unbalanced_join() {
        let code = vec![
            OpCode::True.instr(),
            op(OpCode::CondJump, 0),
            op(OpCode::PosInt, 1),
            op(OpCode::PosInt, 2),
            op(OpCode::Label, 0),
            OpCode::Return.instr(),
        ];
        let err = verify(&unit(code, 1)).unwrap_err();
        assert!(matches!(err, CompileError::StackImbalance { pc: 4, .. }));
    }

    #[test]
    fn rejects_unanchored_and_duplicate_labels() {
        let code = vec![op(OpCode::Jump, 3)];
        assert_eq!(
            verify(&unit(code, 1)).unwrap_err(),
            CompileError::UnanchoredLabel(3)
        );

        let code = vec![
            op(OpCode::Label, 0),
            op(OpCode::Label, 0),
            OpCode::RetNull.instr(),
        ];
        assert_eq!(
            verify(&unit(code, 1)).unwrap_err(),
            CompileError::DuplicateLabel(0)
        );
    }

    #[test]
    fn rejects_underflow_and_fallthrough() {
        let code = vec![OpCode::Add.instr(), OpCode::Return.instr()];
        assert_eq!(
            verify(&unit(code, 0)).unwrap_err(),
            CompileError::StackUnderflow { pc: 0 }
        );

        let code = vec![OpCode::Nil.instr()];
        assert_eq!(
            verify(&unit(code, 0)).unwrap_err(),
            CompileError::MissingReturn
        );
    }
}
