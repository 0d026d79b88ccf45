use tracing::{debug, trace};

use crate::{
    bytecode::op_code::Instruction,
    runtime::{error::Fault, procedure::Procedure},
};

fn procedure_name(procedure: &Procedure) -> &str {
    procedure.name().map_or("<anonymous>", |name| name.as_str())
}

/// One line per executed instruction: `name@0003 Const 1 [depth 2]`.
pub(super) fn describe(
    procedure: &Procedure,
    pc: usize,
    instruction: Instruction,
    depth: usize,
) -> String {
    format!(
        "{}@{:04} {} [depth {}]",
        procedure_name(procedure),
        pc,
        instruction,
        depth
    )
}

pub(super) fn trace_instruction(
    procedure: &Procedure,
    pc: usize,
    instruction: Instruction,
    depth: usize,
) {
    trace!("{}", describe(procedure, pc, instruction, depth));
}

pub(super) fn trace_fault(procedure: &Procedure, fault: &Fault) {
    debug!(
        procedure = procedure_name(procedure),
        %fault,
        "fault unwinding"
    );
}
