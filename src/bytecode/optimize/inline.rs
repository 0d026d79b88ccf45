use std::sync::Arc;

use tracing::debug;

use crate::{
    bytecode::{
        compiler::CompileResult,
        encoded::Encoded,
        op_code::{ActOn, Instruction, OpCode},
    },
    config::CompileOptions,
    runtime::{closure::Closure, value::Value},
};

/// Argument count of a call and whether it was a tail call.
fn call_shape(instruction: Instruction) -> Option<(usize, bool)> {
    match instruction.opcode() {
        OpCode::Call0 => Some((0, false)),
        OpCode::Call1 => Some((1, false)),
        OpCode::Call => Some((instruction.operand(), false)),
        OpCode::TailCall => Some((instruction.operand(), true)),
        _ => None,
    }
}

fn eligible(encoded: &Encoded, closure: &Closure, count: usize) -> bool {
    let procedure = &closure.procedure;
    let name = procedure.name().map(|n| n.as_str());
    if !Arc::ptr_eq(procedure.globals(), &encoded.globals) {
        debug!(?name, "not inlining: different globals");
        return false;
    }
    if !procedure.is_inlinable() {
        debug!(?name, "not inlining: callee is not inlinable");
        return false;
    }
    if !procedure.arity().accepts(count) {
        debug!(?name, count, "not inlining: arity mismatch");
        return false;
    }
    true
}

/// Replaces `Const closure` followed by a call with the closure's body.
///
/// The body runs after `PushArgs n`, so its `Arg`, `ArgLen` and `RestArg`
/// see the staged arguments. Constants and captured values move into the
/// caller's pool, and locals and labels are shifted past the caller's own.
///
/// A call that was not in tail position gets every return turned into a
/// jump to one exit label followed by `PopArgs`, and the body's tail calls
/// become plain calls. A tail call keeps the body's returns and tail calls
/// as they are, so loops through the inlined callee stay flat.
pub(super) fn inline_calls(encoded: &mut Encoded, options: &CompileOptions) -> CompileResult<()> {
    let code = std::mem::take(&mut encoded.code);
    let mut out = Vec::with_capacity(code.len());
    let mut budget = options.max_inlined_calls;
    let mut pc = 0;

    while pc < code.len() {
        let instruction = code[pc];
        pc += 1;
        if budget == 0 || instruction.opcode() != OpCode::Const {
            out.push(instruction);
            continue;
        }
        let Some((count, tail)) = code.get(pc).copied().and_then(call_shape) else {
            out.push(instruction);
            continue;
        };
        let closure = match &encoded.constants[instruction.operand()] {
            Value::Closure(closure) if eligible(encoded, closure, count) => Arc::clone(closure),
            _ => {
                out.push(instruction);
                continue;
            }
        };

        splice(encoded, &mut out, &closure, count, tail)?;
        debug!(
            name = closure.name().map(|n| n.as_str()),
            count, tail, "inlined call"
        );
        budget -= 1;
        pc += 1;
    }

    encoded.code = out;
    Ok(())
}

fn splice(
    encoded: &mut Encoded,
    out: &mut Vec<Instruction>,
    closure: &Closure,
    count: usize,
    tail: bool,
) -> CompileResult<()> {
    let procedure = &closure.procedure;
    let local_base = encoded.local_count;
    let label_base = encoded.label_count;
    let exit = label_base + procedure.label_count;
    encoded.local_count += procedure.local_count();
    encoded.label_count = if tail { exit } else { exit + 1 };

    out.push(OpCode::PushArgs.with(count)?);
    for instruction in procedure.code() {
        let op = instruction.opcode();
        let operand = instruction.operand();
        match op {
            OpCode::Return
            | OpCode::RetNull
            | OpCode::RetTrue
            | OpCode::RetFalse
            | OpCode::TailCall
                if tail =>
            {
                out.push(*instruction)
            }
            OpCode::Return => out.push(OpCode::Jump.with(exit)?),
            OpCode::RetNull | OpCode::RetTrue | OpCode::RetFalse => {
                let literal = match op {
                    OpCode::RetNull => OpCode::Nil,
                    OpCode::RetTrue => OpCode::True,
                    _ => OpCode::False,
                };
                out.push(literal.instr());
                out.push(OpCode::Jump.with(exit)?);
            }
            OpCode::TailCall => {
                out.push(OpCode::Call.with(operand)?);
                out.push(OpCode::Jump.with(exit)?);
            }
            OpCode::Capture => {
                let index = encoded.add_constant(closure.captured[operand].clone());
                out.push(OpCode::Const.with(index)?);
            }
            _ => {
                let moved = match op.effect().operand {
                    ActOn::Constants => {
                        encoded.add_constant(procedure.constants()[operand].clone())
                    }
                    ActOn::Locals => operand + local_base,
                    ActOn::Labels => operand + label_base,
                    _ => {
                        out.push(*instruction);
                        continue;
                    }
                };
                out.push(op.with(moved)?);
            }
        }
    }
    if !tail {
        out.push(OpCode::Label.with(exit)?);
        out.push(OpCode::PopArgs.instr());
    }
    Ok(())
}
