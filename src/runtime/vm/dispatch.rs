use std::sync::Arc;

use crate::{
    bytecode::op_code::OpCode,
    runtime::{
        closure::Closure,
        error::Fault,
        frame::Frame,
        value::{Ref, Value},
    },
};

use super::{
    Vm,
    binary_ops::{execute_binary_operation, execute_unary_operation},
    function_call::make_closure,
    trace,
};

/// How a run of one procedure ended.
pub(super) enum Flow {
    Return(Value),
    /// Continue with another closure in the same frame.
    TailCall(Arc<Closure>, Vec<Value>),
}

/// Operand stack view over a frame. The stack grows down from `base`,
/// locals sit at `base + i`.
struct Stack<'f> {
    frame: &'f mut Frame,
    base: usize,
    sp: usize,
}

impl<'f> Stack<'f> {
    fn new(frame: &'f mut Frame, base: usize) -> Self {
        Self {
            frame,
            base,
            sp: base,
        }
    }

    #[inline(always)]
    fn push(&mut self, value: Value) {
        self.sp -= 1;
        self.frame[self.sp] = value;
    }

    #[inline(always)]
    fn pop(&mut self) -> Value {
        let value = self.frame.take(self.sp);
        self.sp += 1;
        value
    }

    /// Pops `count` values; the first one popped comes first.
    fn pop_n(&mut self, count: usize) -> Vec<Value> {
        (0..count).map(|_| self.pop()).collect()
    }

    fn depth(&self) -> usize {
        self.base - self.sp
    }

    /// Empties the operand stack for another run in the same frame.
    fn reset(&mut self) {
        while self.sp < self.base {
            self.pop();
        }
    }

    #[inline(always)]
    fn load(&self, slot: usize) -> Value {
        self.frame[self.base + slot].clone()
    }

    #[inline(always)]
    fn store(&mut self, slot: usize, value: Value) {
        self.frame[self.base + slot] = value;
    }
}

impl Vm {
    /// Runs `closure` to completion in one leased frame, following tail
    /// calls into other closures without growing the host stack.
    pub(super) fn execute(&self, closure: Arc<Closure>, args: Vec<Value>) -> Result<Value, Fault> {
        let mut lease = self.allocator.lease(closure.procedure.frame_size());
        let (mut closure, mut args) = (closure, args);
        loop {
            let procedure = Arc::clone(&closure.procedure);
            let flow = self
                .run(&mut lease, closure, args)
                .inspect_err(|fault| trace::trace_fault(&procedure, fault))?;
            match flow {
                Flow::Return(value) => return Ok(value),
                Flow::TailCall(next, next_args) => {
                    lease.reserve(next.procedure.frame_size());
                    closure = next;
                    args = next_args;
                }
            }
        }
    }

    /// The dispatch loop for one procedure. Self tail calls restart it in
    /// place; anything else ends it with a [`Flow`].
    ///
    /// The unit was verified before the procedure was built, so stack
    /// depths, label targets and slot indices are trusted here.
    pub(super) fn run(
        &self,
        frame: &mut Frame,
        closure: Arc<Closure>,
        args: Vec<Value>,
    ) -> Result<Flow, Fault> {
        let procedure = Arc::clone(&closure.procedure);
        let code = procedure.code();
        let constants = procedure.constants();
        let labels = &procedure.labels;
        let globals = procedure.globals();
        let mut closure = closure;
        let mut args = args;
        let mut saved_args: Vec<Vec<Value>> = Vec::new();
        let mut stack = Stack::new(frame, procedure.stack_size());
        let mut pc = 0;

        loop {
            let instruction = code[pc];
            if self.config.trace {
                trace::trace_instruction(&procedure, pc, instruction, stack.depth());
            }
            pc += 1;
            let operand = instruction.operand();

            match instruction.opcode() {
                OpCode::Label | OpCode::NoOp => {}
                OpCode::Jump => pc = labels[operand],
                OpCode::CondJump => {
                    if stack.pop().is_truthy() {
                        pc = labels[operand];
                    }
                }
                OpCode::Return => return Ok(Flow::Return(stack.pop())),
                OpCode::RetNull => return Ok(Flow::Return(Value::Null)),
                OpCode::RetTrue => return Ok(Flow::Return(Value::Bool(true))),
                OpCode::RetFalse => return Ok(Flow::Return(Value::Bool(false))),
                OpCode::Panic => return Err(Fault::Panic(stack.pop())),
                OpCode::Nil => stack.push(Value::Null),
                OpCode::True => stack.push(Value::Bool(true)),
                OpCode::False => stack.push(Value::Bool(false)),
                OpCode::PosInt => stack.push(Value::Integer(operand as i64)),
                OpCode::NegInt => stack.push(Value::Integer(-(operand as i64))),
                OpCode::Const => stack.push(constants[operand].clone()),
                OpCode::Arg => stack.push(args[operand].clone()),
                OpCode::ArgLen => stack.push(Value::Integer(args.len() as i64)),
                OpCode::RestArg => {
                    let rest = args.get(operand..).unwrap_or_default();
                    stack.push(Value::list(rest.iter().cloned()));
                }
                OpCode::Load => {
                    let value = stack.load(operand);
                    stack.push(value);
                }
                OpCode::Store => {
                    let value = stack.pop();
                    stack.store(operand, value);
                }
                OpCode::NewRef => stack.push(Value::Ref(Arc::new(Ref::new()))),
                OpCode::BindRef => {
                    let cell = stack.pop();
                    let value = stack.pop();
                    cell.as_ref_cell()?.set(value)?;
                }
                OpCode::Deref => {
                    let cell = stack.pop();
                    stack.push(cell.as_ref_cell()?.get()?);
                }
                OpCode::Capture => stack.push(closure.captured[operand].clone()),
                OpCode::Current => stack.push(Value::Closure(Arc::clone(&closure))),
                OpCode::MakeClosure => {
                    let template = stack.pop();
                    let captured = stack.pop_n(operand);
                    stack.push(make_closure(template, captured)?);
                }
                OpCode::Pop => {
                    stack.pop();
                }
                OpCode::Call0 => {
                    let callee = stack.pop();
                    stack.push(self.call(&callee, Vec::new())?);
                }
                OpCode::Call1 => {
                    let callee = stack.pop();
                    let arg = stack.pop();
                    stack.push(self.call(&callee, vec![arg])?);
                }
                OpCode::Call => {
                    let callee = stack.pop();
                    let call_args = stack.pop_n(operand);
                    stack.push(self.call(&callee, call_args)?);
                }
                OpCode::TailCall => {
                    let callee = stack.pop();
                    let call_args = stack.pop_n(operand);
                    let next = match callee {
                        Value::Closure(next) => next,
                        // Host callables cannot join the loop.
                        other => return Ok(Flow::Return(self.call(&other, call_args)?)),
                    };
                    next.procedure.arity().check(call_args.len())?;
                    if !Arc::ptr_eq(&next.procedure, &procedure) {
                        return Ok(Flow::TailCall(next, call_args));
                    }
                    stack.reset();
                    saved_args.clear();
                    closure = next;
                    args = call_args;
                    pc = 0;
                }
                OpCode::PushArgs => {
                    let staged = stack.pop_n(operand);
                    saved_args.push(std::mem::replace(&mut args, staged));
                }
                OpCode::PopArgs => match saved_args.pop() {
                    Some(restored) => args = restored,
                    None => panic!("argument stack underflow at {}", pc - 1),
                },
                OpCode::Resolve => {
                    let name = stack.pop();
                    stack.push(globals.resolve(name.as_symbol()?)?);
                }
                OpCode::Declare => globals.declare(stack.pop().as_symbol()?),
                OpCode::Private => globals.private(stack.pop().as_symbol()?),
                OpCode::Bind => {
                    let name = stack.pop();
                    let value = stack.pop();
                    globals.bind(name.as_symbol()?, value)?;
                }
                OpCode::Add
                | OpCode::Sub
                | OpCode::Mul
                | OpCode::Div
                | OpCode::Mod
                | OpCode::NumEq
                | OpCode::NumLt
                | OpCode::NumLte
                | OpCode::NumGt
                | OpCode::NumGte
                | OpCode::Eq
                | OpCode::Cons => {
                    let left = stack.pop();
                    let right = stack.pop();
                    stack.push(execute_binary_operation(instruction.opcode(), left, right)?);
                }
                OpCode::Neg | OpCode::Not | OpCode::Car | OpCode::Cdr | OpCode::Empty => {
                    let value = stack.pop();
                    stack.push(execute_unary_operation(instruction.opcode(), value)?);
                }
            }
        }
    }
}
