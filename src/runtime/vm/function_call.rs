use std::sync::Arc;

use crate::runtime::{closure::Closure, error::Fault, value::Value};

use super::Vm;

impl Vm {
    /// Calls `closure` with `args` after checking its arity. This is the only
    /// way bytecode starts running.
    pub fn invoke(&self, closure: &Arc<Closure>, args: Vec<Value>) -> Result<Value, Fault> {
        closure.procedure.arity().check(args.len())?;
        self.execute(Arc::clone(closure), args)
    }

    /// Calls any callable value: closures run on this VM, builtins run
    /// directly.
    pub fn call(&self, callee: &Value, args: Vec<Value>) -> Result<Value, Fault> {
        callee.as_callable()?.call(self, args)
    }
}

/// Instantiates the procedure on top of the stack with the values captured
/// below it.
pub(super) fn make_closure(template: Value, captured: Vec<Value>) -> Result<Value, Fault> {
    match template {
        Value::Procedure(procedure) => Ok(Value::Closure(Arc::new(Closure::new(
            procedure, captured,
        )))),
        other => Err(Fault::mismatch("procedure", &other)),
    }
}
