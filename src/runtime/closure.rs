use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::runtime::{
    arity::Arity,
    builtin_function::Callable,
    error::Fault,
    procedure::Procedure,
    symbol::Symbol,
    value::Value,
    vm::Vm,
};

/// A procedure plus the free-variable values captured when control passed
/// over its lambda. The captured vector is owned, never shared back with the
/// site that built it.
pub struct Closure {
    pub procedure: Arc<Procedure>,
    pub captured: Vec<Value>,
}

impl Closure {
    pub fn new(procedure: Arc<Procedure>, captured: Vec<Value>) -> Self {
        Self {
            procedure,
            captured,
        }
    }

    pub fn name(&self) -> Option<&Symbol> {
        self.procedure.name()
    }

    /// Runs the closure to completion on `vm`.
    pub fn invoke(self: &Arc<Self>, vm: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
        vm.invoke(self, args)
    }
}

impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        *self.procedure == *other.procedure && self.captured == other.captured
    }
}

impl Eq for Closure {}

impl Hash for Closure {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.procedure.hash(state);
        self.captured.hash(state);
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("procedure", &self.procedure)
            .field("captured", &self.captured)
            .finish()
    }
}

impl Callable for Arc<Closure> {
    fn arity(&self) -> &Arity {
        self.procedure.arity()
    }

    fn call(&self, vm: &Vm, args: Vec<Value>) -> Result<Value, Fault> {
        self.invoke(vm, args)
    }
}
