use std::sync::Arc;

use crate::{
    bytecode::compiler::{self, CompileError},
    config::VmConfig,
    error::Error,
    runtime::{alloc::FrameAllocator, closure::Closure, namespace::Namespace, value::Value},
};

mod binary_ops;
mod dispatch;
mod function_call;
mod trace;

pub(crate) use binary_ops::compare;

/// The interpreter. Holds the settings and the frame allocator shared by
/// every call it runs; calls may run on several threads at once.
pub struct Vm {
    config: VmConfig,
    allocator: FrameAllocator,
}

impl Vm {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        let allocator = FrameAllocator::new(&config.allocator);
        Self { config, allocator }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn allocator(&self) -> &FrameAllocator {
        &self.allocator
    }

    pub fn set_trace(&mut self, enabled: bool) {
        self.config.trace = enabled;
    }

    /// Compiles `form` into a closure of no arguments.
    pub fn compile(
        &self,
        globals: &Arc<Namespace>,
        form: &Value,
    ) -> Result<Arc<Closure>, CompileError> {
        let procedure = compiler::compile(globals, form, &self.config.compile)?;
        Ok(Arc::new(procedure.instantiate(&[])))
    }

    /// Compiles and runs `form`.
    pub fn eval(&self, globals: &Arc<Namespace>, form: &Value) -> Result<Value, Error> {
        let closure = self.compile(globals, form)?;
        Ok(self.invoke(&closure, Vec::new())?)
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod function_call_test;
