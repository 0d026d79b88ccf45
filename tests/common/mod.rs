#![allow(dead_code)]

use std::sync::Arc;

pub use alder::Value;
use alder::{CompileOptions, Error, Namespace, Vm, VmConfig};

pub mod reader;

pub fn vm_with(compile: CompileOptions) -> Vm {
    Vm::with_config(VmConfig {
        compile,
        ..VmConfig::default()
    })
}

/// Evaluates every form of `source` in order in `ns`, returning the last
/// value.
pub fn eval_in(vm: &Vm, ns: &Arc<Namespace>, source: &str) -> Result<Value, Error> {
    let forms = reader::read_all(source).unwrap_or_else(|e| panic!("read error: {}", e));
    let mut last = Value::Null;
    for form in &forms {
        last = vm.eval(ns, form)?;
    }
    Ok(last)
}

pub fn eval(source: &str) -> Result<Value, Error> {
    eval_in(&Vm::new(), &Namespace::user(), source)
}

pub fn run(source: &str) -> Value {
    eval(source).unwrap_or_else(|e| panic!("`{}` failed: {}", source, e))
}

pub fn run_error(source: &str) -> Error {
    match eval(source) {
        Ok(value) => panic!("`{}` should fail, got {}", source, value),
        Err(err) => err,
    }
}

pub fn read(source: &str) -> Value {
    reader::read(source).unwrap_or_else(|e| panic!("read error: {}", e))
}
