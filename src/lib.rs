pub mod bytecode;
pub mod config;
pub mod error;
pub mod runtime;

pub use config::{CompileOptions, VmConfig};
pub use error::Error;
pub use runtime::{namespace::Namespace, value::Value, vm::Vm};

#[cfg(test)]
#[path = "../tests/common/reader.rs"]
pub(crate) mod reader;
