use thiserror::Error;

use crate::{bytecode::compiler::CompileError, config::ConfigError, runtime::error::Fault};

/// Anything that can go wrong between a form and its value.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Fault(#[from] Fault),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
