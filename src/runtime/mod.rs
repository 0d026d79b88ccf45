//! Runtime core types and VM execution.
//!
//! Runtime values form acyclic graphs shared through `Arc`. The one way to
//! build a cycle is a [`value::Ref`] bound to a closure that captured it;
//! such cycles are expected to live as long as the namespace that holds
//! them.
pub mod alloc;
pub mod arity;
pub mod builtin_function;
pub mod builtins;
pub mod closure;
pub mod error;
pub mod frame;
pub mod list;
pub mod namespace;
pub mod number;
pub mod procedure;
pub mod symbol;
pub mod value;
pub mod vm;
