//! Pair and sequence capabilities of the value model.
use std::sync::Arc;

use crate::runtime::value::Value;

/// A cons cell.
#[derive(Clone)]
pub struct Cons {
    pub car: Value,
    pub cdr: Value,
}

impl Cons {
    pub fn new(car: Value, cdr: Value) -> Self {
        Self { car, cdr }
    }
}

impl Drop for Cons {
    fn drop(&mut self) {
        // Unlink uniquely owned tails one at a time so dropping a long list
        // does not recurse once per element.
        let mut rest = std::mem::take(&mut self.cdr);
        while let Value::Pair(cons) = rest {
            match Arc::try_unwrap(cons) {
                Ok(mut owned) => rest = std::mem::take(&mut owned.cdr),
                Err(_) => break,
            }
        }
    }
}

pub trait Pair {
    fn car(&self) -> Value;
    fn cdr(&self) -> Value;
}

pub trait Sequence {
    fn is_empty(&self) -> bool;
    fn prepend(&self, item: Value) -> Value;
}

/// The sequence behavior of `Value::Null`.
pub struct EmptyList;

impl Sequence for EmptyList {
    fn is_empty(&self) -> bool {
        true
    }

    fn prepend(&self, item: Value) -> Value {
        Value::cons(item, Value::Null)
    }
}

impl Pair for Arc<Cons> {
    fn car(&self) -> Value {
        self.car.clone()
    }

    fn cdr(&self) -> Value {
        self.cdr.clone()
    }
}

impl Sequence for Arc<Cons> {
    fn is_empty(&self) -> bool {
        false
    }

    fn prepend(&self, item: Value) -> Value {
        Value::Pair(Arc::new(Cons::new(item, Value::Pair(Arc::clone(self)))))
    }
}

impl Pair for Arc<[Value]> {
    fn car(&self) -> Value {
        self.first().cloned().unwrap_or_default()
    }

    fn cdr(&self) -> Value {
        if self.len() <= 1 {
            return Value::Null;
        }
        Value::Vector(Arc::from(&self[1..]))
    }
}

impl Sequence for Arc<[Value]> {
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prepend(&self, item: Value) -> Value {
        let mut items = Vec::with_capacity(self.len() + 1);
        items.push(item);
        items.extend(self.iter().cloned());
        Value::vector(items)
    }
}
