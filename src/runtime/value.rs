use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, OnceLock},
};

use crate::{
    bytecode::compiler::special::Special,
    runtime::{
        builtin_function::{Builtin, Callable},
        closure::Closure,
        error::Fault,
        list::{Cons, EmptyList, Pair, Sequence},
        number::Number,
        procedure::Procedure,
        symbol::Symbol,
    },
};

/// Runtime value used by the VM stack, locals, constants, and closures.
///
/// Heap-backed variants share through `Arc` so values can cross threads:
/// two calls of the same closure may run on different tasks at once.
/// Values form acyclic graphs; the only way to tie a knot is a [`Ref`],
/// which compares and hashes by identity.
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of value, also the empty list.
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(Arc<str>),
    Symbol(Symbol),
    /// A cons cell; lists are chains of pairs ending in `Null`.
    Pair(Arc<Cons>),
    Vector(Arc<[Value]>),
    /// Compiled template waiting for its captured values.
    Procedure(Arc<Procedure>),
    Closure(Arc<Closure>),
    Builtin(Arc<Builtin>),
    /// Compile-time special form handler.
    Special(Special),
    /// Boxed reference cell used by mutually-recursive bindings.
    Ref(Arc<Ref>),
}

/// A settable indirection node. Filled exactly once.
#[derive(Default)]
pub struct Ref(OnceLock<Value>);

impl Ref {
    pub fn new() -> Self {
        Self(OnceLock::new())
    }

    pub fn set(&self, value: Value) -> Result<(), Fault> {
        self.0.set(value).map_err(|_| Fault::RefAlreadyBound)
    }

    pub fn get(&self) -> Result<Value, Fault> {
        self.0.get().cloned().ok_or(Fault::UnboundRef)
    }
}

impl Value {
    pub fn symbol(name: &str) -> Self {
        Value::Symbol(Symbol::new(name))
    }

    pub fn string(text: &str) -> Self {
        Value::String(Arc::from(text))
    }

    pub fn vector(items: Vec<Value>) -> Self {
        Value::Vector(Arc::from(items))
    }

    pub fn cons(car: Value, cdr: Value) -> Self {
        Value::Pair(Arc::new(Cons::new(car, cdr)))
    }

    /// Builds a proper list from `items`.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        items
            .into_iter()
            .rev()
            .fold(Value::Null, |tail, item| Value::cons(item, tail))
    }

    /// Returns the canonical runtime type label used in faults.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Pair(_) => "pair",
            Value::Vector(_) => "vector",
            Value::Procedure(_) => "procedure",
            Value::Closure(_) => "closure",
            Value::Builtin(_) => "builtin",
            Value::Special(_) => "special form",
            Value::Ref(_) => "reference",
        }
    }

    /// Only `false` and `null` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Null)
    }

    pub fn as_number(&self) -> Result<Number, Fault> {
        match self {
            Value::Integer(v) => Ok(Number::Integer(*v)),
            Value::Float(v) => Ok(Number::Float(*v)),
            other => Err(Fault::mismatch("number", other)),
        }
    }

    pub fn as_symbol(&self) -> Result<&Symbol, Fault> {
        match self {
            Value::Symbol(symbol) => Ok(symbol),
            other => Err(Fault::mismatch("symbol", other)),
        }
    }

    pub fn as_callable(&self) -> Result<&dyn Callable, Fault> {
        match self {
            Value::Closure(closure) => Ok(closure),
            Value::Builtin(builtin) => Ok(builtin.as_ref()),
            other => Err(Fault::mismatch("callable", other)),
        }
    }

    pub fn as_ref_cell(&self) -> Result<&Ref, Fault> {
        match self {
            Value::Ref(cell) => Ok(cell),
            other => Err(Fault::mismatch("reference", other)),
        }
    }

    fn as_pair(&self) -> Result<&dyn Pair, Fault> {
        match self {
            Value::Pair(cons) => Ok(cons),
            Value::Vector(items) => Ok(items),
            other => Err(Fault::mismatch("pair", other)),
        }
    }

    fn as_sequence(&self) -> Result<&dyn Sequence, Fault> {
        match self {
            Value::Null => Ok(&EmptyList),
            Value::Pair(cons) => Ok(cons),
            Value::Vector(items) => Ok(items),
            other => Err(Fault::mismatch("sequence", other)),
        }
    }

    pub fn car(&self) -> Result<Value, Fault> {
        Ok(self.as_pair()?.car())
    }

    pub fn cdr(&self) -> Result<Value, Fault> {
        Ok(self.as_pair()?.cdr())
    }

    pub fn is_empty(&self) -> Result<bool, Fault> {
        Ok(self.as_sequence()?.is_empty())
    }

    pub fn prepend(&self, item: Value) -> Result<Value, Fault> {
        Ok(self.as_sequence()?.prepend(item))
    }

    /// Collects the elements of a list or vector.
    pub fn to_vec(&self) -> Result<Vec<Value>, Fault> {
        match self {
            Value::Vector(items) => Ok(items.to_vec()),
            Value::Null | Value::Pair(_) => {
                let mut items = Vec::new();
                let mut rest = self;
                while let Value::Pair(cons) = rest {
                    items.push(cons.car.clone());
                    rest = &cons.cdr;
                }
                match rest {
                    Value::Null => Ok(items),
                    other => Err(Fault::mismatch("list", other)),
                }
            }
            other => Err(Fault::mismatch("sequence", other)),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Integer(v) => Value::Integer(v),
            Number::Float(v) => Value::Float(v),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Pair(a), Value::Pair(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                // Walk the spine iteratively so long lists do not recurse.
                let (mut left, mut right) = (a, b);
                loop {
                    if left.car != right.car {
                        return false;
                    }
                    match (&left.cdr, &right.cdr) {
                        (Value::Pair(l), Value::Pair(r)) => {
                            if Arc::ptr_eq(l, r) {
                                return true;
                            }
                            left = l;
                            right = r;
                        }
                        (l, r) => return l == r,
                    }
                }
            }
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Procedure(a), Value::Procedure(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => a == b,
            (Value::Builtin(a), Value::Builtin(b)) => Arc::ptr_eq(a, b) || a.name() == b.name(),
            (Value::Special(a), Value::Special(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::Integer(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::String(v) => v.hash(state),
            Value::Symbol(v) => v.hash(state),
            Value::Pair(cons) => {
                let mut rest = cons;
                loop {
                    rest.car.hash(state);
                    match &rest.cdr {
                        Value::Pair(next) => rest = next,
                        tail => {
                            tail.hash(state);
                            break;
                        }
                    }
                }
            }
            Value::Vector(items) => items.hash(state),
            Value::Procedure(procedure) => procedure.hash(state),
            Value::Closure(closure) => closure.hash(state),
            Value::Builtin(builtin) => builtin.name().hash(state),
            Value::Special(special) => special.name().hash(state),
            Value::Ref(cell) => (Arc::as_ptr(cell) as usize).hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::String(v) => write!(f, "{:?}", v),
            Value::Symbol(v) => write!(f, "{}", v),
            Value::Pair(cons) => {
                write!(f, "({}", cons.car)?;
                let mut rest = &cons.cdr;
                loop {
                    match rest {
                        Value::Pair(next) => {
                            write!(f, " {}", next.car)?;
                            rest = &next.cdr;
                        }
                        Value::Null => break,
                        tail => {
                            write!(f, " . {}", tail)?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
            Value::Vector(items) => {
                let items: Vec<String> = items.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", items.join(" "))
            }
            Value::Procedure(_) => write!(f, "#<procedure>"),
            Value::Closure(closure) => match closure.name() {
                Some(name) => write!(f, "#<closure {}>", name),
                None => write!(f, "#<closure>"),
            },
            Value::Builtin(builtin) => write!(f, "#<builtin {}>", builtin.name()),
            Value::Special(special) => write!(f, "#<special {}>", special.name()),
            Value::Ref(_) => write!(f, "#<ref>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
