//! Global symbol bindings: bind-once entries with public/private visibility.
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, OnceLock, RwLock},
};

use crate::runtime::{error::Fault, symbol::Symbol, value::Value};

struct Entry {
    private: bool,
    value: OnceLock<Value>,
}

impl Entry {
    fn new(private: bool) -> Self {
        Self {
            private,
            value: OnceLock::new(),
        }
    }
}

/// A table of global entries, safe to declare into and resolve from
/// concurrently. Lookups that miss fall through to the parent, which only
/// exposes its public entries.
pub struct Namespace {
    name: Symbol,
    parent: Option<Arc<Namespace>>,
    entries: RwLock<HashMap<Symbol, Arc<Entry>>>,
}

impl Namespace {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: Symbol::new(name),
            parent: None,
            entries: RwLock::new(HashMap::new()),
        })
    }

    pub fn child(parent: &Arc<Namespace>, name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: Symbol::new(name),
            parent: Some(Arc::clone(parent)),
            entries: RwLock::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &Symbol {
        &self.name
    }

    fn entry(&self, name: &Symbol) -> Option<Arc<Entry>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(name).cloned()
    }

    fn insert(&self, name: &Symbol, private: bool) -> Arc<Entry> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            entries
                .entry(name.clone())
                .or_insert_with(|| Arc::new(Entry::new(private))),
        )
    }

    /// Declares a public entry. Re-declaring keeps the existing entry.
    pub fn declare(&self, name: &Symbol) {
        self.insert(name, false);
    }

    /// Declares an entry only visible from this namespace.
    pub fn private(&self, name: &Symbol) {
        self.insert(name, true);
    }

    pub fn bind(&self, name: &Symbol, value: Value) -> Result<(), Fault> {
        self.insert(name, false)
            .value
            .set(value)
            .map_err(|_| Fault::AlreadyBound(name.clone()))
    }

    pub fn is_bound(&self, name: &Symbol) -> bool {
        self.lookup(name, true).is_some()
    }

    pub fn resolve(&self, name: &Symbol) -> Result<Value, Fault> {
        self.lookup(name, true)
            .ok_or_else(|| Fault::UnboundSymbol(name.clone()))
    }

    fn lookup(&self, name: &Symbol, include_private: bool) -> Option<Value> {
        if let Some(entry) = self.entry(name) {
            if include_private || !entry.private {
                if let Some(value) = entry.value.get() {
                    return Some(value.clone());
                }
            }
        }
        self.parent
            .as_ref()
            .and_then(|parent| parent.lookup(name, false))
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({})", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_bind_once() {
        let ns = Namespace::new("user");
        let x = Symbol::new("x");
        ns.bind(&x, Value::Integer(1)).unwrap();
        assert_eq!(
            ns.bind(&x, Value::Integer(2)).unwrap_err(),
            Fault::AlreadyBound(x.clone())
        );
        assert_eq!(ns.resolve(&x).unwrap(), Value::Integer(1));
    }

    #[test]
    fn declared_but_unbound_does_not_resolve() {
        let ns = Namespace::new("user");
        let y = Symbol::new("y");
        ns.declare(&y);
        assert_eq!(ns.resolve(&y).unwrap_err(), Fault::UnboundSymbol(y));
    }

    #[test]
    fn private_entries_are_hidden_from_children() {
        let core = Namespace::new("core");
        let secret = Symbol::new("secret");
        let open = Symbol::new("open");
        core.private(&secret);
        core.bind(&secret, Value::Integer(1)).unwrap();
        core.bind(&open, Value::Integer(2)).unwrap();

        let user = Namespace::child(&core, "user");
        assert!(core.is_bound(&secret));
        assert!(!user.is_bound(&secret));
        assert_eq!(user.resolve(&open).unwrap(), Value::Integer(2));
    }
}
