/// How a lexical name holds its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Value,
    /// A boxed reference cell; reads go through `Deref`.
    Reference,
    /// The variadic tail of the argument vector.
    Rest,
}

/// Where a lexical name lives at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Args,
    Locals,
    Captured,
    /// The running closure itself.
    Current,
}

/// A named lexical storage slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub kind: CellKind,
    pub scope: ScopeKind,
    pub index: usize,
}

impl Cell {
    pub fn new(kind: CellKind, scope: ScopeKind, index: usize) -> Self {
        Self { kind, scope, index }
    }

    /// The kind a nested lambda sees after capturing this cell. Only
    /// reference cells keep their boxing.
    pub fn captured_kind(&self) -> CellKind {
        match self.kind {
            CellKind::Reference => CellKind::Reference,
            CellKind::Value | CellKind::Rest => CellKind::Value,
        }
    }
}
