//! Mutable compile-time context for one lambda or top-level body.
use std::sync::Arc;

use crate::{
    bytecode::{
        cell::{Cell, CellKind, ScopeKind},
        compiler::{CompileError, CompileResult},
        encoded::{Encoded, add_constant},
        op_code::{Instructions, OpCode},
    },
    config::CompileOptions,
    runtime::{namespace::Namespace, symbol::Symbol, value::Value},
};

struct Scope {
    kind: ScopeKind,
    cells: Vec<(Symbol, Cell)>,
}

/// Tracks the constant pool, the label counter and the stack of lexical
/// scopes while code for one body is generated.
///
/// A nested lambda gets a child encoder that can see, but not change, its
/// parent. Names the child finds in an enclosing encoder are recorded as
/// captures; the parent loads them once the child is finished.
pub struct Encoder<'p> {
    parent: Option<&'p Encoder<'p>>,
    globals: Arc<Namespace>,
    options: CompileOptions,
    name: Option<Symbol>,
    code: Instructions,
    constants: Vec<Value>,
    scopes: Vec<Scope>,
    captured: Vec<(Symbol, CellKind)>,
    next_local: usize,
    local_count: usize,
    label_count: usize,
}

impl<'p> Encoder<'p> {
    pub fn new(globals: Arc<Namespace>, options: CompileOptions) -> Self {
        Self {
            parent: None,
            globals,
            options,
            name: None,
            code: Vec::new(),
            constants: Vec::new(),
            scopes: Vec::new(),
            captured: Vec::new(),
            next_local: 0,
            local_count: 0,
            label_count: 0,
        }
    }

    /// An encoder for a lambda nested in this one. `name`, when given,
    /// resolves to the running closure.
    pub fn child<'c>(&'c self, name: Option<Symbol>) -> Encoder<'c>
    where
        'p: 'c,
    {
        Encoder {
            parent: Some(self),
            name,
            ..Encoder::new(Arc::clone(&self.globals), self.options.clone())
        }
    }

    pub fn globals(&self) -> &Arc<Namespace> {
        &self.globals
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn name(&self) -> Option<&Symbol> {
        self.name.as_ref()
    }

    pub fn emit(&mut self, op: OpCode) {
        self.code.push(op.instr());
    }

    pub fn emit_with(&mut self, op: OpCode, operand: usize) -> CompileResult<()> {
        self.code.push(op.with(operand)?);
        Ok(())
    }

    pub fn add_constant(&mut self, value: Value) -> usize {
        add_constant(&mut self.constants, value)
    }

    pub fn emit_const(&mut self, value: Value) -> CompileResult<()> {
        let index = self.add_constant(value);
        self.emit_with(OpCode::Const, index)
    }

    pub fn new_label(&mut self) -> usize {
        self.label_count += 1;
        self.label_count - 1
    }

    pub fn anchor(&mut self, label: usize) -> CompileResult<()> {
        self.emit_with(OpCode::Label, label)
    }

    pub fn push_scope(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope {
            kind,
            cells: Vec::new(),
        });
    }

    /// Pops the innermost scope. Local slots it held become free for reuse.
    pub fn pop_scope(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            if scope.kind == ScopeKind::Locals {
                self.next_local -= scope.cells.len();
            }
        }
    }

    fn declare(&mut self, name: &Symbol, cell: Cell) -> CompileResult<()> {
        let Some(scope) = self.scopes.last_mut() else {
            panic!("binding `{}` outside of any scope", name);
        };
        if scope.cells.iter().any(|(bound, _)| bound == name) {
            return Err(CompileError::DuplicateBinding(name.clone()));
        }
        scope.cells.push((name.clone(), cell));
        Ok(())
    }

    /// Binds parameter `index` in the innermost (argument) scope.
    pub fn bind_arg(&mut self, name: &Symbol, kind: CellKind, index: usize) -> CompileResult<Cell> {
        let cell = Cell::new(kind, ScopeKind::Args, index);
        self.declare(name, cell)?;
        Ok(cell)
    }

    /// Allocates a local slot for `name` in the innermost scope.
    pub fn bind_local(&mut self, name: &Symbol, kind: CellKind) -> CompileResult<Cell> {
        let cell = Cell::new(kind, ScopeKind::Locals, self.next_local);
        self.declare(name, cell)?;
        self.next_local += 1;
        self.local_count = self.local_count.max(self.next_local);
        Ok(cell)
    }

    fn lexical(&self, name: &Symbol) -> Option<Cell> {
        for scope in self.scopes.iter().rev() {
            if let Some((_, cell)) = scope.cells.iter().find(|(bound, _)| bound == name) {
                return Some(*cell);
            }
        }
        if let Some(index) = self.captured.iter().position(|(bound, _)| bound == name) {
            return Some(Cell::new(
                self.captured[index].1,
                ScopeKind::Captured,
                index,
            ));
        }
        if self.name.as_ref() == Some(name) {
            return Some(Cell::new(CellKind::Value, ScopeKind::Current, 0));
        }
        None
    }

    /// Whether `name` is bound lexically here or in any enclosing encoder,
    /// and as what kind from a nested lambda's point of view.
    fn lookup(&self, name: &Symbol) -> Option<CellKind> {
        match self.lexical(name) {
            Some(cell) => Some(cell.captured_kind()),
            None => self.parent.and_then(|parent| parent.lookup(name)),
        }
    }

    pub fn is_lexical(&self, name: &Symbol) -> bool {
        self.lookup(name).is_some()
    }

    /// Resolves `name` innermost-first, capturing it from an enclosing
    /// encoder when needed. `None` means the name is global.
    pub fn resolve(&mut self, name: &Symbol) -> Option<Cell> {
        if let Some(cell) = self.lexical(name) {
            return Some(cell);
        }
        let kind = self.parent?.lookup(name)?;
        self.captured.push((name.clone(), kind));
        Some(Cell::new(kind, ScopeKind::Captured, self.captured.len() - 1))
    }

    /// Emits a load of `cell`'s raw slot. Reference cells stay boxed.
    pub fn load_raw(&mut self, cell: Cell) -> CompileResult<()> {
        match (cell.scope, cell.kind) {
            (ScopeKind::Args, CellKind::Rest) => self.emit_with(OpCode::RestArg, cell.index),
            (ScopeKind::Args, _) => self.emit_with(OpCode::Arg, cell.index),
            (ScopeKind::Locals, _) => self.emit_with(OpCode::Load, cell.index),
            (ScopeKind::Captured, _) => self.emit_with(OpCode::Capture, cell.index),
            (ScopeKind::Current, _) => {
                self.emit(OpCode::Current);
                Ok(())
            }
        }
    }

    /// Emits a load of `cell`'s value.
    pub fn load(&mut self, cell: Cell) -> CompileResult<()> {
        self.load_raw(cell)?;
        if cell.kind == CellKind::Reference {
            self.emit(OpCode::Deref);
        }
        Ok(())
    }

    /// Names this body captured from enclosing encoders, in capture order.
    pub fn captured(&self) -> &[(Symbol, CellKind)] {
        &self.captured
    }

    pub fn code(&self) -> &Instructions {
        &self.code
    }

    pub fn finish(self) -> Encoded {
        Encoded {
            code: self.code,
            constants: self.constants,
            local_count: self.local_count,
            label_count: self.label_count,
            globals: self.globals,
            name: self.name,
        }
    }
}
