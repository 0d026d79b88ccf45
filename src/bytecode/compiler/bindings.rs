use crate::{
    bytecode::{
        cell::{CellKind, ScopeKind},
        compiler::{CompileError, CompileResult, compile_block, compile_form, form_items},
        encoder::Encoder,
        op_code::OpCode,
    },
    runtime::{symbol::Symbol, value::Value},
};

fn binding_pairs(form: &'static str, args: &[Value]) -> CompileResult<Vec<(Symbol, Value)>> {
    let Some(bindings) = args.first() else {
        return Err(CompileError::bad_form(form, "missing binding list"));
    };
    let items = form_items(form, bindings)?;
    if items.len() % 2 != 0 {
        return Err(CompileError::bad_form(
            form,
            "bindings must come in name/value pairs",
        ));
    }
    items
        .chunks(2)
        .map(|pair| match &pair[0] {
            Value::Symbol(name) => Ok((name.clone(), pair[1].clone())),
            other => Err(CompileError::expected_symbol(form, other)),
        })
        .collect()
}

/// `(let (name value ...) body...)`
///
/// Bindings are sequential: each value sees the names bound before it.
pub(super) fn compile_let(encoder: &mut Encoder<'_>, args: &[Value]) -> CompileResult<()> {
    let pairs = binding_pairs("let", args)?;
    encoder.push_scope(ScopeKind::Locals);
    for (name, value) in &pairs {
        compile_form(encoder, value)?;
        let cell = encoder.bind_local(name, CellKind::Value)?;
        encoder.emit_with(OpCode::Store, cell.index)?;
    }
    compile_block(encoder, &args[1..])?;
    encoder.pop_scope();
    Ok(())
}

/// `(letrec (name value ...) body...)`
///
/// Every name is a reference cell allocated before any value is evaluated,
/// so the values may refer to each other through closures.
pub(super) fn compile_letrec(encoder: &mut Encoder<'_>, args: &[Value]) -> CompileResult<()> {
    let pairs = binding_pairs("letrec", args)?;
    encoder.push_scope(ScopeKind::Locals);

    let mut cells = Vec::with_capacity(pairs.len());
    for (name, _) in &pairs {
        let cell = encoder.bind_local(name, CellKind::Reference)?;
        encoder.emit(OpCode::NewRef);
        encoder.emit_with(OpCode::Store, cell.index)?;
        cells.push(cell);
    }
    for ((_, value), cell) in pairs.iter().zip(cells) {
        compile_form(encoder, value)?;
        encoder.load_raw(cell)?;
        encoder.emit(OpCode::BindRef);
    }

    compile_block(encoder, &args[1..])?;
    encoder.pop_scope();
    Ok(())
}

fn global_name(form: &'static str, args: &[Value]) -> CompileResult<Symbol> {
    match args.first() {
        Some(Value::Symbol(name)) => Ok(name.clone()),
        Some(other) => Err(CompileError::expected_symbol(form, other)),
        None => Err(CompileError::bad_form(form, "missing name")),
    }
}

/// `(def name value)` binds a global and evaluates to its name.
pub(super) fn compile_def(encoder: &mut Encoder<'_>, args: &[Value]) -> CompileResult<()> {
    let name = global_name("def", args)?;
    let [_, value] = args else {
        return Err(CompileError::bad_form("def", "expects a name and a value"));
    };
    compile_form(encoder, value)?;
    encoder.emit_const(Value::Symbol(name.clone()))?;
    encoder.emit(OpCode::Bind);
    encoder.emit_const(Value::Symbol(name))
}

fn compile_declaration(
    encoder: &mut Encoder<'_>,
    form: &'static str,
    op: OpCode,
    args: &[Value],
) -> CompileResult<()> {
    let name = global_name(form, args)?;
    if args.len() != 1 {
        return Err(CompileError::bad_form(form, "expects exactly one name"));
    }
    encoder.emit_const(Value::Symbol(name.clone()))?;
    encoder.emit(op);
    encoder.emit_const(Value::Symbol(name))
}

/// `(declare name)`
pub(super) fn compile_declare(encoder: &mut Encoder<'_>, args: &[Value]) -> CompileResult<()> {
    compile_declaration(encoder, "declare", OpCode::Declare, args)
}

/// `(private name)`
pub(super) fn compile_private(encoder: &mut Encoder<'_>, args: &[Value]) -> CompileResult<()> {
    compile_declaration(encoder, "private", OpCode::Private, args)
}
