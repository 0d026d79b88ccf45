use std::{fmt, sync::Arc};

use crate::{
    bytecode::{
        cell::{CellKind, ScopeKind},
        compiler::{CompileError, CompileResult, compile_block, form_items},
        encoder::Encoder,
        op_code::OpCode,
    },
    runtime::{arity::Arity, procedure::Procedure, symbol::Symbol, value::Value},
};

/// One lambda clause: fixed parameter names, an optional rest name and a
/// body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamCase {
    pub params: Vec<Symbol>,
    pub rest: Option<Symbol>,
    pub body: Vec<Value>,
}

impl ParamCase {
    /// Parses a parameter list: `(a b)`, dotted `(a . rest)` or `(a & rest)`.
    pub fn parse(params: &Value, body: Vec<Value>) -> CompileResult<Self> {
        let mut names = Vec::new();
        let mut rest = None;
        let mut cursor = params;
        loop {
            match cursor {
                Value::Null => break,
                Value::Symbol(tail) => {
                    rest = Some(tail.clone());
                    break;
                }
                Value::Pair(cons) => {
                    let Value::Symbol(name) = &cons.car else {
                        return Err(CompileError::expected_symbol("lambda", &cons.car));
                    };
                    if name.as_str() == "&" {
                        rest = Some(rest_after_marker(&cons.cdr)?);
                        break;
                    }
                    names.push(name.clone());
                    cursor = &cons.cdr;
                }
                other => return Err(CompileError::expected_symbol("lambda", other)),
            }
        }
        Ok(Self {
            params: names,
            rest,
            body,
        })
    }

    pub fn fixed_arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_variadic(&self) -> bool {
        self.rest.is_some()
    }
}

fn rest_after_marker(tail: &Value) -> CompileResult<Symbol> {
    if let Value::Pair(cons) = tail {
        if let (Value::Symbol(name), Value::Null) = (&cons.car, &cons.cdr) {
            return Ok(name.clone());
        }
    }
    Err(CompileError::bad_form(
        "lambda",
        "`&` must be followed by exactly one name",
    ))
}

impl fmt::Display for ParamCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.params.iter().map(Symbol::as_str).collect();
        write!(f, "({}", names.join(" "))?;
        if let Some(rest) = &self.rest {
            if !names.is_empty() {
                write!(f, " ")?;
            }
            write!(f, ". {}", rest)?;
        }
        write!(f, ")")
    }
}

/// All clauses of one lambda, in declaration order, plus what they cover.
#[derive(Debug, Clone, Default)]
pub struct ParamCases {
    cases: Vec<ParamCase>,
    /// Bitmap of fixed arities taken by earlier clauses.
    covered: Vec<u64>,
    /// Smallest minimum of any rest clause so far.
    min_rest: Option<usize>,
}

impl ParamCases {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_covered(&self, count: usize) -> bool {
        self.covered
            .get(count / 64)
            .is_some_and(|word| word & (1 << (count % 64)) != 0)
    }

    fn cover(&mut self, count: usize) {
        let word = count / 64;
        if self.covered.len() <= word {
            self.covered.resize(word + 1, 0);
        }
        self.covered[word] |= 1 << (count % 64);
    }

    /// Appends `case`, rejecting it when no call could ever select it.
    pub fn push(&mut self, case: ParamCase) -> CompileResult<()> {
        let count = case.fixed_arity();
        let shadowed_by_rest = self.min_rest.is_some_and(|min| min <= count);
        let reachable = if case.is_variadic() {
            !shadowed_by_rest
        } else {
            !shadowed_by_rest && !self.is_covered(count)
        };
        if !reachable {
            return Err(CompileError::UnreachableCase(case.to_string()));
        }

        if case.is_variadic() {
            self.min_rest = Some(self.min_rest.map_or(count, |min| min.min(count)));
        } else {
            self.cover(count);
        }
        self.cases.push(case);
        Ok(())
    }

    pub fn cases(&self) -> &[ParamCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn arity(&self) -> Arity {
        let fixed = self
            .cases
            .iter()
            .filter(|case| !case.is_variadic())
            .map(ParamCase::fixed_arity)
            .collect();
        Arity::from_parts(fixed, self.min_rest)
    }
}

fn is_clause(form: &Value) -> bool {
    match form {
        Value::Pair(cons) => matches!(cons.car, Value::Pair(_) | Value::Null),
        Value::Vector(_) => true,
        _ => false,
    }
}

fn parse_cases(args: &[Value]) -> CompileResult<ParamCases> {
    let Some(first) = args.first() else {
        return Err(CompileError::bad_form("lambda", "missing parameter list"));
    };

    let mut cases = ParamCases::new();
    if is_clause(first) {
        for clause in args {
            let items = form_items("lambda", clause)?;
            let Some((params, body)) = items.split_first() else {
                return Err(CompileError::bad_form("lambda", "empty clause"));
            };
            cases.push(ParamCase::parse(params, body.to_vec())?)?;
        }
    } else {
        cases.push(ParamCase::parse(first, args[1..].to_vec())?)?;
    }
    Ok(cases)
}

/// `(lambda name? (params...) body...)` or
/// `(lambda name? ((params...) body...) ...)`
///
/// A lambda with no free variables becomes a closure constant. Otherwise the
/// enclosing body loads each captured value and instantiates the procedure
/// with `MakeClosure` every time control reaches it.
pub(super) fn compile_lambda(encoder: &mut Encoder<'_>, args: &[Value]) -> CompileResult<()> {
    let (name, clauses) = match args.split_first() {
        Some((Value::Symbol(name), rest)) => (Some(name.clone()), rest),
        _ => (None, args),
    };
    let cases = parse_cases(clauses)?;

    let (procedure, captured) = {
        let mut child = encoder.child(name);
        compile_cases(&mut child, &cases)?;
        let captured: Vec<Symbol> = child.captured().iter().map(|(n, _)| n.clone()).collect();
        let procedure = Procedure::new(child.finish(), cases.arity(), encoder.options())?;
        (Arc::new(procedure), captured)
    };

    if captured.is_empty() {
        let closure = procedure.instantiate(&[]);
        return encoder.emit_const(Value::Closure(Arc::new(closure)));
    }

    for name in captured.iter().rev() {
        let Some(cell) = encoder.resolve(name) else {
            panic!("captured name `{}` is not visible from the enclosing body", name);
        };
        encoder.load_raw(cell)?;
    }
    encoder.emit_const(Value::Procedure(procedure))?;
    encoder.emit_with(OpCode::MakeClosure, captured.len())
}

fn compile_cases(encoder: &mut Encoder<'_>, cases: &ParamCases) -> CompileResult<()> {
    if let [case] = cases.cases() {
        return compile_case(encoder, case);
    }

    // Dispatch on the argument count, first matching clause wins.
    let labels: Vec<usize> = cases.cases().iter().map(|_| encoder.new_label()).collect();
    for (case, label) in cases.cases().iter().zip(&labels) {
        encoder.emit_with(OpCode::PosInt, case.fixed_arity())?;
        encoder.emit(OpCode::ArgLen);
        encoder.emit(if case.is_variadic() {
            OpCode::NumGte
        } else {
            OpCode::NumEq
        });
        encoder.emit_with(OpCode::CondJump, *label)?;
    }
    let message = format!("wrong number of arguments: expected {}", cases.arity());
    encoder.emit_const(Value::string(&message))?;
    encoder.emit(OpCode::Panic);

    for (case, label) in cases.cases().iter().zip(labels) {
        encoder.anchor(label)?;
        compile_case(encoder, case)?;
    }
    Ok(())
}

fn compile_case(encoder: &mut Encoder<'_>, case: &ParamCase) -> CompileResult<()> {
    encoder.push_scope(ScopeKind::Args);
    for (index, param) in case.params.iter().enumerate() {
        encoder.bind_arg(param, CellKind::Value, index)?;
    }
    if let Some(rest) = &case.rest {
        encoder.bind_arg(rest, CellKind::Rest, case.params.len())?;
    }
    compile_block(encoder, &case.body)?;
    encoder.emit(OpCode::Return);
    encoder.pop_scope();
    Ok(())
}
