//! The builtin registry handed to the interpreter at construction.
//!
//! The interpreter only looks names up here and calls what it finds with
//! already‑evaluated arguments; arity is checked against [`Arity`] before the
//! call. Builtin bodies report failures as [`NativeError`], without a
//! position.

use std::collections::HashMap;
use std::f64::consts;
use std::io::Write;

use log::debug;

use crate::error::NativeError;
use crate::value::{Arity, NativeFn, NativeFunction, Value};

type NativeResult = Result<Value, NativeError>;

/// Name → builtin mapping. Entries are either callables ([`Value::Native`])
/// or constants such as `pi`.
#[derive(Debug, Clone, Default)]
pub struct Builtins {
    entries: HashMap<String, Value>,
}

impl Builtins {
    /// A registry with nothing in it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard library: math, constants, printing and small utilities.
    pub fn standard() -> Self {
        let mut builtins = Self::empty();

        builtins.register_constant("pi", Value::Number(consts::PI));
        builtins.register_constant("π", Value::Number(consts::PI));
        builtins.register_constant("e", Value::Number(consts::E));

        builtins.register("sin", Arity::Exact(1), |args, _| unary(args, f64::sin));
        builtins.register("cos", Arity::Exact(1), |args, _| unary(args, f64::cos));
        builtins.register("tan", Arity::Exact(1), |args, _| unary(args, f64::tan));
        builtins.register("asin", Arity::Exact(1), asin);
        builtins.register("acos", Arity::Exact(1), acos);
        builtins.register("atan", Arity::Exact(1), |args, _| unary(args, f64::atan));
        builtins.register("sinh", Arity::Exact(1), |args, _| unary(args, f64::sinh));
        builtins.register("cosh", Arity::Exact(1), |args, _| unary(args, f64::cosh));
        builtins.register("tanh", Arity::Exact(1), |args, _| unary(args, f64::tanh));
        builtins.register("exp", Arity::Exact(1), |args, _| unary(args, f64::exp));
        builtins.register("abs", Arity::Exact(1), |args, _| unary(args, f64::abs));
        builtins.register("floor", Arity::Exact(1), |args, _| unary(args, f64::floor));
        builtins.register("ceil", Arity::Exact(1), |args, _| unary(args, f64::ceil));
        builtins.register("round", Arity::Exact(1), |args, _| unary(args, f64::round));
        builtins.register("sqrt", Arity::Exact(1), sqrt);
        builtins.register("log", Arity::Range(1, 2), log);
        builtins.register("pow", Arity::Exact(2), pow);
        builtins.register("min", Arity::AtLeast(1), min);
        builtins.register("max", Arity::AtLeast(1), max);
        builtins.register("print", Arity::AtLeast(0), print);
        builtins.register("len", Arity::Exact(1), len);
        builtins.register("range", Arity::Range(1, 3), range);
        builtins.register("str", Arity::Exact(1), str);
        builtins.register("num", Arity::Exact(1), num);

        builtins
    }

    /// Register (or replace) a callable under `name`.
    pub fn register(&mut self, name: &'static str, arity: Arity, func: NativeFn) {
        debug!("Registering builtin '{}' ({})", name, arity);

        self.entries.insert(
            name.to_string(),
            Value::Native(NativeFunction { name, arity, func }),
        );
    }

    /// Register (or replace) a constant under `name`.
    pub fn register_constant(&mut self, name: &str, value: Value) {
        debug!("Registering constant '{}' = {}", name, value);

        self.entries.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.entries.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// ───────────────────────────── argument helpers ────────────────────────────

fn number(args: &[Value], index: usize) -> Result<f64, NativeError> {
    match args.get(index) {
        Some(Value::Number(n)) => Ok(*n),
        Some(other) => Err(NativeError::Type(format!(
            "argument {} must be a number, got {}",
            index + 1,
            other.type_name()
        ))),
        None => Err(NativeError::Type(format!("missing argument {}", index + 1))),
    }
}

fn first(args: &[Value]) -> Result<&Value, NativeError> {
    args.first()
        .ok_or_else(|| NativeError::Type("missing argument 1".to_string()))
}

fn unary(args: &[Value], f: fn(f64) -> f64) -> NativeResult {
    Ok(Value::Number(f(number(args, 0)?)))
}

fn domain(message: &str) -> NativeError {
    NativeError::Domain(message.to_string())
}

// ───────────────────────────── builtin bodies ──────────────────────────────

fn sqrt(args: &[Value], _out: &mut dyn Write) -> NativeResult {
    let x = number(args, 0)?;

    if x < 0.0 {
        return Err(domain("math domain error"));
    }

    Ok(Value::Number(x.sqrt()))
}

fn asin(args: &[Value], _out: &mut dyn Write) -> NativeResult {
    let x = number(args, 0)?;

    if !(-1.0..=1.0).contains(&x) {
        return Err(domain("math domain error"));
    }

    Ok(Value::Number(x.asin()))
}

fn acos(args: &[Value], _out: &mut dyn Write) -> NativeResult {
    let x = number(args, 0)?;

    if !(-1.0..=1.0).contains(&x) {
        return Err(domain("math domain error"));
    }

    Ok(Value::Number(x.acos()))
}

/// `log(x)` is the natural logarithm; `log(x, base)` uses `base`.
fn log(args: &[Value], _out: &mut dyn Write) -> NativeResult {
    let x = number(args, 0)?;

    if x <= 0.0 {
        return Err(domain("math domain error"));
    }

    if args.len() == 1 {
        return Ok(Value::Number(x.ln()));
    }

    let base = number(args, 1)?;

    if base <= 0.0 || base == 1.0 {
        return Err(domain("invalid logarithm base"));
    }

    Ok(Value::Number(x.ln() / base.ln()))
}

fn pow(args: &[Value], _out: &mut dyn Write) -> NativeResult {
    Ok(Value::Number(number(args, 0)?.powf(number(args, 1)?)))
}

fn min(args: &[Value], _out: &mut dyn Write) -> NativeResult {
    let mut best = number(args, 0)?;

    for i in 1..args.len() {
        best = best.min(number(args, i)?);
    }

    Ok(Value::Number(best))
}

fn max(args: &[Value], _out: &mut dyn Write) -> NativeResult {
    let mut best = number(args, 0)?;

    for i in 1..args.len() {
        best = best.max(number(args, i)?);
    }

    Ok(Value::Number(best))
}

/// Space‑separated, newline‑terminated.
fn print(args: &[Value], out: &mut dyn Write) -> NativeResult {
    let line: Vec<String> = args.iter().map(Value::to_string).collect();

    writeln!(out, "{}", line.join(" "))?;

    Ok(Value::None)
}

fn len(args: &[Value], _out: &mut dyn Write) -> NativeResult {
    match first(args)? {
        Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
        Value::List(items) => Ok(Value::Number(items.len() as f64)),
        other => Err(NativeError::Type(format!(
            "argument must be a string or list, got {}",
            other.type_name()
        ))),
    }
}

/// Longest list `range` will build.
pub const MAX_RANGE_LEN: usize = 1_000_000;

/// `range(end)`, `range(start, end)` or `range(start, end, step)`; `end` is
/// exclusive.
fn range(args: &[Value], _out: &mut dyn Write) -> NativeResult {
    let (start, end) = if args.len() == 1 {
        (0.0, number(args, 0)?)
    } else {
        (number(args, 0)?, number(args, 1)?)
    };

    let step = if args.len() == 3 { number(args, 2)? } else { 1.0 };

    if step == 0.0 || !step.is_finite() {
        return Err(domain("step must be a non-zero finite number"));
    }

    if !start.is_finite() || !end.is_finite() {
        return Err(domain("bounds must be finite numbers"));
    }

    // Elements are start + i * step; repeated addition stalls past 2^53.
    let span = ((end - start) / step).ceil();
    let count = if span > 0.0 { span } else { 0.0 };

    if count > MAX_RANGE_LEN as f64 {
        return Err(NativeError::Domain(format!(
            "range of {} elements exceeds the limit of {}",
            count, MAX_RANGE_LEN
        )));
    }

    let items: Vec<Value> = (0..count as usize)
        .map(|i| Value::Number(start + i as f64 * step))
        .collect();

    Ok(Value::List(items))
}

fn str(args: &[Value], _out: &mut dyn Write) -> NativeResult {
    Ok(Value::String(first(args)?.to_string()))
}

fn num(args: &[Value], _out: &mut dyn Write) -> NativeResult {
    match first(args)? {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|_| domain(&format!("cannot convert {:?} to a number", s))),
        other => Err(NativeError::Type(format!(
            "cannot convert {} to a number",
            other.type_name()
        ))),
    }
}
