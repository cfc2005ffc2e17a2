//! Tree‑walking evaluator.
//!
//! Statements execute against an explicit [`Env`] and report how they
//! finished through [`Flow`]; only a user function call consumes a
//! `Flow::Return`, so a `return` unwinds exactly one call frame.
//!
//! Bare names resolve through the scope chain first and the builtin registry
//! second, so user bindings shadow builtins of the same name.
//!
//! Nesting is bounded by a depth budget: each block body and each user call
//! costs one level, and exceeding it is a `RecursionLimit` error. Evaluation
//! moves onto heap‑allocated stack segments with `stacker` when the native
//! stack runs low, so the budget holds on small thread stacks too.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::builtins::Builtins;
use crate::environment::{Env, Environment};
use crate::error::{MathScriptError, Result};
use crate::expr::{AggregateKind, BinaryOp, Expr, UnaryOp};
use crate::parser::parse_source;
use crate::stmt::Stmt;
use crate::token::Position;
use crate::value::{Function, NativeFunction, Value};

/// Default limit on nested blocks and function calls.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Stack left before evaluation continues on a fresh segment.
const STACK_RED_ZONE: usize = 128 * 1024;

/// Size of each extra stack segment.
const STACK_GROW_SIZE: usize = 2 * 1024 * 1024;

/// Steps of the left Riemann sum behind `∫`.
const INTEGRAL_STEPS: usize = 1000;

/// How a statement or block finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Ran to completion; continue with the next statement.
    Normal,
    /// A `return` fired; unwind to the enclosing call.
    Return(Value),
}

/// Something a call expression can invoke.
enum Callee {
    User(Rc<Function>),
    Native(NativeFunction),
}

/// One interpreter session: the root scope, the builtins and the output sink.
/// Bindings persist across [`interpret`](Interpreter::interpret) calls until
/// the interpreter is dropped.
pub struct Interpreter {
    globals: Env,
    builtins: Builtins,
    output: Box<dyn Write>,
    depth: usize,
    calls: usize,
    max_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Standard builtins, printing to stdout.
    pub fn new() -> Self {
        Self::with_builtins(Builtins::standard(), Box::new(io::stdout()))
    }

    pub fn with_builtins(builtins: Builtins, output: Box<dyn Write>) -> Self {
        info!(
            "Initializing Interpreter with {} builtins",
            builtins.names().len()
        );

        Self {
            globals: Environment::root(),
            builtins,
            output,
            depth: 0,
            calls: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit on how deeply blocks and function calls may nest. Every
    /// `if`/`while`/`for` body and every user call counts one level.
    pub fn with_max_depth(mut self, limit: usize) -> Self {
        self.max_depth = limit;
        self
    }

    /// The root scope of this session.
    pub fn globals(&self) -> &Env {
        &self.globals
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Name‑sorted copy of the root scope's bindings.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.globals.borrow().snapshot()
    }

    /// Executes a program's top‑level statements in order.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        let globals: Env = Rc::clone(&self.globals);

        for stmt in statements {
            self.execute(stmt, &globals)?;
        }

        info!("Interpretation completed successfully");

        Ok(())
    }

    /// Lex, parse and run `source` in this session.
    ///
    /// Returns the value of the final statement when it is a bare
    /// expression, which is what the REPL echoes.
    pub fn run_source(&mut self, source: &str) -> Result<Option<Value>> {
        let statements: Vec<Stmt> = parse_source(source)?;

        let (last, init) = match statements.split_last() {
            Some((Stmt::Expression(expr), init)) => (Some(expr), init),
            _ => (None, statements.as_slice()),
        };

        self.interpret(init)?;

        match last {
            Some(expr) => {
                let globals: Env = Rc::clone(&self.globals);
                Ok(Some(self.evaluate(expr, &globals)?))
            }
            None => Ok(None),
        }
    }

    // ─────────────────────────────── statements ──────────────────────────────

    /// Executes a single statement in `env`.
    pub fn execute(&mut self, stmt: &Stmt, env: &Env) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr, env)?;
                Ok(Flow::Normal)
            }

            Stmt::Assign { name, value, .. } => {
                let value: Value = self.evaluate(value, env)?;
                env.borrow_mut().define(name, value);
                Ok(Flow::Normal)
            }

            Stmt::If {
                condition,
                then_block,
                else_block,
                pos,
            } => {
                let value: Value = self.evaluate(condition, env)?;

                let block = if expect_bool(&value, *pos, "if condition")? {
                    debug!("Condition is true; executing then block");
                    Some(then_block)
                } else {
                    debug!("Condition is false; executing else block if any");
                    else_block.as_ref()
                };

                match block {
                    Some(block) => self.nested_block(block, &Environment::child(env), *pos),
                    None => Ok(Flow::Normal),
                }
            }

            Stmt::While {
                condition,
                body,
                pos,
            } => {
                debug!("Entering while loop");

                loop {
                    let value: Value = self.evaluate(condition, env)?;

                    if !expect_bool(&value, *pos, "while condition")? {
                        break;
                    }

                    if let Flow::Return(value) =
                        self.nested_block(body, &Environment::child(env), *pos)?
                    {
                        return Ok(Flow::Return(value));
                    }
                }

                debug!("Exited while loop");

                Ok(Flow::Normal)
            }

            Stmt::For {
                var,
                iterable,
                body,
                pos,
            } => {
                let iterable: Value = self.evaluate(iterable, env)?;
                let items: Vec<Value> = iterate(iterable, *pos)?;

                debug!("Entering for loop over {} item(s)", items.len());

                for item in items {
                    // The loop variable lives in the enclosing scope.
                    env.borrow_mut().define(var, item);

                    if let Flow::Return(value) =
                        self.nested_block(body, &Environment::child(env), *pos)?
                    {
                        return Ok(Flow::Return(value));
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Function {
                name, params, body, ..
            } => {
                debug!("Defining function '{}'", name);

                let function = Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::clone(body),
                    closure: Rc::clone(env),
                };

                env.borrow_mut()
                    .define(name, Value::Function(Rc::new(function)));

                Ok(Flow::Normal)
            }

            Stmt::Return { value, pos } => {
                if self.calls == 0 {
                    return Err(MathScriptError::ReturnOutsideFunction { pos: *pos });
                }

                let value: Value = match value {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::None,
                };

                debug!("Returning value: {}", value);

                Ok(Flow::Return(value))
            }
        }
    }

    /// Runs `statements` in `env`, stopping at the first `return`.
    pub fn execute_block(&mut self, statements: &[Stmt], env: &Env) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt, env)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    /// Runs a nested block, charging one level against the depth limit.
    fn nested_block(&mut self, statements: &[Stmt], env: &Env, pos: Position) -> Result<Flow> {
        if self.depth >= self.max_depth {
            debug!("Depth limit {} reached at {}", self.max_depth, pos);

            return Err(MathScriptError::RecursionLimit {
                limit: self.max_depth,
                pos,
            });
        }

        self.depth += 1;
        let flow: Result<Flow> = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.execute_block(statements, env)
        });
        self.depth -= 1;

        flow
    }

    // ────────────────────────────── expressions ──────────────────────────────

    /// Evaluates an expression in `env`.
    pub fn evaluate(&mut self, expr: &Expr, env: &Env) -> Result<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.evaluate_inner(expr, env)
        })
    }

    fn evaluate_inner(&mut self, expr: &Expr, env: &Env) -> Result<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),

            Expr::Str(s) => Ok(Value::String(s.clone())),

            Expr::Bool(b) => Ok(Value::Bool(*b)),

            Expr::Variable { name, pos } => self.lookup(name, *pos, env),

            Expr::Binary {
                op: op @ (BinaryOp::And | BinaryOp::Or),
                left,
                right,
                pos,
            } => {
                let left: Value = self.evaluate(left, env)?;
                let left: bool = expect_bool(&left, *pos, op.symbol())?;

                // Short‑circuit: the right operand is not evaluated.
                match (op, left) {
                    (BinaryOp::And, false) => return Ok(Value::Bool(false)),
                    (BinaryOp::Or, true) => return Ok(Value::Bool(true)),
                    _ => {}
                }

                let right: Value = self.evaluate(right, env)?;

                Ok(Value::Bool(expect_bool(&right, *pos, op.symbol())?))
            }

            Expr::Binary {
                op,
                left,
                right,
                pos,
            } => {
                let left: Value = self.evaluate(left, env)?;
                let right: Value = self.evaluate(right, env)?;

                binary(*op, left, right, *pos)
            }

            Expr::Unary { op, operand, pos } => {
                let value: Value = self.evaluate(operand, env)?;

                unary(*op, value, *pos)
            }

            Expr::Call { name, args, pos } => self.call(name, args, *pos, env),

            Expr::Aggregate {
                kind,
                var,
                start,
                end,
                body,
                pos,
            } => self.aggregate(*kind, var, start, end, body, *pos, env),
        }
    }

    /// Scope chain first, builtins second.
    fn lookup(&self, name: &str, pos: Position, env: &Env) -> Result<Value> {
        let local: Option<Value> = env.borrow().get(name);

        match local.or_else(|| self.builtins.get(name)) {
            Some(value) => Ok(value),
            None => {
                debug!("Undefined name '{}' at {}", name, pos);

                Err(MathScriptError::UndefinedName {
                    name: name.to_string(),
                    pos,
                })
            }
        }
    }

    // ──────────────────────────────── calls ──────────────────────────────────

    fn call(&mut self, name: &str, args: &[Expr], pos: Position, env: &Env) -> Result<Value> {
        match self.resolve_callee(name, pos, env)? {
            Callee::User(function) => self.call_function(&function, args, pos, env),
            Callee::Native(native) => self.call_native(&native, args, pos, env),
        }
    }

    /// A callable bound in the scope chain wins; otherwise a builtin callable.
    fn resolve_callee(&self, name: &str, pos: Position, env: &Env) -> Result<Callee> {
        let bound: Option<Value> = env.borrow().get(name);

        match &bound {
            Some(Value::Function(function)) => return Ok(Callee::User(Rc::clone(function))),
            Some(Value::Native(native)) => return Ok(Callee::Native(native.clone())),
            _ => {}
        }

        if let Some(Value::Native(native)) = self.builtins.get(name) {
            return Ok(Callee::Native(native));
        }

        match bound.or_else(|| self.builtins.get(name)) {
            Some(value) => Err(MathScriptError::type_error(
                pos,
                format!("'{}' is a {}, not a function", name, value.type_name()),
            )),
            None => Err(MathScriptError::UndefinedName {
                name: name.to_string(),
                pos,
            }),
        }
    }

    fn call_function(
        &mut self,
        function: &Function,
        args: &[Expr],
        pos: Position,
        env: &Env,
    ) -> Result<Value> {
        debug!("Calling user-defined function '{}'", function.name);

        if args.len() != function.arity() {
            return Err(MathScriptError::Arity {
                name: function.name.clone(),
                expected: function.arity().to_string(),
                found: args.len(),
                pos,
            });
        }

        // Arguments are evaluated in the caller's scope...
        let mut values: Vec<Value> = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.evaluate(arg, env)?);
        }

        // ...and bound in a fresh child of the defining scope.
        let frame: Env = Environment::child(&function.closure);
        for (param, value) in function.params.iter().zip(values) {
            frame.borrow_mut().define(param, value);
        }

        self.calls += 1;
        let result: Result<Flow> = self.nested_block(&function.body, &frame, pos);
        self.calls -= 1;

        match result? {
            Flow::Return(value) => {
                info!("Function '{}' returned: {}", function.name, value);
                Ok(value)
            }
            Flow::Normal => Ok(Value::None),
        }
    }

    fn call_native(
        &mut self,
        native: &NativeFunction,
        args: &[Expr],
        pos: Position,
        env: &Env,
    ) -> Result<Value> {
        debug!("Calling builtin '{}'", native.name);

        if !native.arity.accepts(args.len()) {
            return Err(MathScriptError::Arity {
                name: native.name.to_string(),
                expected: native.arity.to_string(),
                found: args.len(),
                pos,
            });
        }

        let mut values: Vec<Value> = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.evaluate(arg, env)?);
        }

        let result: Value = (native.func)(&values, self.output.as_mut())
            .map_err(|e| e.at(native.name, pos))?;

        self.output.flush()?;

        Ok(result)
    }

    // ────────────────────────────── aggregates ───────────────────────────────

    #[allow(clippy::too_many_arguments)]
    fn aggregate(
        &mut self,
        kind: AggregateKind,
        var: &str,
        start: &Expr,
        end: &Expr,
        body: &Expr,
        pos: Position,
        env: &Env,
    ) -> Result<Value> {
        let start: Value = self.evaluate(start, env)?;
        let start: f64 = expect_number(&start, pos, "lower bound")?;
        let end: Value = self.evaluate(end, env)?;
        let end: f64 = expect_number(&end, pos, "upper bound")?;

        debug!("{} over '{}' from {} to {}", kind.symbol(), var, start, end);

        // The bound variable is private to the aggregate.
        let scope: Env = Environment::child(env);

        let total: f64 = match kind {
            AggregateKind::Sum | AggregateKind::Product => {
                let mut acc: f64 = if kind == AggregateKind::Sum { 0.0 } else { 1.0 };

                for i in (start.trunc() as i64)..=(end.trunc() as i64) {
                    scope.borrow_mut().define(var, Value::Number(i as f64));

                    let term: Value = self.evaluate(body, &scope)?;
                    let term: f64 = expect_number(&term, pos, "aggregate body")?;

                    if kind == AggregateKind::Sum {
                        acc += term;
                    } else {
                        acc *= term;
                    }
                }

                acc
            }

            AggregateKind::Integral => {
                let delta: f64 = (end - start) / INTEGRAL_STEPS as f64;
                let mut acc: f64 = 0.0;

                for i in 0..INTEGRAL_STEPS {
                    let x: f64 = start + i as f64 * delta;
                    scope.borrow_mut().define(var, Value::Number(x));

                    let term: Value = self.evaluate(body, &scope)?;
                    acc += expect_number(&term, pos, "integrand")? * delta;
                }

                acc
            }
        };

        Ok(Value::Number(total))
    }
}

// ─────────────────────────────── operators ───────────────────────────────────

fn binary(op: BinaryOp, left: Value, right: Value, pos: Position) -> Result<Value> {
    debug!("Binary {} on {} and {}", op.symbol(), left, right);

    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            (a, b) => Err(MathScriptError::type_error(
                pos,
                format!(
                    "operands of '+' must be two numbers or two strings, got {} and {}",
                    a.type_name(),
                    b.type_name()
                ),
            )),
        },

        BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Power => {
            let (a, b) = numbers(op, &left, &right, pos)?;

            let n: f64 = match op {
                BinaryOp::Subtract => a - b,
                BinaryOp::Multiply => a * b,
                _ => a.powf(b),
            };

            Ok(Value::Number(n))
        }

        BinaryOp::Divide | BinaryOp::Modulo => {
            let (a, b) = numbers(op, &left, &right, pos)?;

            if b == 0.0 {
                return Err(MathScriptError::DivisionByZero { pos });
            }

            let n: f64 = if op == BinaryOp::Divide { a / b } else { a % b };

            Ok(Value::Number(n))
        }

        BinaryOp::Equal | BinaryOp::NotEqual => {
            let comparable: bool = matches!(
                (&left, &right),
                (Value::Number(_), Value::Number(_))
                    | (Value::String(_), Value::String(_))
                    | (Value::Bool(_), Value::Bool(_))
                    | (Value::List(_), Value::List(_))
                    | (Value::None, Value::None)
            );

            if !comparable {
                return Err(MathScriptError::type_error(
                    pos,
                    format!(
                        "cannot compare {} with {}",
                        left.type_name(),
                        right.type_name()
                    ),
                ));
            }

            let equal: bool = left == right;

            Ok(Value::Bool(if op == BinaryOp::Equal { equal } else { !equal }))
        }

        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            let ordering = match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => {
                    return Err(MathScriptError::type_error(
                        pos,
                        format!(
                            "cannot order {} and {} with '{}'",
                            left.type_name(),
                            right.type_name(),
                            op.symbol()
                        ),
                    ))
                }
            };

            // NaN compares false against everything.
            let result: bool = match ordering {
                Some(ordering) => match op {
                    BinaryOp::Less => ordering.is_lt(),
                    BinaryOp::LessEqual => ordering.is_le(),
                    BinaryOp::Greater => ordering.is_gt(),
                    _ => ordering.is_ge(),
                },
                None => false,
            };

            Ok(Value::Bool(result))
        }

        // Reached only without short‑circuiting, e.g. from a host calling
        // this on two already evaluated operands.
        BinaryOp::And | BinaryOp::Or => {
            let a: bool = expect_bool(&left, pos, op.symbol())?;
            let b: bool = expect_bool(&right, pos, op.symbol())?;

            Ok(Value::Bool(if op == BinaryOp::And { a && b } else { a || b }))
        }
    }
}

fn unary(op: UnaryOp, value: Value, pos: Position) -> Result<Value> {
    match op {
        UnaryOp::Negate => Ok(Value::Number(-expect_number(&value, pos, "operand of '-'")?)),
        UnaryOp::Plus => Ok(Value::Number(expect_number(&value, pos, "operand of '+'")?)),
        UnaryOp::Not => Ok(Value::Bool(!expect_bool(&value, pos, "operand of 'not'")?)),
    }
}

fn numbers(op: BinaryOp, left: &Value, right: &Value, pos: Position) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(MathScriptError::type_error(
            pos,
            format!(
                "operands of '{}' must be numbers, got {} and {}",
                op.symbol(),
                left.type_name(),
                right.type_name()
            ),
        )),
    }
}

fn expect_bool(value: &Value, pos: Position, context: &str) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(MathScriptError::type_error(
            pos,
            format!("{} must be a boolean, got {}", context, other.type_name()),
        )),
    }
}

fn expect_number(value: &Value, pos: Position, context: &str) -> Result<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(MathScriptError::type_error(
            pos,
            format!("{} must be a number, got {}", context, other.type_name()),
        )),
    }
}

/// Items a `for` loop visits: list elements, or the characters of a string.
fn iterate(value: Value, pos: Position) -> Result<Vec<Value>> {
    match value {
        Value::List(items) => Ok(items),
        Value::String(s) => Ok(s.chars().map(|c| Value::String(c.to_string())).collect()),
        other => Err(MathScriptError::NotIterable {
            type_name: other.type_name(),
            pos,
        }),
    }
}
