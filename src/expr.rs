use crate::token::{Operator, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    /// Map an operator token to the binary operation it denotes, if any.
    pub fn from_operator(op: Operator) -> Option<Self> {
        let op = match op {
            Operator::Plus => BinaryOp::Add,
            Operator::Minus => BinaryOp::Subtract,
            Operator::Star => BinaryOp::Multiply,
            Operator::Slash => BinaryOp::Divide,
            Operator::Caret => BinaryOp::Power,
            Operator::Percent => BinaryOp::Modulo,
            Operator::EqualEqual => BinaryOp::Equal,
            Operator::BangEqual => BinaryOp::NotEqual,
            Operator::Less => BinaryOp::Less,
            Operator::LessEqual => BinaryOp::LessEqual,
            Operator::Greater => BinaryOp::Greater,
            Operator::GreaterEqual => BinaryOp::GreaterEqual,
            _ => return None,
        };

        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Power => "^",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Plus,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "not",
        }
    }
}

/// Which fold an aggregate expression performs over its bound variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    /// `∑(i = a to b) body`
    Sum,
    /// `∏(i = a to b) body`
    Product,
    /// `∫(x = a to b) body dx`, a left Riemann sum.
    Integral,
}

impl AggregateKind {
    pub fn symbol(self) -> &'static str {
        match self {
            AggregateKind::Sum => "∑",
            AggregateKind::Product => "∏",
            AggregateKind::Integral => "∫",
        }
    }
}

/// Expression nodes. Every variant that can fail at runtime carries the
/// position of the token that introduced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),

    Str(String),

    Bool(bool),

    Variable {
        name: String,
        pos: Position,
    },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        pos: Position,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        pos: Position,
    },

    Call {
        name: String,
        args: Vec<Expr>,
        pos: Position,
    },

    Aggregate {
        kind: AggregateKind,
        var: String,
        start: Box<Expr>,
        end: Box<Expr>,
        body: Box<Expr>,
        pos: Position,
    },
}
