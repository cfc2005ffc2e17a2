use std::rc::Rc;

use crate::expr::Expr;
use crate::token::Position;

/// A braced sequence of statements.
pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(Expr),

    // name = value
    Assign {
        name: String,
        value: Expr,
        pos: Position,
    },

    If {
        condition: Expr,
        then_block: Block,
        else_block: Option<Block>,
        pos: Position,
    },

    While {
        condition: Expr,
        body: Block,
        pos: Position,
    },

    // for var in iterable { body }
    For {
        var: String,
        iterable: Expr,
        body: Block,
        pos: Position,
    },

    // The body is shared with every closure created from this definition.
    Function {
        name: String,
        params: Vec<String>,
        body: Rc<[Stmt]>,
        pos: Position,
    },

    Return {
        value: Option<Expr>,
        pos: Position,
    },
}
