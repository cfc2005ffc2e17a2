/*!
Recursive‑descent parser for MathScript.

Each grammar level is one method; precedence is encoded by the call chain,
lowest precedence outermost. Every binary level is left‑associative. The
first grammar violation aborts the whole parse: there is no statement‑level
recovery.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `statement`                  | `debug`| High‑level descent into grammar branches. |
| Error paths (`consume`, etc.)| `debug`| Context before returning structured error.|

Grammar (EBNF, condensed)
--------------------------

```text
program        → statement* EOF ;
statement      → ( funcDef | ifStmt | whileStmt | forStmt | returnStmt
                 | assignment | expression ) ";"? ;
funcDef        → "function" IDENT "(" parameters? ")" block ;
ifStmt         → "if" expression block ( "else" ( ifStmt | block ) )? ;
whileStmt      → "while" expression block ;
forStmt        → "for" IDENT "in" expression block ;
returnStmt     → "return" expression? ;
assignment     → IDENT "=" expression ;
block          → "{" statement* "}" ;
parameters     → IDENT ( "," IDENT )* ;
expression     → logic_or ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → comparison ( "and" comparison )* ;
comparison     → additive ( ( "==" | "!=" | "<" | "<=" | ">" | ">=" ) additive )* ;
additive       → multiplicative ( ( "+" | "-" ) multiplicative )* ;
multiplicative → power ( ( "*" | "/" | "%" ) power )* ;
power          → unary ( "^" unary )* ;
unary          → ( "-" | "+" | "not" ) unary | primary ;
primary        → NUMBER | STRING | "true" | "false"
               | IDENT | IDENT "(" arguments? ")"
               | "(" expression ")" | aggregate ;
arguments      → expression ( "," expression )* ;
aggregate      → ( "∑" | "∏" | "∫" ) "(" IDENT "=" expression "to" expression ")"
                 unary ( "d" IDENT )? ;
```
*/

use std::rc::Rc;

use crate::error::{MathScriptError, Result};
use crate::expr::{AggregateKind, BinaryOp, Expr, UnaryOp};
use crate::scanner::tokenize;
use crate::stmt::{Block, Stmt};
use crate::token::{Keyword, Operator, Position, Token, TokenKind};

use log::{debug, info};

const MAX_ARGS: usize = 255;

/// Limit on syntactic nesting: parenthesised or unary operands, chained
/// binary operators and blocks each count one level.
const MAX_NESTING: usize = 256;

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

const COMPARISON_OPS: &[Operator] = &[
    Operator::EqualEqual,
    Operator::BangEqual,
    Operator::Less,
    Operator::LessEqual,
    Operator::Greater,
    Operator::GreaterEqual,
];
const ADDITIVE_OPS: &[Operator] = &[Operator::Plus, Operator::Minus];
const MULTIPLICATIVE_OPS: &[Operator] = &[Operator::Star, Operator::Slash, Operator::Percent];
const POWER_OPS: &[Operator] = &[Operator::Caret];

/// Tokenize and parse `source` in one step.
pub fn parse_source(source: &str) -> Result<Vec<Stmt>> {
    let tokens: Vec<Token<'_>> = tokenize(source)?;

    Parser::new(&tokens).parse()
}

/// Top‑level parser over an immutable slice of tokens.
///
/// The slice must end with an `EndOfInput` token, as produced by
/// [`tokenize`]; [`parse`](Parser::parse) rejects any other slice.
pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    current: usize,
    nesting: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            nesting: 0,
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program and return its top‑level statements.
    pub fn parse(&mut self) -> Result<Vec<Stmt>> {
        info!("Beginning parse phase");

        match self.tokens.last() {
            Some(Token {
                kind: TokenKind::EndOfInput,
                ..
            }) => {}
            last => {
                let pos: Position = last.map_or(Position::new(1, 1), |token| token.pos);

                return Err(MathScriptError::parse(
                    pos,
                    "token sequence ending in end of input",
                    "unterminated token sequence",
                ));
            }
        }

        let mut statements: Vec<Stmt> = Vec::new();

        loop {
            self.skip_separators();

            if self.is_at_end() {
                break;
            }

            statements.push(self.statement()?);
        }

        info!("Parsed {} top-level statements", statements.len());

        Ok(statements)
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        debug!("Entering statement at {}", self.peek().pos);

        let stmt = if self.matches_keyword(Keyword::Function) {
            self.function_definition()?
        } else if self.matches_keyword(Keyword::If) {
            self.if_statement()?
        } else if self.matches_keyword(Keyword::While) {
            self.while_statement()?
        } else if self.matches_keyword(Keyword::For) {
            self.for_statement()?
        } else if self.matches_keyword(Keyword::Return) {
            self.return_statement()?
        } else if self.check(&TokenKind::Identifier) && self.next_is_assign() {
            self.assignment()?
        } else {
            Stmt::Expression(self.expression()?)
        };

        self.matches(&TokenKind::Semicolon);

        Ok(stmt)
    }

    fn function_definition(&mut self) -> Result<Stmt> {
        let pos: Position = self.previous().pos;
        let name: &Token<'_> = self.consume(&TokenKind::Identifier, "function name")?;

        self.consume(&TokenKind::LParen, "'(' after function name")?;

        let mut params: Vec<String> = Vec::new();

        if !self.check(&TokenKind::RParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    return Err(MathScriptError::parse(
                        self.peek().pos,
                        format!("at most {} parameters", MAX_ARGS),
                        self.peek().describe(),
                    ));
                }

                let param: &Token<'_> = self.consume(&TokenKind::Identifier, "parameter name")?;
                params.push(param.lexeme.to_string());

                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.consume(&TokenKind::RParen, "')' after parameters")?;

        let body: Block = self.block()?;

        debug!(
            "Parsed function '{}' with {} parameter(s)",
            name.lexeme,
            params.len()
        );

        Ok(Stmt::Function {
            name: name.lexeme.to_string(),
            params,
            body: Rc::from(body),
            pos,
        })
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        let pos: Position = self.previous().pos;
        let condition: Expr = self.expression()?;
        let then_block: Block = self.block()?;

        let else_block: Option<Block> = if self.matches_keyword(Keyword::Else) {
            if self.matches_keyword(Keyword::If) {
                self.enter("else-if branches")?;
                let chained: Stmt = self.if_statement()?;
                self.nesting -= 1;

                Some(vec![chained])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_block,
            else_block,
            pos,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        let pos: Position = self.previous().pos;
        let condition: Expr = self.expression()?;
        let body: Block = self.block()?;

        Ok(Stmt::While {
            condition,
            body,
            pos,
        })
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        let pos: Position = self.previous().pos;
        let var: &Token<'_> = self.consume(&TokenKind::Identifier, "loop variable after 'for'")?;

        self.consume(&TokenKind::Keyword(Keyword::In), "'in' after loop variable")?;

        let iterable: Expr = self.expression()?;
        let body: Block = self.block()?;

        Ok(Stmt::For {
            var: var.lexeme.to_string(),
            iterable,
            body,
            pos,
        })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let pos: Position = self.previous().pos;

        let value: Option<Expr> = if self.check(&TokenKind::RBrace)
            || self.check(&TokenKind::Semicolon)
            || self.is_at_end()
        {
            None
        } else {
            Some(self.expression()?)
        };

        Ok(Stmt::Return { value, pos })
    }

    fn assignment(&mut self) -> Result<Stmt> {
        let name: &Token<'_> = self.advance();
        let pos: Position = name.pos;

        self.consume(&TokenKind::Operator(Operator::Assign), "'='")?;

        let value: Expr = self.expression()?;

        Ok(Stmt::Assign {
            name: name.lexeme.to_string(),
            value,
            pos,
        })
    }

    /// `{ statement* }`. Running out of tokens before the `}` is an error.
    fn block(&mut self) -> Result<Block> {
        self.consume(&TokenKind::LBrace, "'{' to open block")?;
        self.enter("blocks")?;

        let mut statements: Block = Vec::new();

        loop {
            self.skip_separators();

            if self.check(&TokenKind::RBrace) || self.is_at_end() {
                break;
            }

            let stmt: Stmt =
                stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.statement())?;
            statements.push(stmt);
        }

        self.consume(&TokenKind::RBrace, "'}' to close block")?;
        self.nesting -= 1;

        Ok(statements)
    }

    // ───────────────────────── expression rules ───────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.enter("expressions")?;

        let expr: Expr =
            stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.logical_or())?;

        self.nesting -= 1;

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logical_and()?;
        let mut folds: usize = 0;

        while self.matches_keyword(Keyword::Or) {
            let pos: Position = self.previous().pos;
            self.enter("operators")?;
            folds += 1;
            let right: Expr = self.logical_and()?;

            expr = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(expr),
                right: Box::new(right),
                pos,
            };
        }

        self.nesting -= folds;

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.comparison()?;
        let mut folds: usize = 0;

        while self.matches_keyword(Keyword::And) {
            let pos: Position = self.previous().pos;
            self.enter("operators")?;
            folds += 1;
            let right: Expr = self.comparison()?;

            expr = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(expr),
                right: Box::new(right),
                pos,
            };
        }

        self.nesting -= folds;

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_level(COMPARISON_OPS, Self::additive)
    }

    fn additive(&mut self) -> Result<Expr> {
        self.binary_level(ADDITIVE_OPS, Self::multiplicative)
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        self.binary_level(MULTIPLICATIVE_OPS, Self::power)
    }

    fn power(&mut self) -> Result<Expr> {
        self.binary_level(POWER_OPS, Self::unary)
    }

    /// One left‑associative level: `operand ( op operand )*`, folding left.
    fn binary_level(
        &mut self,
        ops: &[Operator],
        operand: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut expr: Expr = operand(self)?;
        let mut folds: usize = 0;

        while let Some((op, pos)) = self.match_operator(ops) {
            self.enter("operators")?;
            folds += 1;
            let right: Expr = operand(self)?;

            // Every operator listed in the level tables maps to a BinaryOp.
            let op: BinaryOp = match BinaryOp::from_operator(op) {
                Some(op) => op,
                None => {
                    return Err(MathScriptError::parse(pos, "binary operator", op.as_str()));
                }
            };

            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
                pos,
            };
        }

        self.nesting -= folds;

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        let op: Option<UnaryOp> = match self.peek().kind {
            TokenKind::Operator(Operator::Minus) => Some(UnaryOp::Negate),
            TokenKind::Operator(Operator::Plus) => Some(UnaryOp::Plus),
            TokenKind::Keyword(Keyword::Not) => Some(UnaryOp::Not),
            _ => None,
        };

        if let Some(op) = op {
            let pos: Position = self.advance().pos;
            self.enter("unary operators")?;
            let operand: Expr = self.unary()?;
            self.nesting -= 1;

            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                pos,
            });
        }

        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        let token: &'a Token<'a> = self.peek();

        match &token.kind {
            TokenKind::Number => {
                self.advance();

                let n: f64 = token.lexeme.parse::<f64>().map_err(|_| {
                    MathScriptError::parse(token.pos, "numeric literal", token.describe())
                })?;

                Ok(Expr::Number(n))
            }

            TokenKind::String(s) => {
                self.advance();

                Ok(Expr::Str(s.clone()))
            }

            TokenKind::Keyword(Keyword::True) => {
                self.advance();

                Ok(Expr::Bool(true))
            }

            TokenKind::Keyword(Keyword::False) => {
                self.advance();

                Ok(Expr::Bool(false))
            }

            TokenKind::Identifier => {
                self.advance();

                if self.matches(&TokenKind::LParen) {
                    return self.finish_call(token);
                }

                Ok(Expr::Variable {
                    name: token.lexeme.to_string(),
                    pos: token.pos,
                })
            }

            TokenKind::LParen => {
                self.advance();

                let expr: Expr = self.expression()?;

                self.consume(&TokenKind::RParen, "')' after expression")?;

                Ok(expr)
            }

            TokenKind::Operator(Operator::Sum) => self.aggregate(AggregateKind::Sum),
            TokenKind::Operator(Operator::Product) => self.aggregate(AggregateKind::Product),
            TokenKind::Operator(Operator::Integral) => self.aggregate(AggregateKind::Integral),

            _ => {
                debug!("No expression starts with {}", token.describe());

                Err(self.error_here("expression"))
            }
        }
    }

    fn finish_call(&mut self, callee: &Token<'_>) -> Result<Expr> {
        let mut args: Vec<Expr> = Vec::new();

        if !self.check(&TokenKind::RParen) {
            loop {
                if args.len() >= MAX_ARGS {
                    return Err(MathScriptError::parse(
                        self.peek().pos,
                        format!("at most {} arguments", MAX_ARGS),
                        self.peek().describe(),
                    ));
                }

                args.push(self.expression()?);

                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.consume(&TokenKind::RParen, "')' after arguments")?;

        Ok(Expr::Call {
            name: callee.lexeme.to_string(),
            args,
            pos: callee.pos,
        })
    }

    fn aggregate(&mut self, kind: AggregateKind) -> Result<Expr> {
        let pos: Position = self.advance().pos;

        self.consume(&TokenKind::LParen, "'(' after aggregate symbol")?;

        let var: &Token<'_> = self.consume(&TokenKind::Identifier, "bound variable name")?;

        self.consume(&TokenKind::Operator(Operator::Assign), "'=' after bound variable")?;

        let start: Expr = self.expression()?;

        self.consume(&TokenKind::Keyword(Keyword::To), "'to' between bounds")?;

        let end: Expr = self.expression()?;

        self.consume(&TokenKind::RParen, "')' after bounds")?;

        let body: Expr = self.unary()?;

        // Optional trailing differential: `∫(x = 0 to 1) x dx`.
        if kind == AggregateKind::Integral
            && self.check(&TokenKind::Identifier)
            && self.peek().lexeme.strip_prefix('d') == Some(var.lexeme)
        {
            self.advance();
        }

        Ok(Expr::Aggregate {
            kind,
            var: var.lexeme.to_string(),
            start: Box::new(start),
            end: Box::new(end),
            body: Box::new(body),
            pos,
        })
    }

    // ────────────────────── utility helpers ───────────────────────

    /// Charge one nesting level. Levels are given back by the caller on
    /// success only: any error ends the parse.
    fn enter(&mut self, what: &str) -> Result<()> {
        if self.nesting >= MAX_NESTING {
            let token: &Token<'_> = self.peek();

            debug!("Nesting limit reached at {}", token.pos);

            return Err(MathScriptError::parse(
                token.pos,
                format!("at most {} nested {}", MAX_NESTING, what),
                token.describe(),
            ));
        }

        self.nesting += 1;

        Ok(())
    }

    fn skip_separators(&mut self) {
        while self.matches(&TokenKind::Semicolon) {}
    }

    fn next_is_assign(&self) -> bool {
        matches!(
            self.tokens.get(self.current + 1),
            Some(Token {
                kind: TokenKind::Operator(Operator::Assign),
                ..
            })
        )
    }

    fn match_operator(&mut self, ops: &[Operator]) -> Option<(Operator, Position)> {
        if let TokenKind::Operator(op) = self.peek().kind {
            if ops.contains(&op) {
                let pos: Position = self.advance().pos;

                return Some((op, pos));
            }
        }

        None
    }

    #[inline(always)]
    fn matches_keyword(&mut self, keyword: Keyword) -> bool {
        self.matches(&TokenKind::Keyword(keyword))
    }

    #[inline(always)]
    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, kind: &TokenKind, expected: &str) -> Result<&'a Token<'a>> {
        if self.check(kind) {
            return Ok(self.advance());
        }

        debug!("consume failed: wanted {}, at {}", expected, self.peek().pos);

        Err(self.error_here(expected))
    }

    fn error_here(&self, expected: &str) -> MathScriptError {
        let token: &Token<'_> = self.peek();

        MathScriptError::parse(token.pos, expected, token.describe())
    }

    #[inline(always)]
    fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }

        &self.peek().kind == kind
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token<'a> {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::EndOfInput)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token<'a> {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token<'a> {
        &self.tokens[self.current - 1]
    }
}
