use crate::expr::Expr;
use crate::stmt::Stmt;
use crate::value::format_number;

/// Renders the AST in prefix (S‑expression) form, one line per top‑level
/// statement. Used by the `parse` subcommand and by parser tests.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Number(n) => format_number(*n),

            Expr::Str(s) => format!("{:?}", s),

            Expr::Bool(b) => b.to_string(),

            Expr::Variable { name, .. } => name.clone(),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { op, operand, .. } => format!("({} {})", op.symbol(), Self::print(operand)),

            Expr::Binary {
                op, left, right, ..
            } => format!(
                "({} {} {})",
                op.symbol(),
                Self::print(left),
                Self::print(right)
            ),

            Expr::Call { name, args, .. } => {
                let mut s = format!("(call {}", name);
                for arg in args {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Aggregate {
                kind,
                var,
                start,
                end,
                body,
                ..
            } => format!(
                "({} {} {} {} {})",
                kind.symbol(),
                var,
                Self::print(start),
                Self::print(end),
                Self::print(body)
            ),
        }
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => Self::print(expr),

            Stmt::Assign { name, value, .. } => format!("(= {} {})", name, Self::print(value)),

            Stmt::If {
                condition,
                then_block,
                else_block,
                ..
            } => match else_block {
                Some(else_block) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print_block(then_block),
                    Self::print_block(else_block)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_block(then_block)
                ),
            },

            Stmt::While {
                condition, body, ..
            } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_block(body)
            ),

            Stmt::For {
                var,
                iterable,
                body,
                ..
            } => format!(
                "(for {} {} {})",
                var,
                Self::print(iterable),
                Self::print_block(body)
            ),

            Stmt::Function {
                name, params, body, ..
            } => format!(
                "(function {} ({}) {})",
                name,
                params.join(" "),
                Self::print_block(body)
            ),

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print(value)),
                None => "(return)".to_string(),
            },
        }
    }

    fn print_block(statements: &[Stmt]) -> String {
        let inner: Vec<String> = statements.iter().map(Self::print_stmt).collect();

        format!("{{{}}}", inner.join(" "))
    }
}
