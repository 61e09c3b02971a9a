use std::rc::Rc;

use crate::common::value::Value;
use crate::compiler::token::Token;

/// Identifies a variable reference (a `Variable` or the target of an
/// `Assign`) by source position, so the resolver can annotate distinct
/// occurrences of the same name independently, keyed by the identity of
/// the reference rather than by name.
pub type ExprId = usize;

/// An expression node. Recursive variants box their children -- the tree
/// is never cyclic, so an owning indirection is all that's needed.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable { id: ExprId, name: Token },
    Assign { id: ExprId, name: Token, value: Box<Expr> },
    Unary { op: Token, right: Box<Expr> },
    Binary { left: Box<Expr>, op: Token, right: Box<Expr> },
    /// Short-circuiting `and`/`or`; the `op` token's kind distinguishes
    /// the two.
    Logical { left: Box<Expr>, op: Token, right: Box<Expr> },
    Grouping(Box<Expr>),
    Call { callee: Box<Expr>, closing_paren: Token, args: Vec<Expr> },
}

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(Expr),
    Print(Expr),
    Var { name: Token, initializer: Option<Expr> },
    Block(Vec<Stmt>),
    If { cond: Expr, then_branch: Box<Stmt>, else_branch: Option<Box<Stmt>> },
    While { cond: Expr, body: Box<Stmt> },
    Function { name: Token, params: Vec<Token>, body: Rc<Vec<Stmt>> },
    Return { keyword: Token, value: Option<Expr> },
}

/// Renders a single expression as a fully-parenthesized form, e.g.
/// `1 + 2 * 3` as `(1 + (2 * 3))` -- used by the `--ast` CLI flag.
pub fn print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(value) => value.to_string(),
        Expr::Variable { name, .. } => format!("(var {})", name.lexeme),
        Expr::Assign { name, value, .. } => {
            format!("(assign {} {})", name.lexeme, print_expr(value))
        },
        Expr::Unary { op, right } => format!("({} {})", op.lexeme, print_expr(right)),
        Expr::Binary { left, op, right } => {
            format!("({} {} {})", print_expr(left), op.lexeme, print_expr(right))
        },
        Expr::Logical { left, op, right } => {
            format!("({} {} {})", print_expr(left), op.lexeme, print_expr(right))
        },
        Expr::Grouping(inner) => format!("(group {})", print_expr(inner)),
        Expr::Call { callee, args, .. } => {
            let args = args.iter().map(print_expr).collect::<Vec<_>>().join(" ");
            format!("(call {} ({}))", print_expr(callee), args)
        },
    }
}

/// Renders a single statement, wrapping its expression(s) with
/// `print_expr`.
pub fn print_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Expression(expr) => format!("(expr {})", print_expr(expr)),
        Stmt::Print(expr) => format!("(print {})", print_expr(expr)),
        Stmt::Var { name, initializer: Some(init) } => {
            format!("(var {} = {})", name.lexeme, print_expr(init))
        },
        Stmt::Var { name, initializer: None } => format!("(var {})", name.lexeme),
        Stmt::Block(stmts) => format!("(block {})", print_program(stmts)),
        Stmt::If { cond, then_branch, else_branch: Some(else_branch) } => {
            format!(
                "(if {} {} else {})",
                print_expr(cond),
                print_stmt(then_branch),
                print_stmt(else_branch)
            )
        },
        Stmt::If { cond, then_branch, else_branch: None } => {
            format!("(if {} {})", print_expr(cond), print_stmt(then_branch))
        },
        Stmt::While { cond, body } => format!("(while {} {})", print_expr(cond), print_stmt(body)),
        Stmt::Function { name, params, body } => {
            let params = params.iter().map(|p| p.lexeme.clone()).collect::<Vec<_>>().join(" ");
            format!("(fun {} ({}) {{ {} }})", name.lexeme, params, print_program(body))
        },
        Stmt::Return { value: Some(value), .. } => format!("(return {})", print_expr(value)),
        Stmt::Return { value: None, .. } => "(return)".to_string(),
    }
}

/// Renders a whole program, one `print_stmt` per top-level statement,
/// space-separated.
pub fn print_program(stmts: &[Stmt]) -> String {
    stmts.iter().map(print_stmt).collect::<Vec<_>>().join(" ")
}
