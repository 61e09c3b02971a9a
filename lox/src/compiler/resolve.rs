use std::collections::HashMap;

use crate::compiler::ast::{Expr, ExprId, Stmt};
use crate::compiler::syntax::{Diagnostics, Syntax};
use crate::compiler::token::Token;

/// Tracks whether the resolver is currently walking a function body, so
/// a stray `return` at the top level can be flagged.
#[derive(Clone, Copy, PartialEq)]
enum FunctionKind {
    None,
    Function,
}

/// A single lexical scope: variable name to whether its initializer has
/// finished running yet. `false` between `declare` and `define` closes
/// the self-reference hole (`var a = a;`); the global scope is never
/// pushed here, so `locals` only ever covers block/function nesting.
/// Feeds the tree-walking evaluator only -- the bytecode backend
/// resolves locals to stack slots itself, at compile time.
struct Resolver {
    scopes: Vec<HashMap<String, bool>>,
    locals: HashMap<ExprId, usize>,
    current_function: FunctionKind,
    diagnostics: Diagnostics,
}

/// Walks a parsed program and annotates every variable reference with
/// the number of enclosing scopes to hop through to find its binding.
/// A stack of scope maps records a declare-then-define two-step per
/// binding; this pass only feeds the tree-walking evaluator -- the
/// bytecode backend resolves locals to stack slots itself, at compile
/// time, without this table.
pub fn resolve(program: &[Stmt]) -> (HashMap<ExprId, usize>, Diagnostics) {
    let mut resolver = Resolver {
        scopes: vec![],
        locals: HashMap::new(),
        current_function: FunctionKind::None,
        diagnostics: Diagnostics::new(),
    };

    resolver.resolve_stmts(program);
    (resolver.locals, resolver.diagnostics)
}

impl Resolver {
    fn resolve_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),
            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(init) = initializer {
                    self.resolve_expr(init);
                }
                self.define(name);
            },
            Stmt::Block(stmts) => {
                self.begin_scope();
                self.resolve_stmts(stmts);
                self.end_scope();
            },
            Stmt::If { cond, then_branch, else_branch } => {
                self.resolve_expr(cond);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            },
            Stmt::While { cond, body } => {
                self.resolve_expr(cond);
                self.resolve_stmt(body);
            },
            Stmt::Function { name, params, body } => {
                self.declare(name);
                self.define(name);
                self.resolve_function(params, body, FunctionKind::Function);
            },
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionKind::None {
                    self.diagnostics.push(Syntax::error(
                        "Can't return from top-level code.",
                        keyword.describe_location(),
                        keyword.span.clone(),
                    ));
                }
                if let Some(value) = value {
                    self.resolve_expr(value);
                }
            },
        }
    }

    fn resolve_function(&mut self, params: &[Token], body: &[Stmt], kind: FunctionKind) {
        let enclosing_function = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {},
            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.diagnostics.push(Syntax::error(
                            "Can't read local variable in its own initializer.",
                            name.describe_location(),
                            name.span.clone(),
                        ));
                    }
                }
                self.resolve_local(*id, &name.lexeme);
            },
            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, &name.lexeme);
            },
            Expr::Unary { right, .. } => self.resolve_expr(right),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            },
            Expr::Grouping(inner) => self.resolve_expr(inner),
            Expr::Call { callee, args, .. } => {
                self.resolve_expr(callee);
                for arg in args {
                    self.resolve_expr(arg);
                }
            },
        }
    }

    /// Finds how many scopes out from the innermost one `name` is
    /// declared in, and records that depth for the given reference. A
    /// reference found in no local scope is left unresolved -- at
    /// evaluation time it is looked up in the global scope instead.
    fn resolve_local(&mut self, id: ExprId, name: &str) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name) {
                self.locals.insert(id, depth);
                return;
            }
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.diagnostics.push(Syntax::error(
                    "Already a variable with this name in this scope.",
                    name.describe_location(),
                    name.span.clone(),
                ));
            }
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::source::Source;
    use crate::compiler::lex::Lexer;
    use crate::compiler::parse::Parser;
    use std::rc::Rc;

    fn resolve_src(src: &str) -> (HashMap<ExprId, usize>, Diagnostics) {
        let (tokens, _) = Lexer::lex(Rc::new(Source::source(src)));
        let (program, parse_diag) = Parser::parse(tokens);
        assert!(!parse_diag.had_error());
        resolve(&program)
    }

    #[test]
    fn global_reference_is_unresolved() {
        let (locals, diagnostics) = resolve_src("var a = 1; print a;");
        assert!(!diagnostics.had_error());
        assert!(locals.is_empty());
    }

    #[test]
    fn block_local_resolves_to_depth_zero() {
        let (locals, diagnostics) = resolve_src("{ var a = 1; print a; }");
        assert!(!diagnostics.had_error());
        assert_eq!(locals.len(), 1);
        assert_eq!(*locals.values().next().unwrap(), 0);
    }

    #[test]
    fn closure_capture_resolves_through_enclosing_function() {
        let (locals, diagnostics) =
            resolve_src("fun outer() { var a = 1; fun inner() { print a; } }");
        assert!(!diagnostics.had_error());
        // `a` is read one function scope out from `inner`'s body scope.
        assert_eq!(locals.len(), 1);
        assert_eq!(*locals.values().next().unwrap(), 1);
    }

    #[test]
    fn self_referential_initializer_is_an_error() {
        let (_, diagnostics) = resolve_src("{ var a = a; }");
        assert!(diagnostics.had_error());
    }

    #[test]
    fn shadowing_in_a_nested_scope_is_fine() {
        let (_, diagnostics) = resolve_src("var a = 1; { var a = 2; print a; }");
        assert!(!diagnostics.had_error());
    }

    #[test]
    fn duplicate_declaration_in_same_scope_is_an_error() {
        let (_, diagnostics) = resolve_src("{ var a = 1; var a = 2; }");
        assert!(diagnostics.had_error());
    }

    #[test]
    fn top_level_return_is_an_error() {
        let (_, diagnostics) = resolve_src("return 1;");
        assert!(diagnostics.had_error());
    }
}
