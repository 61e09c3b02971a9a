use std::rc::Rc;

use crate::common::chunk::Chunk;
use crate::common::opcode::Opcode;
use crate::common::source::Source;
use crate::common::span::Span;
use crate::common::value::Value;
use crate::compiler::ast::{Expr, Stmt};
use crate::compiler::syntax::{Diagnostics, Syntax};
use crate::compiler::token::{Token, TokenKind};

/// A compile-time local: its name, and the scope depth it becomes valid
/// at. `None` between declaring and defining it closes the same
/// self-reference hole the tree-walking resolver closes, mirrored here
/// at compile time since the bytecode backend has no separate resolver
/// pass.
struct Local {
    name: String,
    depth: Option<usize>,
}

/// Compiles a resolved-at-compile-time subset of Lox directly to
/// bytecode in a single pass, with no separate resolver: locals are
/// tracked as stack slots, emitted directly into a `Chunk` as the
/// compiler walks the AST. Narrowed to the opcode set this backend
/// actually supports: no user-defined functions or closures.
pub struct Compiler {
    chunk: Chunk,
    locals: Vec<Local>,
    scope_depth: usize,
    line: u32,
    /// The span of the most recently marked token, used to anchor a
    /// diagnostic (such as constant-pool overflow) raised from a spot
    /// that has no token of its own to point at, e.g. a bare literal.
    last_span: Span,
    diagnostics: Diagnostics,
}

/// Compiles a full program into one chunk. A `fun` declaration, or a
/// `return`, reaching this backend is reported as a compile error
/// rather than silently ignored or mis-compiled.
pub fn compile(program: &[Stmt]) -> (Chunk, Diagnostics) {
    let placeholder_source = Rc::new(Source::source(String::new()));
    let mut compiler = Compiler {
        chunk: Chunk::new(),
        locals: vec![],
        scope_depth: 0,
        line: 0,
        last_span: Span::point(&placeholder_source, 0),
        diagnostics: Diagnostics::new(),
    };

    for stmt in program {
        compiler.statement(stmt);
    }
    compiler.chunk.emit_op(Opcode::Return, compiler.line);

    (compiler.chunk, compiler.diagnostics)
}

impl Compiler {
    fn mark_line(&mut self, token: &Token) {
        self.line = token.span.line() as u32;
        self.last_span = token.span.clone();
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.diagnostics.push(Syntax::error(
            message.to_string(),
            token.describe_location(),
            token.span.clone(),
        ));
    }

    /// Same as `error`, for faults that have no token of their own to
    /// point at -- anchored to the most recently marked span instead.
    fn error_here(&mut self, message: &str) {
        let span = self.last_span.clone();
        self.diagnostics.push(Syntax::error(message.to_string(), String::new(), span));
    }

    fn emit_constant(&mut self, value: Value) {
        match self.chunk.add_constant(value) {
            Ok(index) => {
                self.chunk.emit_op(Opcode::Constant, self.line);
                self.chunk.emit_byte(index, self.line);
            },
            Err(()) => {
                self.error_here("Too many constants in one chunk.");
                let line = self.line;
                self.chunk.emit_op(Opcode::Nil, line);
            },
        }
    }

    fn statement(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) => {
                self.expression(expr);
                self.chunk.emit_op(Opcode::Pop, self.line);
            },
            Stmt::Print(expr) => {
                self.expression(expr);
                self.chunk.emit_op(Opcode::Print, self.line);
            },
            Stmt::Var { name, initializer } => self.var_declaration(name, initializer.as_ref()),
            Stmt::Block(stmts) => {
                self.begin_scope();
                for stmt in stmts {
                    self.statement(stmt);
                }
                self.end_scope();
            },
            Stmt::If { cond, then_branch, else_branch } => self.if_statement(cond, then_branch, else_branch.as_deref()),
            Stmt::While { cond, body } => self.while_statement(cond, body),
            Stmt::Function { name, .. } => {
                self.error(name, "Functions are not supported by the bytecode backend.")
            },
            Stmt::Return { keyword, .. } => {
                self.error(keyword, "Return is not supported by the bytecode backend.")
            },
        }
    }

    fn var_declaration(&mut self, name: &Token, initializer: Option<&Expr>) {
        self.mark_line(name);

        if self.scope_depth > 0 {
            self.declare_local(name);
        }

        match initializer {
            Some(expr) => self.expression(expr),
            None => {
                let line = self.line;
                self.chunk.emit_op(Opcode::Nil, line);
            },
        }

        if self.scope_depth > 0 {
            self.define_local();
        } else {
            self.emit_global_op(Opcode::DefineGlobal, name);
        }
    }

    fn declare_local(&mut self, name: &Token) {
        for local in self.locals.iter().rev() {
            if local.depth.is_some_and(|d| d < self.scope_depth) {
                break;
            }
            if local.name == name.lexeme {
                self.error(name, "Already a variable with this name in this scope.");
            }
        }
        self.locals.push(Local { name: name.lexeme.clone(), depth: None });
    }

    fn define_local(&mut self) {
        let depth = self.scope_depth;
        self.locals.last_mut().expect("a local was just declared").depth = Some(depth);
    }

    fn resolve_local(&mut self, name: &Token) -> Option<u8> {
        for (index, local) in self.locals.iter().enumerate().rev() {
            if local.name == name.lexeme {
                if local.depth.is_none() {
                    self.error(name, "Can't read local variable in its own initializer.");
                }
                return Some(index as u8);
            }
        }
        None
    }

    fn emit_global_op(&mut self, op: Opcode, name: &Token) {
        let index = match self.chunk.add_constant(Value::string(name.lexeme.clone())) {
            Ok(index) => index,
            Err(()) => {
                self.error(name, "Too many constants in one chunk.");
                0
            },
        };
        self.chunk.emit_op(op, self.line);
        self.chunk.emit_byte(index, self.line);
    }

    fn begin_scope(&mut self) {
        self.scope_depth += 1;
    }

    fn end_scope(&mut self) {
        self.scope_depth -= 1;
        while let Some(local) = self.locals.last() {
            if local.depth.is_some_and(|d| d > self.scope_depth) {
                self.chunk.emit_op(Opcode::Pop, self.line);
                self.locals.pop();
            } else {
                break;
            }
        }
    }

    fn if_statement(&mut self, cond: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) {
        self.expression(cond);
        let then_jump = self.chunk.emit_jump(Opcode::JumpIfFalse, self.line);
        self.chunk.emit_op(Opcode::Pop, self.line);
        self.statement(then_branch);

        let else_jump = self.chunk.emit_jump(Opcode::Jump, self.line);
        self.chunk.patch_jump(then_jump);
        self.chunk.emit_op(Opcode::Pop, self.line);

        if let Some(else_branch) = else_branch {
            self.statement(else_branch);
        }
        self.chunk.patch_jump(else_jump);
    }

    fn while_statement(&mut self, cond: &Expr, body: &Stmt) {
        let loop_start = self.chunk.code.len();
        self.expression(cond);
        let exit_jump = self.chunk.emit_jump(Opcode::JumpIfFalse, self.line);
        self.chunk.emit_op(Opcode::Pop, self.line);
        self.statement(body);
        self.chunk.emit_loop(loop_start, self.line);
        self.chunk.patch_jump(exit_jump);
        self.chunk.emit_op(Opcode::Pop, self.line);
    }

    fn expression(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(value) => self.literal(value),
            Expr::Variable { name, .. } => self.variable_get(name),
            Expr::Assign { name, value, .. } => self.variable_set(name, value),
            Expr::Grouping(inner) => self.expression(inner),
            Expr::Unary { op, right } => self.unary(op, right),
            Expr::Binary { left, op, right } => self.binary(left, op, right),
            Expr::Logical { left, op, right } => self.logical(left, op, right),
            Expr::Call { closing_paren, .. } => {
                self.error(closing_paren, "Calls are not supported by the bytecode backend.")
            },
        }
    }

    fn literal(&mut self, value: &Value) {
        let line = self.line;
        match value {
            Value::Nil => self.chunk.emit_op(Opcode::Nil, line),
            Value::Boolean(true) => self.chunk.emit_op(Opcode::True, line),
            Value::Boolean(false) => self.chunk.emit_op(Opcode::False, line),
            _ => self.emit_constant(value.clone()),
        }
    }

    fn variable_get(&mut self, name: &Token) {
        self.mark_line(name);
        match self.resolve_local(name) {
            Some(slot) => {
                self.chunk.emit_op(Opcode::GetLocal, self.line);
                self.chunk.emit_byte(slot, self.line);
            },
            None => self.emit_global_op(Opcode::GetGlobal, name),
        }
    }

    fn variable_set(&mut self, name: &Token, value: &Expr) {
        self.expression(value);
        self.mark_line(name);
        match self.resolve_local(name) {
            Some(slot) => {
                self.chunk.emit_op(Opcode::SetLocal, self.line);
                self.chunk.emit_byte(slot, self.line);
            },
            None => self.emit_global_op(Opcode::SetGlobal, name),
        }
    }

    fn unary(&mut self, op: &Token, right: &Expr) {
        self.expression(right);
        self.mark_line(op);
        match op.kind {
            TokenKind::Minus => self.chunk.emit_op(Opcode::Negate, self.line),
            TokenKind::Bang => self.chunk.emit_op(Opcode::Not, self.line),
            _ => unreachable!("parser only produces '-' and '!' as unary operators"),
        }
    }

    fn binary(&mut self, left: &Expr, op: &Token, right: &Expr) {
        self.expression(left);
        self.expression(right);
        self.mark_line(op);

        use TokenKind::*;
        match op.kind {
            Plus => self.chunk.emit_op(Opcode::Add, self.line),
            Minus => self.chunk.emit_op(Opcode::Subtract, self.line),
            Star => self.chunk.emit_op(Opcode::Multiply, self.line),
            Slash => self.chunk.emit_op(Opcode::Divide, self.line),
            Greater => self.chunk.emit_op(Opcode::Greater, self.line),
            Less => self.chunk.emit_op(Opcode::Less, self.line),
            EqualEqual => self.chunk.emit_op(Opcode::Equal, self.line),
            // `a >= b` is `!(a < b)`; `a != b` is `!(a == b)` -- comparisons
            // compose from a smaller opcode set.
            GreaterEqual => {
                self.chunk.emit_op(Opcode::Less, self.line);
                self.chunk.emit_op(Opcode::Not, self.line);
            },
            LessEqual => {
                self.chunk.emit_op(Opcode::Greater, self.line);
                self.chunk.emit_op(Opcode::Not, self.line);
            },
            BangEqual => {
                self.chunk.emit_op(Opcode::Equal, self.line);
                self.chunk.emit_op(Opcode::Not, self.line);
            },
            _ => unreachable!("parser only produces these kinds as binary operators"),
        }
    }

    fn logical(&mut self, left: &Expr, op: &Token, right: &Expr) {
        self.expression(left);
        match op.kind {
            TokenKind::And => {
                let end_jump = self.chunk.emit_jump(Opcode::JumpIfFalse, self.line);
                self.chunk.emit_op(Opcode::Pop, self.line);
                self.expression(right);
                self.chunk.patch_jump(end_jump);
            },
            TokenKind::Or => {
                let else_jump = self.chunk.emit_jump(Opcode::JumpIfFalse, self.line);
                let end_jump = self.chunk.emit_jump(Opcode::Jump, self.line);
                self.chunk.patch_jump(else_jump);
                self.chunk.emit_op(Opcode::Pop, self.line);
                self.expression(right);
                self.chunk.patch_jump(end_jump);
            },
            _ => unreachable!("parser only produces 'and'/'or' as logical operators"),
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

    fn compile_src(src: &str) -> (Chunk, Diagnostics) {
        let (tokens, _) = Lexer::lex(Rc::new(Source::source(src)));
        let (program, parse_diag) = Parser::parse(tokens);
        assert!(!parse_diag.had_error());
        compile(&program)
    }

    #[test]
    fn arithmetic_emits_expected_opcodes() {
        let (chunk, diagnostics) = compile_src("1 + 2 * 3;");
        assert!(!diagnostics.had_error());
        assert!(chunk.code.contains(&(Opcode::Add as u8)));
        assert!(chunk.code.contains(&(Opcode::Multiply as u8)));
        assert!(chunk.code.contains(&(Opcode::Pop as u8)));
    }

    #[test]
    fn function_declaration_is_a_compile_error() {
        let (_, diagnostics) = compile_src("fun f() { return 1; }");
        assert!(diagnostics.had_error());
    }

    #[test]
    fn call_expression_is_a_compile_error() {
        let (_, diagnostics) = compile_src("clock();");
        assert!(diagnostics.had_error());
    }

    #[test]
    fn locals_reuse_stack_slots_across_sibling_blocks() {
        let (chunk, diagnostics) = compile_src("{ var a = 1; } { var b = 2; }");
        assert!(!diagnostics.had_error());
        // both declarations compile to a local slot 0, with no globals created.
        assert_eq!(
            chunk.code.iter().filter(|&&b| b == Opcode::DefineGlobal as u8).count(),
            0
        );
    }

    #[test]
    fn if_else_emits_both_branches() {
        let (chunk, diagnostics) = compile_src("if (true) { 1; } else { 2; }");
        assert!(!diagnostics.had_error());
        assert!(chunk.code.contains(&(Opcode::JumpIfFalse as u8)));
        assert!(chunk.code.contains(&(Opcode::Jump as u8)));
    }

    #[test]
    fn constant_pool_overflow_is_a_compile_error() {
        // each declaration below adds two distinct constants (its global
        // name and its fractional literal), so 300 of them blow well past
        // `MAX_CONSTANTS`.
        let src: String = (0..300).map(|i| format!("var v{i} = {i}.5;\n")).collect();
        let (_, diagnostics) = compile_src(&src);
        assert!(diagnostics.had_error());
        assert!(
            diagnostics.errors().iter().any(|e| e.message.contains("Too many constants")),
            "expected a 'too many constants' diagnostic, got: {:?}",
            diagnostics.errors()
        );
    }
}
