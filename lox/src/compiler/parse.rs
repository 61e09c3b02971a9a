use crate::compiler::ast::{Expr, ExprId, Stmt};
use crate::compiler::syntax::{Diagnostics, Syntax};
use crate::compiler::token::{Token, TokenKind};

use std::rc::Rc;

const MAX_PARAMS: usize = 255;

/// Recursive-descent parser with Pratt-style precedence climbing for
/// expressions. Single left-to-right pass over the token stream, no
/// backtracking.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    next_id: ExprId,
    diagnostics: Diagnostics,
}

impl Parser {
    /// Parses a full token stream into a program (a list of statements).
    /// Parse errors are collected into the returned `Diagnostics`
    /// instead of aborting; the parser synchronizes at statement
    /// boundaries and keeps going.
    pub fn parse(tokens: Vec<Token>) -> (Vec<Stmt>, Diagnostics) {
        let mut parser = Parser { tokens, current: 0, next_id: 0, diagnostics: Diagnostics::new() };
        let mut statements = vec![];

        while !parser.is_at_end() {
            statements.push(parser.declaration());
        }

        (statements, parser.diagnostics)
    }

    // --- token stream primitives ---

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: &TokenKind) -> bool {
        !self.is_at_end() && &self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn matches(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, Syntax> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error(self.peek().clone(), message))
        }
    }

    fn error(&self, token: Token, message: &str) -> Syntax {
        Syntax::error(message.to_string(), token.describe_location(), token.span.clone())
    }

    fn fresh_id(&mut self) -> ExprId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Discards tokens until a known statement boundary, so the parser
    /// can resume after an error.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }

            use TokenKind::*;
            if matches!(
                self.peek().kind,
                Class | Fun | Var | For | If | While | Print | Return
            ) {
                return;
            }

            self.advance();
        }
    }

    // --- declarations & statements ---

    /// Parses one declaration/statement. On a parse error, reports it,
    /// synchronizes, and returns a placeholder statement so the caller
    /// can keep building a (partial) program -- the overall parse still
    /// reports a non-zero error count and evaluation is skipped.
    fn declaration(&mut self) -> Stmt {
        let result = if self.matches(&[TokenKind::Var]) {
            self.var_declaration()
        } else if self.matches(&[TokenKind::Fun]) {
            self.function("function")
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => stmt,
            Err(error) => {
                self.diagnostics.push(error);
                self.synchronize();
                Stmt::Expression(Expr::Literal(crate::common::value::Value::Nil))
            },
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt, Syntax> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name.")?;

        let initializer = if self.matches(&[TokenKind::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    /// `fun NAME '(' params ')' '{' body '}'`. At most 255 parameters --
    /// a diagnostic, not a hard parse failure.
    fn function(&mut self, kind: &str) -> Result<Stmt, Syntax> {
        let name = self.consume(TokenKind::Identifier, &format!("Expect {kind} name."))?;
        self.consume(TokenKind::LeftParen, &format!("Expect '(' after {kind} name."))?;

        let mut params = vec![];
        if !self.check(&TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_PARAMS {
                    let peek = self.peek().clone();
                    self.diagnostics.push(self.error(peek, "Can't have more than 255 parameters."));
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name.")?);
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;

        self.consume(TokenKind::LeftBrace, &format!("Expect '{{' before {kind} body."))?;
        let body = self.block()?;

        Ok(Stmt::Function { name, params, body: Rc::new(body) })
    }

    fn statement(&mut self) -> Result<Stmt, Syntax> {
        if self.matches(&[TokenKind::Print]) {
            return self.print_statement();
        }
        if self.matches(&[TokenKind::LeftBrace]) {
            return Ok(Stmt::Block(self.block()?));
        }
        if self.matches(&[TokenKind::If]) {
            return self.if_statement();
        }
        if self.matches(&[TokenKind::While]) {
            return self.while_statement();
        }
        if self.matches(&[TokenKind::For]) {
            return self.for_statement();
        }
        if self.matches(&[TokenKind::Return]) {
            return self.return_statement();
        }
        self.expression_statement()
    }

    fn print_statement(&mut self) -> Result<Stmt, Syntax> {
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> Result<Stmt, Syntax> {
        let keyword = self.previous().clone();
        let value =
            if self.check(&TokenKind::Semicolon) { None } else { Some(self.expression()?) };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, Syntax> {
        let mut statements = vec![];
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration());
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn if_statement(&mut self) -> Result<Stmt, Syntax> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.matches(&[TokenKind::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If { cond, then_branch, else_branch })
    }

    fn while_statement(&mut self) -> Result<Stmt, Syntax> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { cond, body })
    }

    /// Desugars `for (init; cond; incr) body` at parse time into:
    /// `{ init; while (cond) { body; incr; } }`. An omitted condition
    /// defaults to `true`; an omitted initializer or increment simply
    /// drops the corresponding node.
    fn for_statement(&mut self) -> Result<Stmt, Syntax> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.matches(&[TokenKind::Semicolon]) {
            None
        } else if self.matches(&[TokenKind::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let cond = condition.unwrap_or(Expr::Literal(crate::common::value::Value::Boolean(true)));
        body = Stmt::While { cond, body: Box::new(body) };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn expression_statement(&mut self) -> Result<Stmt, Syntax> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    // --- expressions (precedence, low to high) ---

    fn expression(&mut self) -> Result<Expr, Syntax> {
        self.assignment()
    }

    /// Parses the left-hand side as an rvalue; on seeing `=`, rewrites it
    /// into an `Assign` if it was a bare variable reference, otherwise
    /// reports the bad target but does not throw -- the value expression
    /// is returned as-is so parsing can continue. Right-associative,
    /// unlike every other binary level.
    fn assignment(&mut self) -> Result<Expr, Syntax> {
        let expr = self.or()?;

        if self.matches(&[TokenKind::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            if let Expr::Variable { name, .. } = expr {
                let id = self.fresh_id();
                return Ok(Expr::Assign { id, name, value: Box::new(value) });
            }

            self.diagnostics.push(self.error(equals, "Invalid assignment target."));
            return Ok(value);
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, Syntax> {
        let mut expr = self.and()?;
        while self.matches(&[TokenKind::Or]) {
            let op = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical { left: Box::new(expr), op, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, Syntax> {
        let mut expr = self.equality()?;
        while self.matches(&[TokenKind::And]) {
            let op = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical { left: Box::new(expr), op, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, Syntax> {
        self.left_assoc_binary(Self::comparison, &[TokenKind::BangEqual, TokenKind::EqualEqual])
    }

    fn comparison(&mut self) -> Result<Expr, Syntax> {
        self.left_assoc_binary(
            Self::term,
            &[TokenKind::Greater, TokenKind::GreaterEqual, TokenKind::Less, TokenKind::LessEqual],
        )
    }

    fn term(&mut self) -> Result<Expr, Syntax> {
        self.left_assoc_binary(Self::factor, &[TokenKind::Plus, TokenKind::Minus])
    }

    fn factor(&mut self) -> Result<Expr, Syntax> {
        self.left_assoc_binary(Self::unary, &[TokenKind::Star, TokenKind::Slash])
    }

    /// Shared left-associative binary-operator climbing step: parse one
    /// operand at the next-higher precedence, then fold in as many
    /// same-level operators as are present.
    fn left_assoc_binary(
        &mut self,
        mut higher: impl FnMut(&mut Self) -> Result<Expr, Syntax>,
        ops: &[TokenKind],
    ) -> Result<Expr, Syntax> {
        let mut expr = higher(self)?;
        while self.matches(ops) {
            let op = self.previous().clone();
            let right = higher(self)?;
            expr = Expr::Binary { left: Box::new(expr), op, right: Box::new(right) };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, Syntax> {
        if self.matches(&[TokenKind::Bang, TokenKind::Minus]) {
            let op = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary { op, right: Box::new(right) });
        }
        self.call()
    }

    /// `primary ('(' args ')')*` -- a postfix production that can chain
    /// calls, e.g. `make()()`.
    fn call(&mut self) -> Result<Expr, Syntax> {
        let mut expr = self.primary()?;

        loop {
            if self.matches(&[TokenKind::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, Syntax> {
        let mut args = vec![];
        if !self.check(&TokenKind::RightParen) {
            loop {
                if args.len() >= MAX_PARAMS {
                    let peek = self.peek().clone();
                    self.diagnostics.push(self.error(peek, "Can't have more than 255 arguments."));
                }
                args.push(self.expression()?);
                if !self.matches(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        let closing_paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::Call { callee: Box::new(callee), closing_paren, args })
    }

    fn primary(&mut self) -> Result<Expr, Syntax> {
        use TokenKind::*;

        if self.matches(&[False, True, Nil, Number, String]) {
            let token = self.previous().clone();
            return Ok(Expr::Literal(token.literal.expect("literal token must carry a value")));
        }

        if self.matches(&[Identifier]) {
            let id = self.fresh_id();
            return Ok(Expr::Variable { id, name: self.previous().clone() });
        }

        if self.matches(&[LeftParen]) {
            let expr = self.expression()?;
            self.consume(RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }

        if self.matches(&[Class]) {
            let class_kw = self.previous().clone();
            return Err(self.error(class_kw, "Classes are not supported by this implementation."));
        }

        let token = self.peek().clone();
        Err(self.error(token, "Expect expression."))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compiler::ast::print_program;
    use crate::compiler::lex::Lexer;
    use crate::common::source::Source;

    fn parse(src: &str) -> (Vec<Stmt>, Diagnostics) {
        let (tokens, lex_diag) = Lexer::lex(Rc::new(Source::source(src)));
        assert!(!lex_diag.had_error());
        Parser::parse(tokens)
    }

    #[test]
    fn precedence() {
        let (stmts, diagnostics) = parse("1 + 2 * 3;");
        assert!(!diagnostics.had_error());
        assert_eq!(print_program(&stmts), "(expr (1 + (2 * 3)))");
    }

    #[test]
    fn assignment_is_right_associative_and_only_targets_variables() {
        let (stmts, diagnostics) = parse("a = b = 1;");
        assert!(!diagnostics.had_error());
        assert_eq!(print_program(&stmts), "(expr (assign a (assign b 1)))");
    }

    #[test]
    fn bad_assignment_target_reports_but_continues() {
        let (stmts, diagnostics) = parse("1 + 2 = 3;");
        assert!(diagnostics.had_error());
        // the value expression is still produced, per the assignment trick
        assert_eq!(print_program(&stmts), "(expr 3)");
    }

    #[test]
    fn for_desugars_to_while_in_a_block() {
        let (stmts, diagnostics) = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert!(!diagnostics.had_error());
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Stmt::Block(inner) => {
                assert_eq!(inner.len(), 2);
                assert!(matches!(inner[0], Stmt::Var { .. }));
                assert!(matches!(inner[1], Stmt::While { .. }));
            },
            other => panic!("expected desugared block, got {other:?}"),
        }
    }

    #[test]
    fn parse_error_synchronizes_at_next_statement() {
        let (stmts, diagnostics) = parse("var = ; print 1;");
        assert!(diagnostics.had_error());
        // one error recovered into a placeholder, one real statement after it
        assert_eq!(stmts.len(), 2);
        assert!(matches!(stmts[1], Stmt::Print(_)));
    }

    #[test]
    fn call_chains_postfix() {
        let (stmts, diagnostics) = parse("make()();");
        assert!(!diagnostics.had_error());
        assert_eq!(print_program(&stmts), "(expr (call (call (var make) ()) ()))");
    }
}
