use std::collections::HashMap;
use std::rc::Rc;

use crate::common::trace::Trace;
use crate::common::value::{Callable, LoxFunction, Value};
use crate::compiler::ast::{Expr, ExprId, Stmt};
use crate::compiler::token::TokenKind;
use crate::construct::environment::Environment;
use crate::interpreter::control::Flow;
use crate::kernel;

/// Walks the AST directly against an `Environment` chain -- no
/// intermediate bytecode. Expression evaluation returns a `Value`;
/// statement execution returns `()`-or-signal. The resolver's depth
/// table is consulted on every variable read/write so shadowing and
/// closures behave exactly as statically resolved, falling back to a
/// dynamic global lookup for anything the resolver left unannotated.
pub struct Interpreter {
    pub globals: Environment,
    locals: HashMap<ExprId, usize>,
}

impl Interpreter {
    pub fn new(locals: HashMap<ExprId, usize>) -> Interpreter {
        let globals = Environment::new();
        for (name, value) in kernel::natives() {
            globals.define(name, value);
        }
        Interpreter { globals, locals }
    }

    /// Reuses an existing globals frame instead of seeding a fresh one --
    /// what a REPL needs, since each line is scanned, parsed, and resolved
    /// independently but `var` declarations must persist across lines.
    pub fn with_globals(globals: Environment, locals: HashMap<ExprId, usize>) -> Interpreter {
        Interpreter { globals, locals }
    }

    /// Runs a whole program's top-level statements against `globals`.
    /// A `return` escaping every enclosing function is a resolver bug,
    /// not a program error -- the resolver rejects top-level `return`
    /// before this ever runs.
    pub fn interpret(&self, program: &[Stmt]) -> Result<(), Trace> {
        let globals = self.globals.clone();
        for stmt in program {
            self.exec(&globals, stmt)?;
        }
        Ok(())
    }

    fn exec(&self, env: &Environment, stmt: &Stmt) -> Result<Flow, Trace> {
        match stmt {
            Stmt::Expression(expr) => {
                self.eval(env, expr)?;
                Ok(Flow::Normal)
            },
            Stmt::Print(expr) => {
                let value = self.eval(env, expr)?;
                println!("{}", value);
                Ok(Flow::Normal)
            },
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.eval(env, expr)?,
                    None => Value::Nil,
                };
                env.define(name.lexeme.clone(), value);
                Ok(Flow::Normal)
            },
            Stmt::Block(stmts) => {
                let inner = Environment::child_of(env);
                self.exec_block(&inner, stmts)
            },
            Stmt::If { cond, then_branch, else_branch } => {
                if self.eval(env, cond)?.is_truthy() {
                    self.exec(env, then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec(env, else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            },
            Stmt::While { cond, body } => {
                while self.eval(env, cond)?.is_truthy() {
                    let flow = self.exec(env, body)?;
                    if flow.is_return() {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal)
            },
            Stmt::Function { name, params, body } => {
                let function = LoxFunction {
                    name: name.lexeme.clone(),
                    params: params.iter().map(|p| p.lexeme.clone()).collect(),
                    body: Rc::clone(body),
                    closure: env.clone(),
                };
                env.define(name.lexeme.clone(), Value::Callable(Callable::Function(Rc::new(function))));
                Ok(Flow::Normal)
            },
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval(env, expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            },
        }
    }

    /// Runs each statement in turn, stopping early (without error) the
    /// moment one of them returns -- the only way a block's tail
    /// statements are ever skipped.
    fn exec_block(&self, env: &Environment, stmts: &[Stmt]) -> Result<Flow, Trace> {
        for stmt in stmts {
            let flow = self.exec(env, stmt)?;
            if flow.is_return() {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn eval(&self, env: &Environment, expr: &Expr) -> Result<Value, Trace> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Variable { id, name } => match self.locals.get(id) {
                Some(depth) => Ok(env.get_at(*depth, &name.lexeme)),
                None => self.globals.get(&name.lexeme).ok_or_else(|| {
                    Trace::at(format!("Undefined variable '{}'.", name.lexeme), &name.span)
                }),
            },
            Expr::Assign { id, name, value } => {
                let value = self.eval(env, value)?;
                match self.locals.get(id) {
                    Some(depth) => env.assign_at(*depth, &name.lexeme, value.clone()),
                    None => self.globals.assign(&name.lexeme, value.clone()).map_err(|_| {
                        Trace::at(
                            format!("Undefined variable '{}'.", name.lexeme),
                            &name.span,
                        )
                    })?,
                }
                Ok(value)
            },
            Expr::Unary { op, right } => {
                let right = self.eval(env, right)?;
                match op.kind {
                    TokenKind::Minus => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(Trace::at("Operand must be a number.", &op.span)),
                    },
                    TokenKind::Bang => Ok(Value::Boolean(!right.is_truthy())),
                    _ => unreachable!("parser only produces '-' and '!' as unary operators"),
                }
            },
            Expr::Logical { left, op, right } => {
                let left = self.eval(env, left)?;
                match op.kind {
                    TokenKind::Or if left.is_truthy() => Ok(left),
                    TokenKind::And if !left.is_truthy() => Ok(left),
                    _ => self.eval(env, right),
                }
            },
            Expr::Binary { left, op, right } => {
                let left = self.eval(env, left)?;
                let right = self.eval(env, right)?;
                self.binary(op, left, right)
            },
            Expr::Grouping(inner) => self.eval(env, inner),
            Expr::Call { callee, closing_paren, args } => {
                let callee_value = self.eval(env, callee)?;
                let mut arguments = Vec::with_capacity(args.len());
                for arg in args {
                    arguments.push(self.eval(env, arg)?);
                }

                let callable = match &callee_value {
                    Value::Callable(callable) => callable,
                    other => {
                        return Err(Trace::at(
                            format!("Can't call a {}.", other.type_name()),
                            &closing_paren.span,
                        ))
                    },
                };

                if arguments.len() != callable.arity() {
                    return Err(Trace::at(
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            arguments.len()
                        ),
                        &closing_paren.span,
                    ));
                }

                self.call(callable, &arguments)
            },
        }
    }

    fn binary(
        &self,
        op: &crate::compiler::token::Token,
        left: Value,
        right: Value,
    ) -> Result<Value, Trace> {
        use TokenKind::*;

        macro_rules! numeric {
            ($make:expr) => {
                match (&left, &right) {
                    (Value::Number(a), Value::Number(b)) => Ok($make(*a, *b)),
                    _ => Err(Trace::at("Operands must be numbers.", &op.span)),
                }
            };
        }

        match op.kind {
            Minus => numeric!(|a, b| Value::Number(a - b)),
            Star => numeric!(|a, b| Value::Number(a * b)),
            Slash => numeric!(|a, b| Value::Number(a / b)),
            Greater => numeric!(|a, b: f64| Value::Boolean(a > b)),
            GreaterEqual => numeric!(|a, b: f64| Value::Boolean(a >= b)),
            Less => numeric!(|a, b: f64| Value::Boolean(a < b)),
            LessEqual => numeric!(|a, b: f64| Value::Boolean(a <= b)),
            // `+` additionally overloads onto string concatenation.
            Plus => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => {
                    Ok(Value::string(format!("{}{}", a, b)))
                },
                _ => Err(Trace::at(
                    "Operands must be two numbers or two strings.",
                    &op.span,
                )),
            },
            BangEqual => Ok(Value::Boolean(left != right)),
            EqualEqual => Ok(Value::Boolean(left == right)),
            _ => unreachable!("parser only produces these kinds as binary operators"),
        }
    }

    fn call(&self, callable: &Callable, arguments: &[Value]) -> Result<Value, Trace> {
        match callable {
            Callable::Native(native) => Ok((native.func)(arguments)),
            Callable::Function(function) => {
                let call_env = Environment::child_of(&function.closure);
                for (param, argument) in function.params.iter().zip(arguments) {
                    call_env.define(param.clone(), argument.clone());
                }
                match self.exec_block(&call_env, &function.body)? {
                    Flow::Normal => Ok(Value::Nil),
                    Flow::Return(value) => Ok(value),
                }
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::source::Source;
    use crate::compiler::lex::Lexer;
    use crate::compiler::parse::Parser;
    use crate::compiler::resolve;

    fn run(src: &str) -> Result<(), Trace> {
        let (tokens, lex_diag) = Lexer::lex(Rc::new(Source::source(src)));
        assert!(!lex_diag.had_error());
        let (program, parse_diag) = Parser::parse(tokens);
        assert!(!parse_diag.had_error(), "{:?}", parse_diag.errors());
        let (locals, resolve_diag) = resolve::resolve(&program);
        assert!(!resolve_diag.had_error());
        Interpreter::new(locals).interpret(&program)
    }

    #[test]
    fn arithmetic_and_precedence() {
        assert!(run("print 1 + 2 * 3;").is_ok());
    }

    #[test]
    fn string_concatenation() {
        assert!(run(r#"print "a" + "b";"#).is_ok());
    }

    #[test]
    fn mixed_plus_is_a_runtime_error() {
        let result = run(r#"print "a" + 1;"#);
        assert!(result.is_err());
        assert!(result.unwrap_err().message.contains("numbers or"));
    }

    #[test]
    fn closures_capture_by_reference_to_shared_state() {
        let src = r#"
            fun makeCounter() {
                var i = 0;
                fun counter() {
                    i = i + 1;
                    return i;
                }
                return counter;
            }
            var counter = makeCounter();
            print counter();
            print counter();
        "#;
        assert!(run(src).is_ok());
    }

    #[test]
    fn arity_mismatch_is_a_runtime_error() {
        let result = run("fun f(a, b) { return a + b; } f(1);");
        assert!(result.is_err());
        assert!(result.unwrap_err().message.contains("Expected 2 arguments"));
    }

    #[test]
    fn undefined_variable_is_a_runtime_error() {
        let result = run("print missing;");
        assert!(result.is_err());
        assert!(result.unwrap_err().message.contains("Undefined variable"));
    }

    #[test]
    fn for_loop_desugaring_executes_expected_iterations() {
        assert!(run("for (var i = 0; i < 3; i = i + 1) print i;").is_ok());
    }

    #[test]
    fn block_exit_restores_the_enclosing_environment() {
        // Whatever frame was current before a block is entered must be
        // current again after it exits, by object identity, whether the
        // block falls through normally or returns early from inside a
        // function call.
        let interpreter = Interpreter::new(HashMap::new());
        let before = interpreter.globals.clone();

        let (tokens, _) = Lexer::lex(Rc::new(Source::source("{ var a = 1; }")));
        let (program, parse_diag) = Parser::parse(tokens);
        assert!(!parse_diag.had_error());
        interpreter.interpret(&program).unwrap();

        assert!(before.same_frame(&interpreter.globals));
    }

    #[test]
    fn block_scoping_shadows_without_leaking() {
        let src = r#"
            var a = "outer";
            {
                var a = "inner";
                print a;
            }
            print a;
        "#;
        assert!(run(src).is_ok());
    }
}
