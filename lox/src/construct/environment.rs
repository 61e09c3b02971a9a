use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::common::value::Value;

struct EnvironmentData {
    values: HashMap<String, Value>,
    enclosing: Option<Environment>,
}

/// An ordered mapping `name -> Value` plus an optional enclosing
/// environment, forming a chain. Closures retain the chain current at
/// their definition, so frames are shared by reference and
/// heap-allocated (`Rc<RefCell<_>>`) rather than owned -- the one place
/// in this interpreter where shared ownership is load bearing.
/// Execution is single-threaded, so plain `Rc`/`RefCell` are enough;
/// nothing here needs to be `Sync`.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<EnvironmentData>>);

/// Identity only -- printing the bound names would risk unbounded
/// recursion through closures that capture an environment containing
/// themselves.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment({:p})", Rc::as_ptr(&self.0))
    }
}

impl Environment {
    /// Creates a root environment with no enclosing parent.
    pub fn new() -> Environment {
        Environment(Rc::new(RefCell::new(EnvironmentData {
            values: HashMap::new(),
            enclosing: None,
        })))
    }

    /// Creates a new environment enclosed by `parent` (entering a block,
    /// or a function call binding its closure).
    pub fn child_of(parent: &Environment) -> Environment {
        Environment(Rc::new(RefCell::new(EnvironmentData {
            values: HashMap::new(),
            enclosing: Some(parent.clone()),
        })))
    }

    /// Two environments are the same frame if they share the same
    /// backing allocation — used to assert that a block restores its
    /// enclosing environment on every exit path.
    pub fn same_frame(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Binds `name` in this (the innermost) frame, always overwriting an
    /// existing binding.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().values.insert(name.into(), value);
    }

    /// Looks up `name` starting in this frame and walking outward.
    pub fn get(&self, name: &str) -> Option<Value> {
        let data = self.0.borrow();
        if let Some(value) = data.values.get(name) {
            return Some(value.clone());
        }
        data.enclosing.as_ref().and_then(|parent| parent.get(name))
    }

    /// Looks up `name` exactly `depth` hops out from this frame, as
    /// resolved by the static resolver.
    pub fn get_at(&self, depth: usize, name: &str) -> Value {
        self.ancestor(depth)
            .0
            .borrow()
            .values
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("resolver produced an invalid depth for '{name}'"))
    }

    /// Assigns to an existing binding, searching outward from this
    /// frame. Fails if the name was never introduced by `var` anywhere
    /// in the chain.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), ()> {
        let mut data = self.0.borrow_mut();
        if let Some(slot) = data.values.get_mut(name) {
            *slot = value;
            return Ok(());
        }
        match &data.enclosing {
            Some(parent) => parent.assign(name, value),
            None => Err(()),
        }
    }

    /// Assigns to a binding exactly `depth` hops out, as resolved by the
    /// static resolver.
    pub fn assign_at(&self, depth: usize, name: &str, value: Value) {
        let ancestor = self.ancestor(depth);
        ancestor
            .0
            .borrow_mut()
            .values
            .insert(name.to_string(), value);
    }

    fn ancestor(&self, depth: usize) -> Environment {
        let mut env = self.clone();
        for _ in 0..depth {
            let next = env
                .0
                .borrow()
                .enclosing
                .clone()
                .unwrap_or_else(|| panic!("resolver produced a depth deeper than the environment chain"));
            env = next;
        }
        env
    }
}

impl Default for Environment {
    fn default() -> Environment {
        Environment::new()
    }
}
