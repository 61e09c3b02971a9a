//! The native (host-provided) functions bound into the tree-walking
//! evaluator's global scope before a program's own declarations run.
//! Kept as one small module rather than a general FFI layer -- there is
//! exactly one native function in scope.

mod clock;

use std::rc::Rc;

use crate::common::value::{Callable, NativeFunction, Value};

/// The fixed set of natives every program starts with.
pub fn natives() -> Vec<(&'static str, Value)> {
    vec![(
        "clock",
        Value::Callable(Callable::Native(Rc::new(NativeFunction {
            name: "clock",
            arity: 0,
            func: clock::clock,
        }))),
    )]
}
