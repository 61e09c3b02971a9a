use crate::common::value::Value;

/// How a statement finished: fell through normally, or is unwinding a
/// `return` back to the enclosing call. Kept entirely out of the error
/// channel on purpose -- every statement-execution function returns
/// `Result<Flow, Trace>`, so a caller has to explicitly match on `Flow`
/// to notice a `return`, while `Trace`s still propagate for free via
/// `?`.
pub enum Flow {
    Normal,
    Return(Value),
}

impl Flow {
    pub fn is_return(&self) -> bool {
        matches!(self, Flow::Return(_))
    }
}
