use std::time::{SystemTime, UNIX_EPOCH};

use crate::common::value::Value;

/// `clock()` -- milliseconds since the Unix epoch, as a float. Useful for
/// timing a program's own execution; not itself monotonic.
pub fn clock(_args: &[Value]) -> Value {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    Value::Number(elapsed.as_millis() as f64)
}
