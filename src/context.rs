//! Ambient bound context: key/value pairs attached to the current logical
//! task and merged into every record it produces.
//!
//! Storage is thread-local; this crate spawns no runtime of its own, so a
//! thread is the unit of logical-task isolation at this layer. Bindings are
//! scoped by RAII guards: dropping a guard restores whatever the key was
//! bound to before, which makes nested overrides and test isolation free.

use serde_json::{Map, Value};
use std::cell::RefCell;

thread_local! {
    static CONTEXT: RefCell<Map<String, Value>> = RefCell::new(Map::new());
}

/// Bind a context field for the current task until the guard is dropped.
///
/// The returned [`ContextGuard`] restores the previous binding (or removes
/// the key if there was none) on drop. Concurrent tasks never observe each
/// other's bindings.
#[must_use = "dropping the guard immediately unbinds the field"]
pub fn bind(key: impl Into<String>, value: impl Into<Value>) -> ContextGuard {
    let key = key.into();
    let previous = CONTEXT.with(|ctx| ctx.borrow_mut().insert(key.clone(), value.into()));
    ContextGuard { key, previous }
}

/// Remove every bound field for the current task.
pub fn clear() {
    CONTEXT.with(|ctx| ctx.borrow_mut().clear());
}

/// Snapshot of the current task's bound fields, in binding order.
pub fn snapshot() -> Map<String, Value> {
    CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Restores the prior binding of one context key when dropped.
pub struct ContextGuard {
    key: String,
    previous: Option<Value>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CONTEXT.with(|ctx| {
            let mut ctx = ctx.borrow_mut();
            match previous {
                Some(v) => {
                    ctx.insert(self.key.clone(), v);
                }
                None => {
                    ctx.remove(&self.key);
                }
            }
        });
    }
}
