//! Mutable per-session context.
//!
//! A context is an open JSON object that scenarios seed and response
//! producers read and update. Where the current context lives depends on the
//! server's isolation policy; see [`store`].

mod cookie;
mod store;

use std::fmt;

use serde_json::{Map, Value};

pub use cookie::{CookiePayload, CONTEXT_COOKIE_NAME};
pub(crate) use store::{ContextCache, ContextSlot, ServerSlots, Session};
pub use store::{CONTEXT_HEADER, SCENARIO_HEADER};

/// Context values keyed by name.
pub type Context = Map<String, Value>;

/// Convert a JSON value into a context. Non-object values yield an empty context.
pub fn to_context(value: Value) -> Context {
    match value {
        Value::Object(map) => map,
        _ => Context::new(),
    }
}

/// A change to apply to the current context.
pub enum ContextPatch {
    /// Keys that replace (or add to) those in the current context.
    Replace(Context),
    /// Computes the replacement keys from the current context.
    Transform(Box<dyn FnOnce(&Context) -> Context + Send>),
}

impl ContextPatch {
    /// Build a patch from a function of the current context.
    pub fn transform<F>(f: F) -> Self
    where
        F: FnOnce(&Context) -> Context + Send + 'static,
    {
        Self::Transform(Box::new(f))
    }

    /// Shallow-merge this patch onto `current`, returning the new context.
    pub fn apply(self, current: &Context) -> Context {
        let patch = match self {
            Self::Replace(patch) => patch,
            Self::Transform(f) => f(current),
        };

        let mut next = current.clone();
        next.extend(patch);
        next
    }
}

impl fmt::Debug for ContextPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(patch) => f.debug_tuple("Replace").field(patch).finish(),
            Self::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

impl From<Context> for ContextPatch {
    fn from(patch: Context) -> Self {
        Self::Replace(patch)
    }
}

impl From<Value> for ContextPatch {
    fn from(value: Value) -> Self {
        Self::Replace(to_context(value))
    }
}

/// Handle through which response producers update the session's context.
///
/// Cloning is cheap and clones write to the same slot, so a producer may move
/// an updater into a task of its own. Such tasks are owned by the producer:
/// the server neither tracks nor cancels them.
#[derive(Clone, Debug)]
pub struct ContextUpdater {
    slot: ContextSlot,
}

impl ContextUpdater {
    pub(crate) fn new(slot: ContextSlot) -> Self {
        Self { slot }
    }

    /// Snapshot of the current context.
    pub async fn current(&self) -> Context {
        self.slot.get().await
    }

    /// Merge `patch` into the current context, persist it, and return the result.
    pub async fn update(&self, patch: impl Into<ContextPatch>) -> Context {
        let patch = patch.into();
        self.slot.update(|current| patch.apply(current)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_replace_overwrites_and_adds_keys() {
        let current = to_context(json!({"a": 1, "keep": true}));
        let next = ContextPatch::from(json!({"a": 2, "b": 3})).apply(&current);

        assert_eq!(Value::Object(next), json!({"a": 2, "b": 3, "keep": true}));
    }

    #[test]
    fn test_transform_sees_current_context() {
        let current = to_context(json!({"age": 40}));
        let patch = ContextPatch::transform(|ctx| {
            let age = ctx.get("age").and_then(Value::as_i64).unwrap_or(0);
            to_context(json!({ "age": age + 1 }))
        });

        let next = patch.apply(&current);
        assert_eq!(next.get("age"), Some(&json!(41)));
    }

    #[test]
    fn test_non_object_value_is_empty_context() {
        assert!(to_context(json!([1, 2])).is_empty());
        assert!(to_context(Value::Null).is_empty());
    }
}
