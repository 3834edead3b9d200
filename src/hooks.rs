//! # Replacer and Reviver Hooks
//!
//! Optional transforms applied to the JSON tree on its way into and out of the
//! store. Both hooks receive the member name (or the decimal array index, or
//! `""` for the root) together with the value, and return the value to keep.
//! Returning `None` drops an object member; inside an array, or at the root,
//! it becomes `null`.
//!
//! Ordering:
//! - the replacer runs top-down. The root is visited first and its *result* is
//!   then walked, so a replacer can swap a subtree before its children are seen;
//! - the reviver runs bottom-up. Children are revived before their container,
//!   and the root is revived last.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Signature shared by replacer functions and revivers.
pub type HookFn = dyn Fn(&str, Value) -> Option<Value> + Send + Sync;

/// Transform applied while serializing state.
#[derive(Clone)]
pub enum Replacer {
    /// Called on every value, root first.
    Function(Arc<HookFn>),
    /// Only object members with one of these names are written, at every depth.
    Allowlist(Vec<String>),
}

impl Replacer {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&str, Value) -> Option<Value> + Send + Sync + 'static,
    {
        Replacer::Function(Arc::new(f))
    }

    pub fn allowlist<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Replacer::Allowlist(names.into_iter().map(Into::into).collect())
    }

    /// Apply the replacer to a whole tree.
    pub fn apply(&self, root: Value) -> Value {
        match self {
            Replacer::Function(f) => replace_with(f.as_ref(), "", root).unwrap_or(Value::Null),
            Replacer::Allowlist(names) => retain_members(names, root),
        }
    }
}

impl fmt::Debug for Replacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacer::Function(_) => f.write_str("Replacer::Function(..)"),
            Replacer::Allowlist(names) => f.debug_tuple("Replacer::Allowlist").field(names).finish(),
        }
    }
}

fn replace_with(f: &HookFn, key: &str, value: Value) -> Option<Value> {
    let replaced = f(key, value)?;
    Some(match replaced {
        Value::Object(members) => {
            let mut out = Map::new();
            for (name, child) in members {
                if let Some(child) = replace_with(f, &name, child) {
                    out.insert(name, child);
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| replace_with(f, &i.to_string(), item).unwrap_or(Value::Null))
                .collect(),
        ),
        other => other,
    })
}

fn retain_members(names: &[String], value: Value) -> Value {
    match value {
        Value::Object(members) => Value::Object(
            members
                .into_iter()
                .filter(|(name, _)| names.iter().any(|n| n == name))
                .map(|(name, child)| (name, retain_members(names, child)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| retain_members(names, item))
                .collect(),
        ),
        other => other,
    }
}

/// Transform applied while parsing stored state.
#[derive(Clone)]
pub struct Reviver(Arc<HookFn>);

impl Reviver {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, Value) -> Option<Value> + Send + Sync + 'static,
    {
        Reviver(Arc::new(f))
    }

    /// Apply the reviver to a whole tree.
    pub fn apply(&self, root: Value) -> Value {
        revive_with(self.0.as_ref(), "", root).unwrap_or(Value::Null)
    }
}

impl fmt::Debug for Reviver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Reviver(..)")
    }
}

fn revive_with(f: &HookFn, key: &str, value: Value) -> Option<Value> {
    let value = match value {
        Value::Object(members) => {
            let mut out = Map::new();
            for (name, child) in members {
                if let Some(child) = revive_with(f, &name, child) {
                    out.insert(name, child);
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| revive_with(f, &i.to_string(), item).unwrap_or(Value::Null))
                .collect(),
        ),
        other => other,
    };
    f(key, value)
}
