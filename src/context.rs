//! Type-keyed LIFO store for cross-rule communication.
//!
//! A rule pushes a value before delegating to the rules it calls, and those
//! rules look it up by type instead of receiving extra parameters. The parser
//! and every traversal own separate stacks.

use std::any::{type_name, Any};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("no {0} on the context stack")]
    Missing(&'static str),

    #[error("cannot exit {expected}: the context stack is empty")]
    Empty { expected: &'static str },

    #[error("cannot exit {expected}: the innermost context has a different type")]
    Mismatch { expected: &'static str },
}

#[derive(Default)]
pub struct ContextStack {
    entries: Vec<Box<dyn Any + Send>>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn enter<T: Any + Send>(&mut self, value: T) {
        self.entries.push(Box::new(value));
    }

    /// Pops the innermost entry, which must be a `T`.
    ///
    /// On a type mismatch the entry stays on the stack.
    pub fn exit<T: Any + Send>(&mut self) -> Result<T, ContextError> {
        let entry = self.entries.pop().ok_or(ContextError::Empty {
            expected: type_name::<T>(),
        })?;
        match entry.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(entry) => {
                self.entries.push(entry);
                Err(ContextError::Mismatch {
                    expected: type_name::<T>(),
                })
            }
        }
    }

    /// The innermost `T`, searching from the top of the stack.
    pub fn find<T: Any>(&self) -> Option<&T> {
        self.entries
            .iter()
            .rev()
            .find_map(|entry| entry.downcast_ref::<T>())
    }

    pub fn find_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .rev()
            .find_map(|entry| entry.downcast_mut::<T>())
    }

    /// Every `T` on the stack, innermost first.
    pub fn find_all<T: Any>(&self) -> impl Iterator<Item = &T> {
        self.entries
            .iter()
            .rev()
            .filter_map(|entry| entry.downcast_ref::<T>())
    }

    pub fn require<T: Any>(&self) -> Result<&T, ContextError> {
        self.find::<T>()
            .ok_or(ContextError::Missing(type_name::<T>()))
    }
}

impl std::fmt::Debug for ContextStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextStack")
            .field("depth", &self.entries.len())
            .finish()
    }
}
