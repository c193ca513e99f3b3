//! Last-in first-out collection.

use crate::info::{SequenceKind, SequenceType, TypeInfo, Typed};
use crate::Result;

/// A LIFO stack. Iteration yields items in pop order, top first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stack<T> {
    items: Vec<T>,
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in pop order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.items.iter().rev()
    }
}

/// Pushes the items in iteration order; the last item ends on top.
impl<T> FromIterator<T> for Stack<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<T> for Stack<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T> IntoIterator for Stack<T> {
    type Item = T;
    type IntoIter = std::iter::Rev<std::vec::IntoIter<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter().rev()
    }
}

impl<T: Typed> Typed for Stack<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::sequence::<Self>()
    }
}

impl<T: Typed> SequenceType for Stack<T> {
    type Item = T;
    const KIND: SequenceKind = SequenceKind::Stack;

    fn items(&self) -> Vec<&T> {
        self.iter().collect()
    }

    fn from_items(items: Vec<T>) -> Result<Self> {
        Ok(items.into_iter().collect())
    }
}
