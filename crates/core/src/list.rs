use std::slice::Iter;

use crate::{AppError, AppResult};

/// Ordered container holding elements of exactly one type.
///
/// Insertion order is preserved for iteration, `to_vec` and `map`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedList<T> {
    items: Vec<T>,
}

impl<T> TypedList<T> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Appends a value to the end of the list.
    pub fn push(&mut self, value: T) {
        self.items.push(value);
    }

    /// Stores a value at `offset`, or appends it when no offset is given.
    ///
    /// An offset equal to the current length appends; anything beyond that
    /// is rejected.
    pub fn set(&mut self, offset: Option<usize>, value: T) -> AppResult<()> {
        let Some(offset) = offset else {
            self.items.push(value);
            return Ok(());
        };

        let len = self.items.len();
        match offset {
            offset if offset < len => {
                self.items[offset] = value;
                Ok(())
            }
            offset if offset == len => {
                self.items.push(value);
                Ok(())
            }
            offset => Err(AppError::OutOfBounds { offset, len }),
        }
    }

    /// Returns the element at `offset`, if any.
    #[must_use]
    pub fn get(&self, offset: usize) -> Option<&T> {
        self.items.get(offset)
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the list holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates the elements in insertion order.
    pub fn iter(&self) -> Iter<'_, T> {
        self.items.iter()
    }

    /// Returns the elements as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        self.items.as_slice()
    }

    /// Returns the first element matching `predicate`.
    pub fn find_by<P>(&self, mut predicate: P) -> Option<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.items.iter().find(|item| predicate(item))
    }

    /// Maps every element, preserving order.
    pub fn map<'a, U, F>(&'a self, f: F) -> Vec<U>
    where
        F: FnMut(&'a T) -> U,
    {
        self.items.iter().map(f).collect()
    }
}

impl<T: Clone> TypedList<T> {
    /// Returns a shallow copy of the elements.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}

impl<T> Default for TypedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for TypedList<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> FromIterator<T> for TypedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<T> for TypedList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T> IntoIterator for TypedList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a TypedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
