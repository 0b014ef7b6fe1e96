use std::collections::{linked_list, LinkedList};

use crate::{Error, Result};

/// FIFO queue whose contents can be spliced onto another queue in O(1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Queue<T> {
    nodes: LinkedList<T>,
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self {
            nodes: LinkedList::new(),
        }
    }
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(value: T) -> Self {
        let mut queue = Self::new();
        queue.enqueue(value);
        queue
    }

    pub fn enqueue(&mut self, value: T) {
        self.nodes.push_back(value);
    }

    /// Removes the oldest element.
    pub fn dequeue(&mut self) -> Result<T> {
        self.nodes.pop_front().ok_or(Error::EmptyQueue)
    }

    /// The element the next [Queue::dequeue] would return.
    pub fn front(&self) -> Option<&T> {
        self.nodes.front()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Moves every element of `source` behind the elements of `self`.
    /// `source` is left empty.
    pub fn append(&mut self, source: &mut Queue<T>) {
        self.nodes.append(&mut source.nodes);
    }

    pub fn iter(&self) -> linked_list::Iter<'_, T> {
        self.nodes.iter()
    }
}

impl<T> FromIterator<T> for Queue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Queue<T> {
    type Item = T;
    type IntoIter = linked_list::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Queue<T> {
    type Item = &'a T;
    type IntoIter = linked_list::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
