//! Many-to-many membership between containers and their contents.
//!
//! The relation only stores identifiers. Whatever the identifiers point at
//! is owned elsewhere (the network's graph and line list), so membership
//! never keeps an object alive and never forms an ownership cycle.

use std::{collections::HashMap, hash::Hash};

/// Bidirectional index from containers to contents and back.
///
/// Both directions keep insertion order so listings are stable across runs.
#[derive(Debug, Clone)]
pub struct ContainerRelation<C, T> {
    contents: HashMap<C, Vec<T>>,
    containers: HashMap<T, Vec<C>>,
}

impl<C, T> Default for ContainerRelation<C, T> {
    fn default() -> Self {
        Self {
            contents: HashMap::new(),
            containers: HashMap::new(),
        }
    }
}

impl<C, T> ContainerRelation<C, T>
where
    C: Copy + Eq + Hash,
    T: Copy + Eq + Hash,
{
    /// Create an empty relation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `content` as a member of `container`. Returns `false` when the
    /// link already existed.
    pub fn add(&mut self, container: C, content: T) -> bool {
        let members = self.contents.entry(container).or_default();
        if members.contains(&content) {
            return false;
        }
        members.push(content);
        self.containers.entry(content).or_default().push(container);
        true
    }

    /// Remove a single link. Returns `false` when it was not present.
    pub fn remove(&mut self, container: C, content: T) -> bool {
        let Some(members) = self.contents.get_mut(&container) else {
            return false;
        };
        let Some(position) = members.iter().position(|item| *item == content) else {
            return false;
        };
        members.remove(position);
        if members.is_empty() {
            self.contents.remove(&container);
        }

        if let Some(owners) = self.containers.get_mut(&content) {
            owners.retain(|owner| *owner != container);
            if owners.is_empty() {
                self.containers.remove(&content);
            }
        }
        true
    }

    /// Whether `content` belongs to `container`.
    pub fn contains(&self, container: C, content: T) -> bool {
        self.contents
            .get(&container)
            .map(|members| members.contains(&content))
            .unwrap_or(false)
    }

    /// Members of `container` in the order they were added.
    pub fn contents(&self, container: C) -> &[T] {
        self.contents
            .get(&container)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Containers holding `content`, in the order the links were made.
    pub fn containers(&self, content: T) -> &[C] {
        self.containers
            .get(&content)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of containers with at least one member.
    pub fn container_count(&self) -> usize {
        self.contents.len()
    }

    /// Whether no links are recorded at all.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}
