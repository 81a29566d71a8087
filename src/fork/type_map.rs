// src/fork/type_map.rs

//! Insertion-ordered grouping of resources by type.
//!
//! The writer must lay out types in the order they were first seen, and the
//! resources of each type in the order they were added, so that a parsed
//! fork writes back byte for byte.

use crate::resource::ResType;
use std::collections::HashMap;

/// Groups items by resource type, remembering first-seen type order.
#[derive(Debug, Clone)]
pub struct TypeMap<T> {
    groups: Vec<(ResType, Vec<T>)>,
    positions: HashMap<ResType, usize>,
}

impl<T> TypeMap<T> {
    pub fn new() -> Self {
        TypeMap {
            groups: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Appends `item` to its type's group, opening the group if needed.
    pub fn push(&mut self, res_type: ResType, item: T) {
        let slot = match self.positions.get(&res_type) {
            Some(&slot) => slot,
            None => {
                self.groups.push((res_type, Vec::new()));
                self.positions.insert(res_type, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[slot].1.push(item);
    }

    /// Number of distinct types.
    #[inline]
    pub fn type_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of items across all types.
    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|(_, items)| items.len()).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, res_type: &ResType) -> Option<&[T]> {
        self.positions
            .get(res_type)
            .map(|&slot| self.groups[slot].1.as_slice())
    }

    /// Groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&ResType, &[T])> {
        self.groups.iter().map(|(res_type, items)| (res_type, items.as_slice()))
    }

    /// Items of every group, group by group.
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.groups.iter().flat_map(|(_, items)| items.iter())
    }
}

impl<T> Default for TypeMap<T> {
    fn default() -> Self {
        Self::new()
    }
}
