// src/extract/equivalence.rs
use std::collections::BTreeMap;

use petgraph::unionfind::UnionFind;
use tracing::warn;

use crate::model::{Attribute, Join};

/// Attributes made equal by single-attribute joins.
///
/// The closure is transitive: with `a.x = b.y` and `b.y = c.z` all three
/// attributes land in one class. An attribute that appears in no join is
/// its own singleton class.
#[derive(Debug)]
pub struct EquivalenceClasses {
    index: BTreeMap<Attribute, usize>,
    members: Vec<Attribute>,
    sets: UnionFind<usize>,
}

impl EquivalenceClasses {
    pub fn from_joins<'a>(joins: impl IntoIterator<Item = &'a Join>) -> Self {
        let mut pairs = Vec::new();
        for join in joins {
            match join.as_pair() {
                Some(pair) => pairs.push(pair),
                None => warn!(join = %join, "multi-attribute join ignored for equivalence"),
            }
        }

        let mut index = BTreeMap::new();
        let mut members = Vec::new();
        for attr in pairs.iter().flat_map(|(l, r)| [*l, *r]) {
            index.entry(attr.clone()).or_insert_with(|| {
                members.push(attr.clone());
                members.len() - 1
            });
        }

        let mut sets = UnionFind::new(members.len());
        for (left, right) in pairs {
            sets.union(index[left], index[right]);
        }

        Self {
            index,
            members,
            sets,
        }
    }

    /// Every attribute equal to `attribute`, itself included.
    pub fn class_of(&self, attribute: &Attribute) -> Vec<Attribute> {
        let Some(&i) = self.index.get(attribute) else {
            return vec![attribute.clone()];
        };
        let root = self.sets.find(i);
        self.members
            .iter()
            .enumerate()
            .filter(|(j, _)| self.sets.find(*j) == root)
            .map(|(_, a)| a.clone())
            .collect()
    }
}
