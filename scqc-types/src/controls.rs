use crate::error::QcError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Named subsets of feature or sample indices designated as technical
/// controls (e.g. spike-in transcripts, empty wells) rather than biological
/// signal. Several named sets may coexist; the union of all sets is the
/// derived "all controls" set.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ControlSets {
    sets: Vec<(String, Vec<usize>)>,
}

impl ControlSets {
    /// An empty collection.
    pub fn new() -> ControlSets {
        ControlSets::default()
    }

    /// Add a named set. Names must be unique within the collection.
    pub fn insert(&mut self, name: &str, indices: Vec<usize>) -> Result<(), QcError> {
        if self.sets.iter().any(|(n, _)| n == name) {
            return Err(QcError::DuplicateControlSet(name.to_string()));
        }
        self.sets.push((name.to_string(), indices));
        Ok(())
    }

    /// Number of named sets.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// True if no set has been added.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Iterate over `(name, indices)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.sets.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Check every index against the entity count of the axis the sets
    /// refer to.
    pub fn validate(&self, n: usize) -> Result<(), QcError> {
        for (name, indices) in &self.sets {
            if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
                return Err(QcError::UnknownControlSet {
                    set: name.clone(),
                    index: bad,
                    len: n,
                });
            }
        }
        Ok(())
    }

    /// The sorted, deduplicated union of all sets.
    pub fn union(&self) -> Vec<usize> {
        self.sets
            .iter()
            .flat_map(|(_, v)| v.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Membership mask for the union over `n` entities. Indices are assumed
    /// validated.
    pub fn membership(&self, n: usize) -> Vec<bool> {
        mask(&self.union(), n)
    }
}

/// Membership mask for a set of indices over `n` entities.
pub fn mask(indices: &[usize], n: usize) -> Vec<bool> {
    let mut m = vec![false; n];
    for &i in indices {
        m[i] = true;
    }
    m
}
