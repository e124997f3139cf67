// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::fmt;

use digest::Digest;

use crate::{
    bit_utils::{capacity, check_height, check_index, divergence_bit, get_bit, traverse_direction, TraverseDirection},
    encoding,
    hashing::NodeHash,
    node::Node,
    LeafIndex,
    SmtError,
};

/// The sibling digest needed at one step of an authentication path, or `None` if that sibling subtree is empty.
pub type LevelHash<D> = Option<NodeHash<D>>;

/// An authentication path for a single leaf of a [`SparseMerkleTree`](crate::SparseMerkleTree).
///
/// The proof carries the leaf index, the leaf value it vouches for and one sibling digest per level, ordered from the
/// leaf upwards. It is self-contained: the root can be recomputed from it alone, and it can be kept up to date with
/// changes to other leaves through [`SparseMerkleProof::apply_change`] without access to the rest of the tree.
///
/// ```
/// # use blake2::Blake2b;
/// # use digest::consts::U32;
/// # use tari_frontier_smt::{SparseMerkleProof, SparseMerkleTree};
/// let tree = SparseMerkleTree::<Blake2b<U32>>::new(8).unwrap();
/// let mut my_proof = tree.last_proof().clone();
/// let result = tree.update(&my_proof, Some(b"balance: 10".to_vec()), &[my_proof.clone()], |_, _| true).unwrap();
/// my_proof = result.proofs[0].clone();
/// assert!(my_proof.validate(result.tree.root(), 8));
/// assert_eq!(my_proof.value(), Some(b"balance: 10".as_slice()));
/// ```
pub struct SparseMerkleProof<D: Digest> {
    index: LeafIndex,
    value: Option<Vec<u8>>,
    levels: Vec<LevelHash<D>>,
}

impl<D: Digest> SparseMerkleProof<D> {
    /// Construct a proof from its parts. The height of the proof is the number of levels. An empty value is treated
    /// as an absent one.
    pub fn new(index: LeafIndex, value: Option<Vec<u8>>, levels: Vec<LevelHash<D>>) -> Result<Self, SmtError> {
        check_height(levels.len())?;
        check_index(index, levels.len())?;
        Ok(Self {
            index,
            value: normalize_value(value),
            levels,
        })
    }

    /// A proof for index 0 of a tree of the given height in which every subtree is empty.
    pub fn empty(height: usize) -> Result<Self, SmtError> {
        check_height(height)?;
        Ok(Self {
            index: 0,
            value: None,
            levels: vec![None; height],
        })
    }

    pub fn index(&self) -> LeafIndex {
        self.index
    }

    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    pub fn levels(&self) -> &[LevelHash<D>] {
        &self.levels
    }

    pub fn height(&self) -> usize {
        self.levels.len()
    }

    /// Recomputes the path from this proof's leaf to the root as if the leaf held `new_value`.
    ///
    /// Returns the resulting root and the digests of the path nodes below the root, ordered from the leaf upwards.
    /// Entry `n` of the path is the ancestor of the leaf at height `n` (entry 0 being the leaf itself), which is
    /// exactly the sibling that any leaf diverging from this one at bit `n` needs at level `n` of its own proof.
    pub fn propagate_changes(&self, new_value: Option<&[u8]>) -> (Option<NodeHash<D>>, Vec<LevelHash<D>>) {
        let mut path = Vec::with_capacity(self.levels.len());
        let mut current = Node::<D>::leaf(self.index, new_value.filter(|v| !v.is_empty())).hash();
        for (level, sibling) in self.levels.iter().enumerate() {
            let parent = match traverse_direction(self.index, level) {
                TraverseDirection::Left => {
                    Node::<D>::branch(Node::pass_through(current.as_ref()), Node::pass_through(sibling.as_ref()))
                },
                TraverseDirection::Right => {
                    Node::<D>::branch(Node::pass_through(sibling.as_ref()), Node::pass_through(current.as_ref()))
                },
            }
            .hash();
            path.push(current);
            current = parent;
        }
        (current, path)
    }

    /// The root this proof commits to with its own leaf value.
    pub fn root_hash(&self) -> Option<NodeHash<D>> {
        self.propagate_changes(self.value()).0
    }

    /// Validates the proof against the given root. The proof must have exactly `height` levels, and recomputing the
    /// root from its own leaf value must reproduce `expected_root`. An absent root only matches a proof for an
    /// entirely empty tree.
    #[must_use = "Must use the result of the proof verification"]
    pub fn validate(&self, expected_root: Option<&NodeHash<D>>, height: usize) -> bool {
        if self.levels.len() != height {
            return false;
        }
        self.root_hash().as_ref() == expected_root
    }

    /// Returns a copy of this proof that reflects the change of leaf `changed_index` to `new_value`, where `changes`
    /// is the path returned by [`SparseMerkleProof::propagate_changes`] for that change.
    ///
    /// Only one entry can be affected. If the indices are the same the value is replaced. Otherwise, if the two
    /// indices first differ at bit `p`, the changed leaf lies inside the sibling subtree at level `p` of this proof,
    /// and that sibling is replaced with the new digest. Every lower sibling lies outside the changed leaf's subtree
    /// and every higher one is a common sibling of both leaves, so neither changes.
    pub fn apply_change(
        &self,
        changed_index: LeafIndex,
        new_value: Option<&[u8]>,
        changes: &[LevelHash<D>],
    ) -> Result<Self, SmtError> {
        if changes.len() != self.levels.len() {
            return Err(SmtError::LevelCountMismatch {
                expected: self.levels.len(),
                actual: changes.len(),
            });
        }
        let mut merged = self.clone();
        match divergence_bit(self.index, changed_index, self.levels.len()) {
            None => merged.value = normalize_value(new_value.map(<[u8]>::to_vec)),
            Some(p) => merged.levels[p] = changes[p].clone(),
        }
        Ok(merged)
    }

    /// Derives the proof for the index after this one, given the path `changes` produced while updating this proof's
    /// leaf. Returns `None` if this proof is for the last leaf of the tree.
    ///
    /// Levels above the bit at which the two indices diverge are shared with this proof. At the divergence bit the
    /// next index becomes a right child whose sibling is this leaf's ancestor. Below it the next index descends to the
    /// left of subtrees that have never been appended to, so those siblings are empty.
    pub(crate) fn next_frontier(&self, changes: &[LevelHash<D>]) -> Option<Self> {
        let height = self.levels.len();
        let next_index = self.index + 1;
        if next_index >= capacity(height) {
            return None;
        }
        let p = divergence_bit(self.index, next_index, height)?;
        let levels = self
            .levels
            .iter()
            .enumerate()
            .map(|(level, old)| match level {
                l if l > p => old.clone(),
                l if get_bit(next_index, l) == 1 => changes[l].clone(),
                _ => None,
            })
            .collect();
        Some(Self {
            index: next_index,
            value: None,
            levels,
        })
    }

    /// Serializes the proof into its compact byte representation.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SmtError> {
        Ok(encoding::encode(self)?)
    }

    /// Deserializes a proof from its compact byte representation. The digest width is determined by `D`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SmtError> {
        Ok(encoding::decode(bytes)?)
    }

    pub(crate) fn from_parts_unchecked(index: LeafIndex, value: Option<Vec<u8>>, levels: Vec<LevelHash<D>>) -> Self {
        Self {
            index,
            value: normalize_value(value),
            levels,
        }
    }
}

fn normalize_value(value: Option<Vec<u8>>) -> Option<Vec<u8>> {
    value.filter(|v| !v.is_empty())
}

impl<D: Digest> Clone for SparseMerkleProof<D> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            value: self.value.clone(),
            levels: self.levels.clone(),
        }
    }
}

impl<D: Digest> PartialEq for SparseMerkleProof<D> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.value == other.value && self.levels == other.levels
    }
}

impl<D: Digest> Eq for SparseMerkleProof<D> {}

impl<D: Digest> fmt::Debug for SparseMerkleProof<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseMerkleProof")
            .field("index", &self.index)
            .field("value", &self.value)
            .field("levels", &self.levels)
            .finish()
    }
}
