// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::collections::BTreeMap;

use blake2::Blake2b;
use digest::consts::U32;
use tari_frontier_smt::{hash_branch, hash_leaf, LeafIndex, NodeHash, SparseMerkleProof, SparseMerkleTree};

pub type Hasher = Blake2b<U32>;
pub type Tree = SparseMerkleTree<Hasher>;
pub type Proof = SparseMerkleProof<Hasher>;
pub type Hash = NodeHash<Hasher>;

/// A naive, fully materialised model of the tree. Every present node of every level is kept, keyed by its position
/// within the level.
#[derive(Debug, Default, Clone)]
pub struct ReferenceTree {
    height: usize,
    leaves: BTreeMap<LeafIndex, Vec<u8>>,
}

impl ReferenceTree {
    pub fn new(height: usize) -> Self {
        Self {
            height,
            leaves: BTreeMap::new(),
        }
    }

    pub fn set<V: AsRef<[u8]>>(&mut self, index: LeafIndex, value: Option<V>) {
        match value.filter(|v| !v.as_ref().is_empty()) {
            Some(v) => self.leaves.insert(index, v.as_ref().to_vec()),
            None => self.leaves.remove(&index),
        };
    }

    pub fn value(&self, index: LeafIndex) -> Option<&[u8]> {
        self.leaves.get(&index).map(Vec::as_slice)
    }

    /// Level `n` holds the nodes at height `n`, level 0 being the leaves.
    fn levels(&self) -> Vec<BTreeMap<LeafIndex, Hash>> {
        let mut levels = Vec::with_capacity(self.height + 1);
        let leaves = self
            .leaves
            .iter()
            .map(|(index, value)| (*index, hash_leaf::<Hasher>(*index, value)))
            .collect::<BTreeMap<_, _>>();
        levels.push(leaves);
        for _ in 0..self.height {
            let below = levels.last().expect("at least the leaf level");
            let mut parents = BTreeMap::new();
            for pos in below.keys() {
                let parent = pos >> 1;
                if parents.contains_key(&parent) {
                    continue;
                }
                let left = below.get(&(parent << 1));
                let right = below.get(&((parent << 1) | 1));
                if let Some(hash) = hash_branch::<Hasher>(left, right) {
                    parents.insert(parent, hash);
                }
            }
            levels.push(parents);
        }
        levels
    }

    pub fn root(&self) -> Option<Hash> {
        self.levels()[self.height].get(&0).cloned()
    }

    pub fn proof(&self, index: LeafIndex) -> Proof {
        let levels = self.levels();
        let siblings = (0..self.height)
            .map(|level| levels[level].get(&((index >> level) ^ 1)).cloned())
            .collect();
        Proof::new(index, self.value(index).map(<[u8]>::to_vec), siblings).unwrap()
    }
}

/// Appends `count` leaves with distinct values, returning the tree and the up to date proof of every appended leaf.
pub fn append_leaves(height: usize, count: usize) -> (Tree, Vec<Proof>, ReferenceTree) {
    let mut tree = Tree::new(height).unwrap();
    let mut reference = ReferenceTree::new(height);
    let mut proofs = Vec::with_capacity(count);
    for i in 0..count {
        let value = leaf_value(i);
        let target = tree.last_proof().clone();
        proofs.push(target.clone());
        let result = tree.update(&target, Some(value.clone()), &proofs, |_, _| true).unwrap();
        reference.set(target.index(), Some(&value));
        tree = result.tree;
        proofs = result.proofs;
    }
    (tree, proofs, reference)
}

pub fn leaf_value(n: usize) -> Vec<u8> {
    format!("leaf #{n}").into_bytes()
}
