// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::fmt;

use digest::Digest;
use log::*;

use crate::{
    bit_utils::{check_height, check_index},
    hashing::NodeHash,
    LeafIndex,
    SmtError,
    SparseMerkleProof,
    SparseMerkleTreeConfig,
};

const LOG_TARGET: &str = "c::frontier_smt::tree";

/// A height-bounded sparse Merkle tree that only ever stores its root and the proof for its frontier, the next unused
/// leaf index.
///
/// Leaves are appended by updating the frontier proof, after which the frontier advances by one. Leaves that have
/// already been appended can be updated in place with their current proof. Trees are immutable values: every update
/// returns a new tree and leaves the old one untouched, so older states remain usable for as long as they are held.
///
/// Holders of proofs for other leaves pass them along with an update to have them synchronised with the change.
pub struct SparseMerkleTree<D: Digest> {
    root: Option<NodeHash<D>>,
    height: usize,
    last_proof: SparseMerkleProof<D>,
}

/// The result of a successful [`SparseMerkleTree::update`].
pub struct UpdateResult<D: Digest> {
    /// The tree after the update.
    pub tree: SparseMerkleTree<D>,
    /// The proofs passed in for synchronisation, updated to the new tree and in the same order.
    pub proofs: Vec<SparseMerkleProof<D>>,
}

impl<D: Digest> SparseMerkleTree<D> {
    /// Creates an empty tree with room for `2^height` leaves.
    pub fn new(height: usize) -> Result<Self, SmtError> {
        check_height(height)?;
        Ok(Self {
            root: None,
            height,
            last_proof: SparseMerkleProof::empty(height)?,
        })
    }

    /// Creates an empty tree with the configured height.
    pub fn from_config(config: &SparseMerkleTreeConfig) -> Result<Self, SmtError> {
        Self::new(config.height)
    }

    /// The root digest, or `None` while the tree holds no leaves.
    pub fn root(&self) -> Option<&NodeHash<D>> {
        self.root.as_ref()
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The proof for the frontier leaf. Updating it appends a leaf.
    pub fn last_proof(&self) -> &SparseMerkleProof<D> {
        &self.last_proof
    }

    /// The frontier: the lowest index that has not been appended to yet. Once the last leaf of the tree has been
    /// appended the frontier stays on it.
    pub fn next_index(&self) -> LeafIndex {
        self.last_proof.index()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Checks a proof against the current root.
    pub fn validate_proof(&self, proof: &SparseMerkleProof<D>) -> bool {
        proof.validate(self.root(), self.height)
    }

    /// Sets the leaf authenticated by `proof` to `new_value`.
    ///
    /// `proof` must be the current proof of an appended leaf or of the frontier. Updating the frontier appends a leaf
    /// and advances the frontier by one. Every proof in `proofs_to_update` is synchronised with the change and returned
    /// in the same order. `filter` is consulted once with the target index and new value, and can veto the update.
    ///
    /// All checks happen before anything is hashed: on error neither this tree nor any of the given proofs is
    /// affected.
    pub fn update<F>(
        &self,
        proof: &SparseMerkleProof<D>,
        new_value: Option<Vec<u8>>,
        proofs_to_update: &[SparseMerkleProof<D>],
        filter: F,
    ) -> Result<UpdateResult<D>, SmtError>
    where
        F: FnOnce(LeafIndex, Option<&[u8]>) -> bool,
    {
        self.check_levels(proof)?;
        self.check_levels(&self.last_proof)?;
        for tracked in proofs_to_update {
            self.check_levels(tracked)?;
            check_index(tracked.index(), self.height)?;
        }
        let index = proof.index();
        check_index(index, self.height)?;
        let next_index = self.next_index();
        if index > next_index {
            return Err(SmtError::InvalidAppendIndex { index, next_index });
        }
        let new_value = new_value.filter(|v| !v.is_empty());
        if !filter(index, new_value.as_deref()) {
            return Err(SmtError::Rejected { index });
        }

        let (root, changes) = proof.propagate_changes(new_value.as_deref());

        let frontier = if index == next_index {
            match self.last_proof.next_frontier(&changes) {
                Some(next) => {
                    trace!(target: LOG_TARGET, "Frontier advanced from {} to {}", index, next.index());
                    next
                },
                None => {
                    debug!(target: LOG_TARGET, "Leaf {} is the last leaf of the tree. The tree is full", index);
                    self.last_proof.clone()
                },
            }
        } else {
            self.last_proof.clone()
        };
        let last_proof = frontier.apply_change(index, new_value.as_deref(), &changes)?;
        let proofs = proofs_to_update
            .iter()
            .map(|p| p.apply_change(index, new_value.as_deref(), &changes))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            target: LOG_TARGET,
            "Updated leaf {} (height {}, {} tracked proofs). Next free index is {}",
            index,
            self.height,
            proofs.len(),
            last_proof.index()
        );

        Ok(UpdateResult {
            tree: Self {
                root,
                height: self.height,
                last_proof,
            },
            proofs,
        })
    }

    /// Sets the leaf authenticated by `proof` to `new_value`, without synchronising other proofs or consulting an
    /// admission policy.
    pub fn update_leaf(&self, proof: &SparseMerkleProof<D>, new_value: Option<Vec<u8>>) -> Result<Self, SmtError> {
        Ok(self.update(proof, new_value, &[], |_, _| true)?.tree)
    }

    /// Appends `value` at the frontier, synchronising `proofs_to_update` with the change.
    pub fn append(
        &self,
        value: Vec<u8>,
        proofs_to_update: &[SparseMerkleProof<D>],
    ) -> Result<UpdateResult<D>, SmtError> {
        self.update(&self.last_proof, Some(value), proofs_to_update, |_, _| true)
    }

    fn check_levels(&self, proof: &SparseMerkleProof<D>) -> Result<(), SmtError> {
        if proof.height() != self.height {
            return Err(SmtError::LevelCountMismatch {
                expected: self.height,
                actual: proof.height(),
            });
        }
        Ok(())
    }
}

impl<D: Digest> Clone for SparseMerkleTree<D> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            height: self.height,
            last_proof: self.last_proof.clone(),
        }
    }
}

impl<D: Digest> PartialEq for SparseMerkleTree<D> {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.height == other.height && self.last_proof == other.last_proof
    }
}

impl<D: Digest> Eq for SparseMerkleTree<D> {}

impl<D: Digest> fmt::Debug for SparseMerkleTree<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseMerkleTree")
            .field("root", &self.root)
            .field("height", &self.height)
            .field("last_proof", &self.last_proof)
            .finish()
    }
}

impl<D: Digest> fmt::Debug for UpdateResult<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateResult")
            .field("tree", &self.tree)
            .field("proofs", &self.proofs)
            .finish()
    }
}
