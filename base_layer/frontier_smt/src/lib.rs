// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Frontier sparse Merkle trees
//!
//! A height-bounded binary Merkle tree over `2^height` leaf slots, most of which are empty. The tree does not store
//! its leaves or its interior nodes. It only keeps its root digest and the proof for its _frontier_, the lowest leaf
//! index that has never been written to. Everything else lives in the proofs held by the parties that own the leaves.
//!
//! Leaves are added by appending at the frontier and changed by updating them in place with their current proof. Both
//! go through [`SparseMerkleTree::update`], which also brings any proofs passed along with it up to date, so that
//! holders of other leaves can keep their proofs valid without access to the rest of the tree.
//!
//! Level `n` of every proof pairs with bit `n` of the leaf index, counting from the least significant bit. Two leaves
//! therefore share every sibling above the highest bit at which their indices differ, and at that bit each one's path
//! node is the other's sibling.
//!
//! ```text
//!                  root
//!           ┌───────┴───────┐
//!         ┌─┴─┐           ┌─┴─┐            level 1 (bit 1)
//!        ┌┴┐ ┌┴┐         ┌┴┐ ┌┴┐           level 0 (bit 0)
//!        A   B           ·   ·
//!        00  01          10  11
//! ```
//!
//! After appending A and B to a tree of height 2 the frontier is 10. Its proof carries the digest of the (A, B)
//! subtree at level 1 and an empty sibling at level 0.
//!
//! ```rust
//! use blake2::Blake2b;
//! use digest::consts::U32;
//! use tari_frontier_smt::SparseMerkleTree;
//!
//! let tree = SparseMerkleTree::<Blake2b<U32>>::new(2).unwrap();
//! let result = tree.append(b"A".to_vec(), &[tree.last_proof().clone()]).unwrap();
//! let proof_a = result.proofs[0].clone();
//! let result = result.tree.append(b"B".to_vec(), &[proof_a]).unwrap();
//! let tree = result.tree;
//! let proof_a = &result.proofs[0];
//!
//! assert_eq!(tree.next_index(), 2);
//! assert!(tree.validate_proof(proof_a));
//! assert!(tree.validate_proof(tree.last_proof()));
//!
//! // Change A in place, keeping the frontier in sync
//! let tree = tree.update_leaf(proof_a, Some(b"A'".to_vec())).unwrap();
//! assert!(tree.validate_proof(tree.last_proof()));
//! assert!(!tree.validate_proof(proof_a));
//! ```

mod bit_utils;
mod config;
mod encoding;
mod error;
pub mod hashing;
mod node;
mod proof;
mod serde_support;
mod tree;

pub use bit_utils::MAX_HEIGHT;
pub use config::{ConfigurationError, SparseMerkleTreeConfig};
pub use error::{ProofEncodingError, SmtError};
pub use hashing::{hash_branch, hash_leaf, FrontierSmtHashDomain, NodeHash};
pub use proof::{LevelHash, SparseMerkleProof};
pub use tree::{SparseMerkleTree, UpdateResult};

/// The position of a leaf in the tree. Only the lowest `height` bits are ever set.
pub type LeafIndex = u128;
