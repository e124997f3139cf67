// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use digest::Digest;

use crate::{
    hashing::{hash_branch, hash_leaf, NodeHash},
    LeafIndex,
};

/// The nodes met while walking a path from a leaf to the root. They only exist for the duration of one propagation;
/// the tree itself never stores nodes.
pub(crate) enum Node<'a, D: Digest> {
    /// A subtree with no present leaves.
    Empty,
    Leaf {
        index: LeafIndex,
        value: &'a [u8],
    },
    /// A subtree whose digest is already known, such as a sibling taken from a proof.
    PassThrough(&'a NodeHash<D>),
    Branch {
        left: Option<NodeHash<D>>,
        right: Option<NodeHash<D>>,
    },
}

impl<'a, D: Digest> Node<'a, D> {
    pub fn leaf(index: LeafIndex, value: Option<&'a [u8]>) -> Self {
        match value {
            Some(value) => Node::Leaf { index, value },
            None => Node::Empty,
        }
    }

    pub fn pass_through(hash: Option<&'a NodeHash<D>>) -> Self {
        match hash {
            Some(hash) => Node::PassThrough(hash),
            None => Node::Empty,
        }
    }

    pub fn branch(left: Self, right: Self) -> Self {
        Node::Branch {
            left: left.hash(),
            right: right.hash(),
        }
    }

    pub fn hash(self) -> Option<NodeHash<D>> {
        match self {
            Node::Empty => None,
            Node::Leaf { index, value } => Some(hash_leaf::<D>(index, value)),
            Node::PassThrough(hash) => Some(hash.clone()),
            Node::Branch { left, right } => hash_branch::<D>(left.as_ref(), right.as_ref()),
        }
    }
}

#[cfg(test)]
mod test {
    use blake2::Blake2b;
    use digest::consts::U32;

    use super::*;

    type N<'a> = Node<'a, Blake2b<U32>>;

    #[test]
    fn empty_subtrees_stay_empty() {
        assert!(N::leaf(3, None).hash().is_none());
        assert!(N::pass_through(None).hash().is_none());
        assert!(N::branch(N::Empty, N::Empty).hash().is_none());
        assert!(N::branch(N::branch(N::Empty, N::Empty), N::Empty).hash().is_none());
    }

    #[test]
    fn pass_through_is_not_rehashed() {
        let leaf = N::leaf(1, Some(b"v".as_slice())).hash().unwrap();
        assert_eq!(N::pass_through(Some(&leaf)).hash(), Some(leaf.clone()));
        // A branch built from a pass-through sibling matches one built from the leaf itself
        let a = N::branch(N::leaf(0, Some(b"u".as_slice())), N::pass_through(Some(&leaf))).hash();
        let b = N::branch(N::leaf(0, Some(b"u".as_slice())), N::leaf(1, Some(b"v".as_slice()))).hash();
        assert_eq!(a, b);
    }
}
