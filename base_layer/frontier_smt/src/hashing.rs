// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Domain-separated node hashing for the frontier sparse Merkle tree.
//!
//! Leaves and branches are hashed under the same hash domain but with distinct labels, so a leaf can never be
//! mistaken for a branch with the same byte content. Sibling digests that are already known are passed through as
//! they are and never rehashed. All hash inputs are Borsh encoded, which makes the encoding of every node canonical
//! and prefixes variable length data with its length.

use borsh::{io, io::Write, BorshSerialize};
use digest::Digest;
use tari_crypto::{hash_domain, hashing::DomainSeparation};

use crate::LeafIndex;

hash_domain!(FrontierSmtHashDomain, "com.tari.base_layer.frontier_smt", 1);

/// The digest of a tree node. Its width is fixed by the digest algorithm `D`.
pub type NodeHash<D> = digest::Output<D>;

const LEAF_LABEL: &str = "leaf";
const BRANCH_LABEL: &str = "branch";

/// Hashes a present leaf. The leaf index is committed to along with the value.
pub fn hash_leaf<D: Digest>(index: LeafIndex, value: &[u8]) -> NodeHash<D> {
    NodeHasher::<D>::new_with_label(LEAF_LABEL)
        .chain(&index)
        .chain(value)
        .finalize()
}

/// Hashes an ordered pair of children. Returns `None` when both children are absent, since a wholly empty subtree
/// carries no digest.
///
/// An absent child does not simply drop out of the hash input. Each side is written as a Borsh `Option`, so an absent
/// side contributes the one-byte `None` tag and a present side contributes the `Some` tag followed by its
/// length-prefixed digest. This is part of the hash format: (x, absent) and (absent, x) hash differently, and neither
/// equals a hash over `x` alone.
pub fn hash_branch<D: Digest>(left: Option<&NodeHash<D>>, right: Option<&NodeHash<D>>) -> Option<NodeHash<D>> {
    if left.is_none() && right.is_none() {
        return None;
    }
    let hash = NodeHasher::<D>::new_with_label(BRANCH_LABEL)
        .chain(&left.map(|h| h.as_slice()))
        .chain(&right.map(|h| h.as_slice()))
        .finalize();
    Some(hash)
}

/// A domain-separated hasher that feeds the Borsh encoding of its inputs into the digest. Unlike
/// `tari_hashing::DomainSeparatedBorshHasher` it accepts unsized inputs, so leaf values are hashed straight from a
/// `[u8]` slice.
struct NodeHasher<D> {
    writer: WriteHashWrapper<D>,
}

impl<D: Digest> NodeHasher<D> {
    fn new_with_label(label: &str) -> Self {
        let mut digest = D::new();
        FrontierSmtHashDomain::add_domain_separation_tag(&mut digest, label);
        Self {
            writer: WriteHashWrapper(digest),
        }
    }

    fn chain<T: BorshSerialize + ?Sized>(mut self, data: &T) -> Self {
        BorshSerialize::serialize(data, &mut self.writer)
            .expect("Incorrect implementation of BorshSerialize encountered. Implementations MUST be infallible.");
        self
    }

    fn finalize(self) -> NodeHash<D> {
        self.writer.0.finalize()
    }
}

/// Lets Borsh write straight into a digest.
struct WriteHashWrapper<D>(D);

impl<D: Digest> Write for WriteHashWrapper<D> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
