// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use crate::{LeafIndex, SmtError};

/// The largest supported tree height. Every index of such a tree, and the first index past its capacity, fits into a
/// [`LeafIndex`].
pub const MAX_HEIGHT: usize = 127;

/// Gets the bit of `index` at `position`, counting from the least significant bit. Level `n` of a proof is selected by
/// bit `n` of the leaf index, so level 0 pairs with the bit closest to the leaf. Does NOT perform range checking.
#[inline]
pub(crate) const fn get_bit(index: LeafIndex, position: usize) -> usize {
    ((index >> position) & 1) as usize
}

/// Returns the highest bit position below `height` at which `a` and `b` differ, or `None` if they agree on all of
/// those bits. This is the level at which the paths of two leaves meet: above it they share every ancestor, at it
/// each one's ancestor is the other's sibling.
///
/// For example, in a tree of height 4 the indices 0101 and 0110 diverge at position 1.
#[inline]
pub(crate) fn divergence_bit(a: LeafIndex, b: LeafIndex, height: usize) -> Option<usize> {
    let diff = (a ^ b) & index_mask(height);
    if diff == 0 {
        return None;
    }
    Some((LeafIndex::BITS - 1 - diff.leading_zeros()) as usize)
}

/// A mask covering the lowest `height` bits of an index.
#[inline]
const fn index_mask(height: usize) -> LeafIndex {
    if height >= LeafIndex::BITS as usize {
        LeafIndex::MAX
    } else {
        (1 << height) - 1
    }
}

/// The number of leaves in a tree of the given height. Only valid for heights up to [`MAX_HEIGHT`].
#[inline]
pub(crate) const fn capacity(height: usize) -> LeafIndex {
    1 << height
}

/// Checks that `index` addresses a leaf of a tree with the given height.
pub(crate) fn check_index(index: LeafIndex, height: usize) -> Result<(), SmtError> {
    if height > MAX_HEIGHT || index >= capacity(height) {
        return Err(SmtError::IndexOutOfRange { index, height });
    }
    Ok(())
}

pub(crate) fn check_height(height: usize) -> Result<(), SmtError> {
    if height > MAX_HEIGHT {
        return Err(SmtError::InvalidHeight(height));
    }
    Ok(())
}

pub(crate) const fn bit_to_dir(bit: usize) -> TraverseDirection {
    match bit {
        0 => TraverseDirection::Left,
        1 => TraverseDirection::Right,
        _ => panic!("Invalid bit"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TraverseDirection {
    Left,
    Right,
}

/// Which child of its parent the ancestor of `index` at `level` is. Level 0 is the leaf itself.
#[inline]
pub(crate) fn traverse_direction(index: LeafIndex, level: usize) -> TraverseDirection {
    bit_to_dir(get_bit(index, level))
}
