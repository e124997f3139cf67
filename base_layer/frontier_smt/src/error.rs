// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use thiserror::Error;

use crate::LeafIndex;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmtError {
    #[error("Expected a proof with {expected} levels, but it has {actual}")]
    LevelCountMismatch { expected: usize, actual: usize },
    #[error("Cannot update leaf {index}. Only appended leaves or the next free index ({next_index}) can be updated")]
    InvalidAppendIndex { index: LeafIndex, next_index: LeafIndex },
    #[error("The update of leaf {index} was rejected by the admission policy")]
    Rejected { index: LeafIndex },
    #[error("A tree height of {0} exceeds the maximum supported height")]
    InvalidHeight(usize),
    #[error("Leaf index {index} is out of range for a tree of height {height}")]
    IndexOutOfRange { index: LeafIndex, height: usize },
    #[error("Proof encoding error: {0}")]
    Encoding(#[from] ProofEncodingError),
}

/// Failures while writing or reading the compact proof byte format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofEncodingError {
    #[error("Leaf values are limited to 255 bytes, but the value has {0}")]
    ValueTooLong(usize),
    #[error("A proof cannot have more than {max} levels, got {actual}")]
    TooManyLevels { max: usize, actual: usize },
    #[error("Unexpected end of input while reading {field}")]
    UnexpectedEnd { field: &'static str },
    #[error("Invalid length {len} for {field}")]
    InvalidLength { field: &'static str, len: usize },
    #[error("The leaf index is not minimally encoded")]
    NonCanonicalIndex,
    #[error("Encountered a level run of length zero at offset {offset}")]
    EmptyRun { offset: usize },
    #[error("Leaf index {index} does not fit a proof with {levels} levels")]
    IndexOutOfRange { index: LeafIndex, levels: usize },
}
