// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! The compact byte format of a [`SparseMerkleProof`].
//!
//! | field  | encoding                                                                                         |
//! |--------|--------------------------------------------------------------------------------------------------|
//! | index  | one length byte, then the minimal big-endian bytes of the index (index 0 has length 0)           |
//! | value  | one length byte, then the value bytes (an absent value has length 0)                             |
//! | levels | runs of `(count: i8, payload)`, leaf level first. `+k`: k present digests follow, `-k`: k absent |
//!
//! Runs end whenever a level switches between present and absent, and after the last level. Most levels of a sparse
//! tree are absent, so a proof costs little more than the digests it actually carries. The digest width is not part of
//! the stream; it is fixed by the digest type used to decode it.

use digest::Digest;

use crate::{
    bit_utils::MAX_HEIGHT,
    error::ProofEncodingError,
    proof::{LevelHash, SparseMerkleProof},
    LeafIndex,
};

const INDEX_BYTES: usize = LeafIndex::BITS as usize / 8;

pub(crate) fn encode<D: Digest>(proof: &SparseMerkleProof<D>) -> Result<Vec<u8>, ProofEncodingError> {
    let levels = proof.levels();
    if levels.len() > MAX_HEIGHT {
        return Err(ProofEncodingError::TooManyLevels {
            max: MAX_HEIGHT,
            actual: levels.len(),
        });
    }
    let value = proof.value().unwrap_or_default();
    let value_len = u8::try_from(value.len()).map_err(|_| ProofEncodingError::ValueTooLong(value.len()))?;

    let present = levels.iter().filter(|l| l.is_some()).count();
    let mut buf = Vec::with_capacity(2 + INDEX_BYTES + value.len() + levels.len() + present * <D as Digest>::output_size());

    let index = proof.index().to_be_bytes();
    let skip = proof.index().leading_zeros() as usize / 8;
    buf.push((INDEX_BYTES - skip) as u8);
    buf.extend_from_slice(&index[skip..]);

    buf.push(value_len);
    buf.extend_from_slice(value);

    write_levels::<D>(&mut buf, levels);
    Ok(buf)
}

fn write_levels<D: Digest>(buf: &mut Vec<u8>, levels: &[LevelHash<D>]) {
    let mut start = 0;
    while start < levels.len() {
        let present = levels[start].is_some();
        let end = levels[start..]
            .iter()
            .position(|l| l.is_some() != present)
            .map_or(levels.len(), |n| start + n);
        // At most MAX_HEIGHT levels, so every run fits in an i8
        let count = (end - start) as i8;
        if present {
            buf.push(count as u8);
            for hash in levels[start..end].iter().flatten() {
                buf.extend_from_slice(hash.as_slice());
            }
        } else {
            buf.push(count.wrapping_neg() as u8);
        }
        start = end;
    }
}

pub(crate) fn decode<D: Digest>(bytes: &[u8]) -> Result<SparseMerkleProof<D>, ProofEncodingError> {
    let mut reader = ByteReader::new(bytes);

    let index_len = reader.read_u8("index length")? as usize;
    if index_len > INDEX_BYTES {
        return Err(ProofEncodingError::InvalidLength {
            field: "index",
            len: index_len,
        });
    }
    let index_bytes = reader.read_exact(index_len, "index")?;
    if index_bytes.first() == Some(&0) {
        return Err(ProofEncodingError::NonCanonicalIndex);
    }
    let mut index = [0u8; INDEX_BYTES];
    index[INDEX_BYTES - index_len..].copy_from_slice(index_bytes);
    let index = LeafIndex::from_be_bytes(index);

    let value_len = reader.read_u8("value length")? as usize;
    let value = reader.read_exact(value_len, "value")?;
    let value = (!value.is_empty()).then(|| value.to_vec());

    let width = <D as Digest>::output_size();
    let mut levels = Vec::new();
    while !reader.is_empty() {
        let offset = reader.position();
        let count = reader.read_u8("level run")? as i8;
        if count == 0 {
            return Err(ProofEncodingError::EmptyRun { offset });
        }
        let run = count.unsigned_abs() as usize;
        if levels.len() + run > MAX_HEIGHT {
            return Err(ProofEncodingError::TooManyLevels {
                max: MAX_HEIGHT,
                actual: levels.len() + run,
            });
        }
        if count > 0 {
            for _ in 0..run {
                let hash = reader.read_exact(width, "level digest")?;
                levels.push(Some(digest::Output::<D>::clone_from_slice(hash)));
            }
        } else {
            levels.extend((0..run).map(|_| None));
        }
    }

    if levels.len() < INDEX_BYTES * 8 && index >> levels.len() != 0 {
        return Err(ProofEncodingError::IndexOutOfRange {
            index,
            levels: levels.len(),
        });
    }
    Ok(SparseMerkleProof::from_parts_unchecked(index, value, levels))
}

/// A cursor over the input bytes.
struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn position(&self) -> usize {
        self.offset
    }

    fn is_empty(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    fn read_exact(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], ProofEncodingError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(ProofEncodingError::UnexpectedEnd { field })?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn read_u8(&mut self, field: &'static str) -> Result<u8, ProofEncodingError> {
        Ok(self.read_exact(1, field)?[0])
    }
}

#[cfg(test)]
mod test {
    use blake2::Blake2b;
    use digest::consts::U32;

    use super::*;
    use crate::hashing::{hash_leaf, NodeHash};

    type Hasher = Blake2b<U32>;
    type Proof = SparseMerkleProof<Hasher>;

    fn level_hash(n: u8) -> NodeHash<Hasher> {
        hash_leaf::<Hasher>(n.into(), b"level")
    }

    fn round_trip(proof: &Proof) -> Proof {
        let bytes = proof.to_bytes().unwrap();
        Proof::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn empty_proof_layout() {
        let proof = Proof::empty(4).unwrap();
        let bytes = proof.to_bytes().unwrap();
        // index length 0, value length 0, one run of four absent levels
        assert_eq!(bytes, vec![0, 0, (-4i8) as u8]);
        assert_eq!(round_trip(&proof), proof);
    }

    #[test]
    fn mixed_levels_layout() {
        let levels = vec![Some(level_hash(0)), Some(level_hash(1)), None, None, None, Some(level_hash(5))];
        let err = Proof::new(0x1_02, Some(b"abc".to_vec()), levels.clone()).unwrap_err();
        // 0x102 needs 9 bits, which a height of 6 cannot address
        assert!(matches!(err, crate::SmtError::IndexOutOfRange { .. }));

        let proof = Proof::new(0b10_1101, Some(b"abc".to_vec()), levels).unwrap();
        let bytes = proof.to_bytes().unwrap();
        let mut expected = vec![1, 0b10_1101, 3, b'a', b'b', b'c', 2];
        expected.extend_from_slice(&level_hash(0));
        expected.extend_from_slice(&level_hash(1));
        expected.push((-3i8) as u8);
        expected.push(1);
        expected.extend_from_slice(&level_hash(5));
        assert_eq!(bytes, expected);
        assert_eq!(round_trip(&proof), proof);
    }

    #[test]
    fn round_trips() {
        let all_present = (0..127u8).map(|i| Some(level_hash(i))).collect::<Vec<_>>();
        let proof = Proof::new(LeafIndex::MAX >> 1, Some(vec![7u8; 255]), all_present).unwrap();
        assert_eq!(round_trip(&proof), proof);

        let all_absent = Proof::new(1 << 100, None, vec![None; 127]).unwrap();
        assert_eq!(round_trip(&all_absent), all_absent);

        let alternating = (0..16u8)
            .map(|i| (i % 2 == 0).then(|| level_hash(i)))
            .collect::<Vec<_>>();
        let proof = Proof::new(0xbeef, Some(b"x".to_vec()), alternating).unwrap();
        assert_eq!(round_trip(&proof), proof);

        let zero_height = Proof::new(0, Some(b"only".to_vec()), vec![]).unwrap();
        assert_eq!(zero_height.to_bytes().unwrap(), vec![0, 4, b'o', b'n', b'l', b'y']);
        assert_eq!(round_trip(&zero_height), zero_height);
    }

    #[test]
    fn oversized_values_cannot_be_encoded() {
        let proof = Proof::new(0, Some(vec![1u8; 256]), vec![None; 2]).unwrap();
        assert_eq!(
            proof.to_bytes().unwrap_err(),
            crate::SmtError::Encoding(ProofEncodingError::ValueTooLong(256))
        );
    }

    #[test]
    fn malformed_input() {
        let decode = |bytes: &[u8]| decode::<Hasher>(bytes).unwrap_err();
        assert_eq!(decode(&[]), ProofEncodingError::UnexpectedEnd {
            field: "index length"
        });
        assert_eq!(decode(&[17]), ProofEncodingError::InvalidLength {
            field: "index",
            len: 17
        });
        assert_eq!(decode(&[2, 0, 1, 0]), ProofEncodingError::NonCanonicalIndex);
        assert_eq!(decode(&[0, 3, b'a']), ProofEncodingError::UnexpectedEnd { field: "value" });
        assert_eq!(decode(&[0, 0, 0]), ProofEncodingError::EmptyRun { offset: 2 });
        assert_eq!(decode(&[0, 0, 1, 1, 2, 3]), ProofEncodingError::UnexpectedEnd {
            field: "level digest"
        });
        assert_eq!(decode(&[1, 4, 0, (-2i8) as u8]), ProofEncodingError::IndexOutOfRange {
            index: 4,
            levels: 2
        });
        let too_tall = [0, 0, (-127i8) as u8, (-1i8) as u8];
        assert_eq!(decode(&too_tall), ProofEncodingError::TooManyLevels { max: 127, actual: 128 });
    }

    #[test]
    fn empty_and_absent_values_are_equivalent() {
        let absent = Proof::new(3, None, vec![None; 2]).unwrap();
        let empty = Proof::new(3, Some(vec![]), vec![None; 2]).unwrap();
        assert_eq!(absent.to_bytes().unwrap(), empty.to_bytes().unwrap());
        assert_eq!(absent, empty);
    }
}
