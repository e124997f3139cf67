// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Serde support for [`SparseMerkleProof`]. Proofs are (de)serialized through their compact byte format, as a hex
//! string for human-readable formats and as raw bytes otherwise.

use std::fmt;

use digest::Digest;
use serde::{
    de::{self, Visitor},
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use tari_utilities::hex;

use crate::SparseMerkleProof;

impl<D: Digest> Serialize for SparseMerkleProof<D> {
    fn serialize<S>(&self, ser: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        let bytes = self.to_bytes().map_err(serde::ser::Error::custom)?;
        if ser.is_human_readable() {
            ser.serialize_str(&hex::to_hex(&bytes))
        } else {
            ser.serialize_bytes(&bytes)
        }
    }
}

impl<'de, D: Digest> Deserialize<'de> for SparseMerkleProof<D> {
    fn deserialize<DE>(de: DE) -> Result<Self, DE::Error>
    where DE: Deserializer<'de> {
        struct ProofVisitor;

        impl<'de> Visitor<'de> for ProofVisitor {
            type Value = Vec<u8>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an encoded sparse Merkle proof")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where E: de::Error {
                hex::from_hex(v).map_err(E::custom)
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where E: de::Error {
                Ok(v.to_vec())
            }

            fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Self::Value, E>
            where E: de::Error {
                Ok(v)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where A: de::SeqAccess<'de> {
                let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(64));
                while let Some(b) = seq.next_element()? {
                    bytes.push(b);
                }
                Ok(bytes)
            }
        }

        let bytes = if de.is_human_readable() {
            de.deserialize_str(ProofVisitor)?
        } else {
            de.deserialize_bytes(ProofVisitor)?
        };
        SparseMerkleProof::from_bytes(&bytes).map_err(de::Error::custom)
    }
}
