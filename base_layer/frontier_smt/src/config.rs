// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use config::Config;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{bit_utils::MAX_HEIGHT, SmtError};

/// Configuration for a frontier sparse Merkle tree
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SparseMerkleTreeConfig {
    /// The height of the tree. The tree holds up to `2^height` leaves and every proof carries `height` levels.
    /// Default: 32
    pub height: usize,
}

impl Default for SparseMerkleTreeConfig {
    fn default() -> Self {
        Self { height: 32 }
    }
}

impl SparseMerkleTreeConfig {
    pub fn main_key_prefix() -> &'static str {
        "frontier_smt"
    }

    /// Loads the configuration from the `frontier_smt` section of `config`. Missing fields, or a missing section, take
    /// their default values.
    pub fn load_from(config: &Config) -> Result<Self, ConfigurationError> {
        let loaded = match config.get::<Self>(Self::main_key_prefix()) {
            Ok(loaded) => loaded,
            Err(config::ConfigError::NotFound(_)) => Self::default(),
            Err(err) => return Err(err.into()),
        };
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.height > MAX_HEIGHT {
            return Err(ConfigurationError::Invalid(SmtError::InvalidHeight(self.height)));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Could not read the frontier SMT configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid frontier SMT configuration: {0}")]
    Invalid(#[from] SmtError),
}
