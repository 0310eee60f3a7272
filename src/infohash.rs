// SPDX-FileCopyrightText: 2026 The metaresolvr Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const INFO_HASH_LEN: usize = 20;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InfoHashError {
    #[error("info-hash must be {INFO_HASH_LEN} bytes, got {0}")]
    BadLength(usize),
    #[error("info-hash is not valid hex: {0}")]
    BadHex(String),
}

/// A v1 BitTorrent info-hash: the SHA-1 digest of the bencoded info dictionary.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InfoHash([u8; INFO_HASH_LEN]);

impl InfoHash {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InfoHashError> {
        let array: [u8; INFO_HASH_LEN] = bytes
            .try_into()
            .map_err(|_| InfoHashError::BadLength(bytes.len()))?;
        Ok(InfoHash(array))
    }

    pub fn from_hex(hex: &str) -> Result<Self, InfoHashError> {
        let decoded = HEXLOWER_PERMISSIVE
            .decode(hex.trim().as_bytes())
            .map_err(|_| InfoHashError::BadHex(hex.to_string()))?;
        Self::from_bytes(&decoded)
    }

    pub fn as_bytes(&self) -> &[u8; INFO_HASH_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        HEXLOWER.encode(&self.0)
    }
}

impl From<[u8; INFO_HASH_LEN]> for InfoHash {
    fn from(bytes: [u8; INFO_HASH_LEN]) -> Self {
        InfoHash(bytes)
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InfoHash({})", self.to_hex())
    }
}

impl FromStr for InfoHash {
    type Err = InfoHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
