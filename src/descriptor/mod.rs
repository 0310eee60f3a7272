// SPDX-FileCopyrightText: 2026 The metaresolvr Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod parser;

use crate::infohash::InfoHash;

use serde::{Deserialize, Serialize};

use sha1::{Digest, Sha1};

/// A fully resolved metadata descriptor, i.e. the contents of a .torrent file.
///
/// The canonical identity of a descriptor is the SHA-1 digest of its bencoded
/// info dictionary, which must match the info-hash the swarm lookup was
/// submitted with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Descriptor {
    // Not present in the bencode source; populated by the parser from the
    // re-encoded raw info dictionary.
    #[serde(skip)]
    pub info_dict_bencode: Vec<u8>,

    pub info: Info,
    pub announce: Option<String>,

    #[serde(rename = "announce-list", default)]
    pub announce_list: Option<Vec<Vec<String>>>,

    #[serde(rename = "creation date", default)]
    pub creation_date: Option<i64>,

    #[serde(default)]
    pub comment: Option<String>,

    #[serde(rename = "created by", default)]
    pub created_by: Option<String>,

    #[serde(default)]
    pub encoding: Option<String>,
}

impl Descriptor {
    /// Derives the info-hash identifying this descriptor.
    pub fn info_hash(&self) -> InfoHash {
        let digest: [u8; 20] = Sha1::digest(&self.info_dict_bencode).into();
        InfoHash::from(digest)
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn file_list(&self) -> Vec<(Vec<String>, u64)> {
        if !self.info.files.is_empty() {
            // Multi-file case
            self.info
                .files
                .iter()
                .map(|f| (f.path.clone(), f.length as u64))
                .collect()
        } else {
            // Single-file case: the descriptor name is the file name
            vec![(vec![self.info.name.clone()], self.info.length as u64)]
        }
    }

    pub fn num_files(&self) -> usize {
        if self.info.files.is_empty() {
            1
        } else {
            self.info.files.len()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Info {
    #[serde(rename = "piece length")]
    pub piece_length: i64,

    #[serde(with = "serde_bytes")]
    #[serde(default)]
    pub pieces: Vec<u8>,

    #[serde(default)]
    pub private: Option<i64>,

    #[serde(default)]
    pub files: Vec<InfoFile>,

    pub name: String,

    #[serde(default)]
    pub length: i64,

    #[serde(default)]
    pub md5sum: Option<String>,
}

impl Info {
    pub fn total_length(&self) -> i64 {
        // Single file
        if self.length > 0 {
            return self.length;
        }

        // Multi-file
        self.files.iter().map(|f| f.length).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct InfoFile {
    pub length: i64,

    #[serde(default)]
    pub md5sum: Option<String>,

    pub path: Vec<String>,

    #[serde(default)]
    pub attr: Option<String>,
}
