// SPDX-FileCopyrightText: 2026 The metaresolvr Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::descriptor::parser::ParseError;
use crate::infohash::{InfoHash, InfoHashError};
use crate::swarm::SwarmError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt backlog row: {0}")]
    CorruptRow(#[from] InfoHashError),
}

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Swarm(#[from] SwarmError),

    #[error("descriptor file write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("resolved descriptor for {submitted} could not be decoded: {source}")]
    BadDescriptor {
        submitted: InfoHash,
        #[source]
        source: ParseError,
    },

    #[error("resolved descriptor derives {derived} but {submitted} was submitted")]
    InfoHashMismatch {
        submitted: InfoHash,
        derived: InfoHash,
    },
}

impl ResolverError {
    /// True for integrity violations that must abort the process instead of
    /// being retried on a later cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ResolverError::BadDescriptor { .. } | ResolverError::InfoHashMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let submitted = InfoHash::from([1u8; 20]);
        let derived = InfoHash::from([2u8; 20]);

        assert!(ResolverError::InfoHashMismatch { submitted, derived }.is_fatal());
        assert!(!ResolverError::Swarm(SwarmError::DescriptorUnavailable).is_fatal());
        assert!(!ResolverError::Store(StoreError::CorruptRow(
            InfoHashError::BadLength(3)
        ))
        .is_fatal());
    }
}
