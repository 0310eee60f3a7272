// SPDX-FileCopyrightText: 2026 The metaresolvr Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

/// Per-generation tallies. All four only ever grow; the outer driver folds
/// them into lifetime totals between generations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    /// Never-attempted identifiers loaded this generation.
    pub new: u64,
    /// Previously-attempted identifiers loaded this generation.
    pub old: u64,
    pub resolved: u64,
    pub offloaded: u64,
}

impl Counters {
    pub fn absorb(&mut self, other: Counters) {
        self.new += other.new;
        self.old += other.old;
        self.resolved += other.resolved;
        self.offloaded += other.offloaded;
    }
}
