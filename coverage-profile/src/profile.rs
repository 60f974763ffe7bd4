// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::{Block, SourceBlocks};
use crate::mode::Mode;

/// Coverage profile data, either read from a single profile file or the
/// summary of a merge session.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Profile {
    /// Counting mode. Unset only for a summary nothing was merged into yet.
    pub mode: Option<Mode>,

    /// Block coverage, indexed by source file name.
    pub sources: BTreeMap<String, SourceBlocks>,
}

/// Attempt to merge profiles with different counting modes.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("expected mode `{expected}`, got mode `{found}`")]
pub struct ModeMismatch {
    pub expected: Mode,
    pub found: Mode,
}

impl Profile {
    /// Empty summary profile, without a mode.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: Mode) -> Self {
        Self {
            mode: Some(mode),
            sources: BTreeMap::new(),
        }
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn sources(&self) -> impl Iterator<Item = (&str, &SourceBlocks)> {
        self.sources.iter().map(|(name, blocks)| (name.as_str(), blocks))
    }

    pub fn source(&self, name: &str) -> Option<&SourceBlocks> {
        self.sources.get(name)
    }

    /// Append a block to the named source, in insertion order.
    pub fn insert(&mut self, name: impl Into<String>, block: Block) {
        self.sources.entry(name.into()).or_default().push(block);
    }

    pub fn is_empty(&self) -> bool {
        self.sources.values().all(SourceBlocks::is_empty)
    }

    /// Total count of blocks across all sources.
    pub fn total_blocks(&self) -> usize {
        self.sources.values().map(SourceBlocks::len).sum()
    }

    /// Total count of blocks executed at least once, across all sources.
    pub fn covered_blocks(&self) -> usize {
        self.sources.values().map(SourceBlocks::covered).sum()
    }

    /// Merge `other` into `self`.
    ///
    /// Adopts the mode of `other` if `self` has none yet. Blocks of each
    /// source in `other` are appended to those of `self`, then the source
    /// is collapsed, so blocks at the same location are combined.
    ///
    /// On a mode mismatch, `self` is left unmodified.
    pub fn merge(&mut self, other: Profile) -> Result<(), ModeMismatch> {
        let mode = match (self.mode, other.mode) {
            (_, None) => {
                // Nothing was read, so there is nothing to merge.
                return Ok(());
            }
            (None, Some(found)) => found,
            (Some(expected), Some(found)) if expected != found => {
                return Err(ModeMismatch { expected, found });
            }
            (Some(expected), Some(_)) => expected,
        };

        self.mode = Some(mode);

        for (name, blocks) in other.sources {
            debug!("merging {} coverage blocks of `{}`", blocks.len(), name);

            let summary = self.sources.entry(name).or_default();
            summary.extend(blocks);
            summary.collapse(mode);
        }

        Ok(())
    }

    /// Collapse every source, without merging anything.
    ///
    /// Does nothing while the profile has no mode.
    pub fn collapse(&mut self) {
        if let Some(mode) = self.mode {
            for blocks in self.sources.values_mut() {
                blocks.collapse(mode);
            }
        }
    }
}
