// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mode::Mode;

/// Source region of a coverage block.
///
/// Ordered by start position, then by end position.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Location {
    /// Line number of the block start (1-indexed).
    pub start_line: u32,

    /// Column number of the block start.
    pub start_col: u16,

    /// Line number of the block end.
    pub end_line: u32,

    /// Column number of the block end.
    pub end_col: u16,
}

impl Location {
    pub fn new(start_line: u32, start_col: u16, end_line: u32, end_col: u16) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}.{},{}.{}",
            self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}

/// Coverage data for a single code block.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Block {
    #[serde(flatten)]
    pub location: Location,

    /// Number of statements in the block.
    pub num_stmts: u16,

    /// Execution count, interpreted according to the profile [`Mode`].
    pub count: u32,
}

impl Block {
    pub fn new(location: Location, num_stmts: u16, count: u32) -> Self {
        Self {
            location,
            num_stmts,
            count,
        }
    }
}

/// Coverage blocks of a single source file.
///
/// Blocks keep their insertion order until collapsed.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SourceBlocks {
    blocks: Vec<Block>,
}

impl SourceBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn as_slice(&self) -> &[Block] {
        &self.blocks
    }

    /// Count of blocks executed at least once.
    pub fn covered(&self) -> usize {
        self.blocks.iter().filter(|b| b.count > 0).count()
    }

    /// Sort the blocks by location, then fold blocks at the same location
    /// into the first of them, combining counts per `mode`.
    ///
    /// The first-seen statement count of a location is kept. Idempotent.
    pub fn collapse(&mut self, mode: Mode) {
        // Stable, and ties on the start position are broken by the end
        // position, so equal locations are always adjacent.
        self.blocks.sort_by_key(|block| block.location);

        self.blocks.dedup_by(|next, kept| {
            if next.location != kept.location {
                return false;
            }

            if mode.saturates(kept.count, next.count) {
                warn!(
                    "execution count of block {} saturated at {}",
                    kept.location,
                    u32::MAX
                );
            }

            kept.count = mode.combine(kept.count, next.count);

            true
        });
    }
}

impl Extend<Block> for SourceBlocks {
    fn extend<T: IntoIterator<Item = Block>>(&mut self, iter: T) {
        self.blocks.extend(iter);
    }
}

impl From<Vec<Block>> for SourceBlocks {
    fn from(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }
}

impl IntoIterator for SourceBlocks {
    type Item = Block;
    type IntoIter = std::vec::IntoIter<Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.into_iter()
    }
}

impl<'a> IntoIterator for &'a SourceBlocks {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
