// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::mem;
use std::num::ParseIntError;
use std::path::Path;
use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

use crate::block::{Block, Location};
use crate::mode::{Mode, UnknownMode};
use crate::profile::Profile;
use crate::ProfileError;

lazy_static::lazy_static! {
    static ref MODE_LINE: Regex = Regex::new(r"^mode: ([a-z]+)$").unwrap();

    // The path is greedy, so it may itself contain `:`, as Windows paths do.
    static ref BLOCK_LINE: Regex = Regex::new(
        r"^(.+):([0-9]+)\.([0-9]+),([0-9]+)\.([0-9]+) ([0-9]+) ([0-9]+)$"
    ).unwrap();
}

/// Malformed coverage profile content.
///
/// Line numbers are 1-indexed.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line_number}: {line:?} doesn't match expected `mode: <atomic|count|set>` line format")]
    ModeLine { line_number: usize, line: String },

    #[error("line {line_number}: invalid mode line")]
    UnknownMode {
        line_number: usize,
        #[source]
        source: UnknownMode,
    },

    #[error("line {line_number}: {line:?} doesn't match expected `<path>:<line>.<col>,<line>.<col> <stmts> <count>` block line format")]
    BlockLine { line_number: usize, line: String },

    #[error("line {line_number}: {field} `{value}` is not a valid {width}")]
    Number {
        line_number: usize,
        field: &'static str,
        value: String,
        width: &'static str,
        #[source]
        source: ParseIntError,
    },

    #[error("unable to read line {line_number}")]
    Io {
        line_number: usize,
        #[source]
        source: io::Error,
    },
}

impl ParseError {
    pub fn line_number(&self) -> usize {
        match self {
            ParseError::ModeLine { line_number, .. }
            | ParseError::UnknownMode { line_number, .. }
            | ParseError::BlockLine { line_number, .. }
            | ParseError::Number { line_number, .. }
            | ParseError::Io { line_number, .. } => *line_number,
        }
    }
}

/// Read the coverage profile file at `path`.
///
/// Returns `Ok(None)` if there is no such file, or if it is empty. Any
/// other failure to open or read the file is an error, as is content that
/// isn't a well-formed profile.
pub fn read_profile(path: impl AsRef<Path>) -> Result<Option<Profile>, ProfileError> {
    let path = path.as_ref();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(None);
        }
        Err(source) => {
            return Err(ProfileError::Io {
                path: path.to_owned(),
                source,
            });
        }
    };

    Profile::parse(BufReader::new(file)).map_err(|err| match err {
        ParseError::Io { source, .. } => ProfileError::Io {
            path: path.to_owned(),
            source,
        },
        source => ProfileError::Parse {
            path: path.to_owned(),
            source,
        },
    })
}

impl Profile {
    /// Parse profile text. The blocks of each source are left unsorted.
    ///
    /// Returns `Ok(None)` when there is no text at all, not even a mode line.
    pub fn parse(reader: impl BufRead) -> Result<Option<Self>, ParseError> {
        let mut lines = reader
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line));

        let (line_number, line) = match lines.next() {
            Some(first) => first,
            None => return Ok(None),
        };
        let line = line.map_err(|source| ParseError::Io {
            line_number,
            source,
        })?;
        let mode = parse_mode_line(line_number, &line)?;

        let mut profile = Profile::with_mode(mode);

        // Profile writers emit the blocks of a source contiguously, so collect
        // each run of blocks locally and only look up the source when the
        // path changes.
        let mut run = SourceRun::default();

        for (line_number, line) in lines {
            let line = line.map_err(|source| ParseError::Io {
                line_number,
                source,
            })?;
            let (name, block) = parse_block_line(line_number, &line)?;

            if name != run.name {
                run.flush(&mut profile);
                run.name = name.to_owned();
            }

            run.blocks.push(block);
        }

        run.flush(&mut profile);

        Ok(Some(profile))
    }
}

#[derive(Default)]
struct SourceRun {
    name: String,
    blocks: Vec<Block>,
}

impl SourceRun {
    // A source seen again after another one continues its earlier blocks.
    fn flush(&mut self, profile: &mut Profile) {
        if self.blocks.is_empty() {
            return;
        }

        profile
            .sources
            .entry(mem::take(&mut self.name))
            .or_default()
            .extend(self.blocks.drain(..));
    }
}

fn parse_mode_line(line_number: usize, line: &str) -> Result<Mode, ParseError> {
    let captures = MODE_LINE
        .captures(line)
        .ok_or_else(|| ParseError::ModeLine {
            line_number,
            line: line.to_owned(),
        })?;

    captures[1]
        .parse()
        .map_err(|source| ParseError::UnknownMode {
            line_number,
            source,
        })
}

fn parse_block_line(line_number: usize, line: &str) -> Result<(&str, Block), ParseError> {
    let captures = BLOCK_LINE
        .captures(line)
        .ok_or_else(|| ParseError::BlockLine {
            line_number,
            line: line.to_owned(),
        })?;

    // Unwrap-safe: every group of the expression participates in a match.
    let field = |index| captures.get(index).unwrap().as_str();

    let location = Location {
        start_line: parse_number(line_number, "start line", field(2))?,
        start_col: parse_number(line_number, "start column", field(3))?,
        end_line: parse_number(line_number, "end line", field(4))?,
        end_col: parse_number(line_number, "end column", field(5))?,
    };
    let num_stmts = parse_number(line_number, "statement count", field(6))?;
    let count = parse_number(line_number, "execution count", field(7))?;

    Ok((field(1), Block::new(location, num_stmts, count)))
}

fn parse_number<T>(line_number: usize, field: &'static str, value: &str) -> Result<T, ParseError>
where
    T: FromStr<Err = ParseIntError>,
{
    value.parse().map_err(|source| ParseError::Number {
        line_number,
        field,
        value: value.to_owned(),
        width: std::any::type_name::<T>(),
        source,
    })
}
