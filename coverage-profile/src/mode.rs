// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Counting semantics of the execution counts in a profile.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Counts are incremented atomically. Additive, like `Count`.
    Atomic,

    /// Counts are execution counts.
    Count,

    /// Counts are 0 or 1, recording only whether a block ran.
    Set,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Atomic => "atomic",
            Mode::Count => "count",
            Mode::Set => "set",
        }
    }

    /// Combine the execution counts of two blocks at the same location.
    ///
    /// Additive modes saturate at `u32::MAX` rather than wrap.
    pub fn combine(&self, kept: u32, next: u32) -> u32 {
        match self {
            Mode::Set => kept | next,
            Mode::Atomic | Mode::Count => kept.saturating_add(next),
        }
    }

    /// Returns `true` if combining `kept` and `next` clamps the result.
    pub fn saturates(&self, kept: u32, next: u32) -> bool {
        match self {
            Mode::Set => false,
            Mode::Atomic | Mode::Count => kept.checked_add(next).is_none(),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("unknown coverage mode `{0}`, expected one of `atomic`, `count`, `set`")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "atomic" => Ok(Mode::Atomic),
            "count" => Ok(Mode::Count),
            "set" => Ok(Mode::Set),
            _ => Err(UnknownMode(s.to_owned())),
        }
    }
}
