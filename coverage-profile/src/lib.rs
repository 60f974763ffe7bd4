// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Parse and merge line-oriented block coverage profiles, as written by
//! `go test -coverprofile`.
//!
//! A process that re-executes itself leaves its coverage spread over one
//! profile per process. Folding each of them into a single summary
//! [`Profile`] restores the true coverage of the test run.

#[macro_use]
extern crate log;

use std::path::PathBuf;

use thiserror::Error;

pub mod block;
pub mod mode;
pub mod profile;
pub mod reader;
pub mod session;
pub mod writer;

pub use block::{Block, Location, SourceBlocks};
pub use mode::Mode;
pub use profile::{ModeMismatch, Profile};
pub use reader::{read_profile, ParseError};
pub use session::{MergeSession, OutputDir, ResolvePath};

/// Fatal failure to merge a coverage profile file.
///
/// A missing or empty profile file is not an error; see [`read_profile`].
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("unable to read coverage profile `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed coverage profile `{}`", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("unable to merge coverage profile `{}`", path.display())]
    ModeMismatch {
        path: PathBuf,
        #[source]
        source: ModeMismatch,
    },
}
