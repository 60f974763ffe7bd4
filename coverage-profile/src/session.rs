// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::{Path, PathBuf};

use crate::profile::Profile;
use crate::reader::read_profile;
use crate::ProfileError;

/// Maps the logical name of a profile to the file it is stored in.
pub trait ResolvePath {
    fn resolve(&self, name: &Path) -> PathBuf;
}

impl<F> ResolvePath for F
where
    F: Fn(&Path) -> PathBuf,
{
    fn resolve(&self, name: &Path) -> PathBuf {
        self(name)
    }
}

/// Directory that relative profile names are placed in, like the
/// `-test.outputdir` flag of `go test`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OutputDir {
    dir: Option<PathBuf>,
}

impl OutputDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();

        // An empty directory means "unset", as it does for `go test`.
        if dir.as_os_str().is_empty() {
            return Self::default();
        }

        Self { dir: Some(dir) }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }
}

impl From<Option<PathBuf>> for OutputDir {
    fn from(dir: Option<PathBuf>) -> Self {
        dir.map(OutputDir::new).unwrap_or_default()
    }
}

impl ResolvePath for OutputDir {
    fn resolve(&self, name: &Path) -> PathBuf {
        let dir = match &self.dir {
            Some(dir) => dir,
            None => return name.to_owned(),
        };

        if name.as_os_str().is_empty() || name.has_root() || name.is_absolute() {
            return name.to_owned();
        }

        dir.join(name)
    }
}

/// Merges coverage profile files, one after another, into a single summary.
///
/// The first file merged fixes the counting mode of the session; usually it
/// is the profile of the main process, followed by those of its re-executed
/// children. A failed merge ends the session: data merged before the failing
/// file is kept, but the session should not be continued.
#[derive(Debug, Default)]
pub struct MergeSession<R = OutputDir> {
    resolver: R,
    summary: Profile,
    merged: Vec<PathBuf>,
}

impl MergeSession<OutputDir> {
    pub fn new(output_dir: OutputDir) -> Self {
        Self::with_resolver(output_dir)
    }
}

impl<R: ResolvePath> MergeSession<R> {
    pub fn with_resolver(resolver: R) -> Self {
        Self {
            resolver,
            summary: Profile::new(),
            merged: vec![],
        }
    }

    /// Read the profile named `name` and merge it into the summary.
    ///
    /// Returns `false` without touching the summary if the profile file is
    /// missing or empty.
    pub fn merge_file(&mut self, name: impl AsRef<Path>) -> Result<bool, ProfileError> {
        let path = self.resolver.resolve(name.as_ref());

        let profile = match read_profile(&path)? {
            Some(profile) => profile,
            None => {
                info!("skipping missing or empty coverage profile {}", path.display());
                return Ok(false);
            }
        };

        debug!(
            "merging coverage profile {} ({} blocks)",
            path.display(),
            profile.total_blocks()
        );

        if let Err(source) = self.summary.merge(profile) {
            return Err(ProfileError::ModeMismatch { path, source });
        }

        self.merged.push(path);

        Ok(true)
    }

    /// Merge each profile in turn, stopping at the first failure.
    ///
    /// Returns the number of profiles actually merged.
    pub fn merge_files<I>(&mut self, names: I) -> Result<usize, ProfileError>
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        let mut count = 0;

        for name in names {
            if self.merge_file(name)? {
                count += 1;
            }
        }

        Ok(count)
    }

    /// Resolved paths of the profile files merged so far.
    pub fn merged(&self) -> &[PathBuf] {
        &self.merged
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn summary(&self) -> &Profile {
        &self.summary
    }

    pub fn finish(self) -> Profile {
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_output_dir_unset() {
        let output_dir = OutputDir::default();
        assert_eq!(output_dir.resolve(Path::new("cover.out")), PathBuf::from("cover.out"));

        let output_dir = OutputDir::new("");
        assert_eq!(output_dir.dir(), None);
        assert_eq!(output_dir.resolve(Path::new("cover.out")), PathBuf::from("cover.out"));
    }

    #[test]
    fn test_output_dir_relative() {
        let output_dir = OutputDir::new("out");
        assert_eq!(
            output_dir.resolve(Path::new("cover.out")),
            Path::new("out").join("cover.out")
        );
        assert_eq!(
            output_dir.resolve(Path::new("child/cover.out")),
            Path::new("out").join("child/cover.out")
        );
    }

    #[test]
    fn test_output_dir_absolute() {
        let output_dir = OutputDir::new("out");

        let absolute = std::env::temp_dir().join("cover.out");
        assert_eq!(output_dir.resolve(&absolute), absolute);
    }

    #[test]
    fn test_output_dir_empty_name() {
        let output_dir = OutputDir::new("out");
        assert_eq!(output_dir.resolve(Path::new("")), PathBuf::new());
    }

    #[test]
    fn test_output_dir_from_option() {
        assert_eq!(OutputDir::from(None), OutputDir::default());
        assert_eq!(
            OutputDir::from(Some(PathBuf::from("out"))),
            OutputDir::new("out")
        );
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |name: &Path| Path::new("/profiles").join(name);
        assert_eq!(
            resolver.resolve(Path::new("a.out")),
            PathBuf::from("/profiles/a.out")
        );
    }
}
