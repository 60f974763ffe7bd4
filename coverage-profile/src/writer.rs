// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::{self, Write};

use crate::profile::Profile;

impl Profile {
    /// Write the profile in the line-oriented text format it is read from.
    ///
    /// Sources are written in path order, blocks in their current order. A
    /// profile without a mode has nothing to write.
    pub fn write(&self, mut writer: impl Write) -> io::Result<()> {
        let mode = match self.mode {
            Some(mode) => mode,
            None => return Ok(()),
        };

        writeln!(writer, "mode: {mode}")?;

        for (name, blocks) in &self.sources {
            for block in blocks {
                writeln!(
                    writer,
                    "{}:{} {} {}",
                    name, block.location, block.num_stmts, block.count
                )?;
            }
        }

        writer.flush()
    }

    pub fn to_text(&self) -> String {
        let mut data = vec![];

        // Writing into a `Vec` can't fail.
        let _ = self.write(&mut data);

        // Every piece written is a `str`.
        String::from_utf8_lossy(&data).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    use crate::block::{Block, Location};
    use crate::mode::Mode;
    use crate::profile::Profile;

    #[test]
    fn test_write_empty() {
        assert_eq!(Profile::new().to_text(), "");
        assert_eq!(Profile::with_mode(Mode::Set).to_text(), "mode: set\n");
    }

    #[test]
    fn test_write_sources_in_path_order() {
        let mut profile = Profile::with_mode(Mode::Count);
        profile.insert("pkg/z.go", Block::new(Location::new(3, 14, 5, 2), 2, 0));
        profile.insert("pkg/a.go", Block::new(Location::new(12, 5, 14, 2), 3, 7));
        profile.insert("pkg/a.go", Block::new(Location::new(15, 1, 15, 30), 1, 1));

        let expected = "\
mode: count
pkg/a.go:12.5,14.2 3 7
pkg/a.go:15.1,15.30 1 1
pkg/z.go:3.14,5.2 2 0
";
        assert_eq!(profile.to_text(), expected);
    }

    #[test]
    fn test_write_then_parse() -> Result<()> {
        let text = "\
mode: atomic
C:\\src\\main.go:1.13,3.2 1 4
C:\\src\\main.go:5.20,8.2 2 0
lib/util.go:7.1,7.40 1 4294967295
";
        let profile = Profile::parse(text.as_bytes())?.expect("profile");
        assert_eq!(profile.to_text(), text);

        let reparsed = Profile::parse(profile.to_text().as_bytes())?;
        assert_eq!(reparsed, Some(profile));

        Ok(())
    }
}
