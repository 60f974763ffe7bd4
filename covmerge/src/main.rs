// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use coverage_profile::{MergeSession, OutputDir, Profile, ResolvePath};

/// Merge the coverage profiles of a test process and its re-executed
/// children into a single profile.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Directory that relative profile and output paths are placed in.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Where to write the merged profile. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Profile)]
    format: OutputFormat,

    /// Fail if the main process profile is missing or empty.
    #[arg(long)]
    require_main: bool,

    /// Profile of the main process, followed by those of its children.
    #[arg(required = true, num_args = 1..)]
    profiles: Vec<PathBuf>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    /// Line-oriented coverage profile text.
    Profile,
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    run(args)
}

fn run(args: Args) -> Result<()> {
    let output_dir = OutputDir::from(args.output_dir);
    let output = args.output.as_deref().map(|path| output_dir.resolve(path));

    let summary = merge(output_dir, &args.profiles, args.require_main)?;

    if summary.mode().is_none() {
        log::warn!("no coverage profile data found");
    }

    match output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("unable to create output file: {}", path.display()))?;
            write_summary(&summary, args.format, BufWriter::new(file))
                .with_context(|| format!("unable to write output file: {}", path.display()))?;
            log::info!("wrote merged coverage profile to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            write_summary(&summary, args.format, stdout.lock())?;
        }
    }

    Ok(())
}

fn merge(output_dir: OutputDir, profiles: &[PathBuf], require_main: bool) -> Result<Profile> {
    let mut session = MergeSession::new(output_dir);

    let (main, children) = match profiles.split_first() {
        Some(split) => split,
        None => bail!("no coverage profiles given"),
    };

    if !session.merge_file(main)? && require_main {
        bail!(
            "main coverage profile is missing or empty: {}",
            session.resolver().resolve(main).display()
        );
    }

    let merged = session.merge_files(children)?;
    log::debug!(
        "merged {} of {} re-executed child profiles",
        merged,
        children.len()
    );

    Ok(session.finish())
}

fn write_summary(summary: &Profile, format: OutputFormat, mut writer: impl Write) -> Result<()> {
    match format {
        OutputFormat::Profile => summary.write(&mut writer)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, summary)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }

    Ok(())
}
