//! `voxreel probe` prints a media file's duration in seconds.

use std::path::PathBuf;

use clap::Args;

use voxreel_core::media::{FfprobeDurationProbe, SourceDurationProbe};

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Media file to probe
    pub file: PathBuf,
}

pub async fn run(args: ProbeArgs) -> anyhow::Result<()> {
    let probe = FfprobeDurationProbe::new();
    let duration = probe.probe(&args.file).await?;
    println!("{duration}");
    Ok(())
}
