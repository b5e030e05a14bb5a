use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::CommandFactory;
use clap_mangen::Man;

use spendwatch::cli::Cli;

/// Writes the man page to the path given as first argument, or `spendwatch.1`.
fn main() -> anyhow::Result<()> {
    let out_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_PKG_NAME"), ".1")));

    let man = Man::new(Cli::command());
    let mut file = File::create(&out_path)
        .with_context(|| format!("Creating man page {}", out_path.display()))?;
    man.render(&mut file)
        .with_context(|| format!("Rendering man page {}", out_path.display()))?;
    eprintln!("Generated man page at {}", out_path.display());
    Ok(())
}
