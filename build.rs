//! Build script rendering the `dockerframe(1)` manual page from the CLI
//! definition.

use std::{fs, path::PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli.rs"]
mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = PathBuf::from("target/generated-man");
    fs::create_dir_all(&out_dir)?;

    let cmd = cli::Cli::command().version(env!("CARGO_PKG_VERSION"));
    let page = out_dir.join(format!("{}.1", cmd.get_name()));
    let mut buf = Vec::new();
    Man::new(cmd).render(&mut buf)?;
    fs::write(page, buf)?;

    Ok(())
}
