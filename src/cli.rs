//! Command line interface for the `dockerframe` dump tool.
//!
//! Decodes a captured Docker Engine response body and prints what the
//! engine streamed.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Framing of the captured body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Multiplexed attach, exec or logs output.
    Multiplexed,
    /// Websocket attach carrying multiplexed output.
    Websocket,
    /// Websocket attach from a TTY container.
    WebsocketRaw,
    /// `POST /build` progress.
    Build,
    /// `POST /images/create` progress.
    CreateImage,
    /// `POST /images/{name}/push` progress.
    Push,
    /// `GET /events` messages.
    Events,
}

/// Handling of stdin-tagged frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum StdinMode {
    /// Discard them.
    #[default]
    Drop,
    /// Print them to standard output.
    PassThrough,
}

/// Command line arguments for the `dockerframe` binary.
#[derive(Debug, Parser)]
#[command(
    name = "dockerframe",
    version,
    about = "Decode a captured Docker Engine streaming response"
)]
pub struct Cli {
    /// Framing of the input.
    #[arg(short, long, value_enum)]
    pub format: Format,

    /// What to do with stdin frames in multiplexed input.
    #[arg(long, value_enum, default_value_t = StdinMode::Drop)]
    pub stdin_policy: StdinMode,

    /// Bytes requested per read.
    #[arg(long, default_value_t = 8192)]
    pub chunk_size: usize,

    /// Captured body; standard input when omitted.
    pub input: Option<PathBuf>,
}
