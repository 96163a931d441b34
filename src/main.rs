//! Dump tool for captured Docker Engine streaming responses.
//!
//! Multiplexed output is written to this process's stdout or stderr by
//! channel; JSON progress records are printed one per line.

mod cli;

use std::{
    fs::File,
    io::{self, Read, Write},
    process::ExitCode,
};

use clap::Parser;
use cli::{Cli, Format, StdinMode};
use dockerframe::{
    Body,
    BuildInfo,
    CreateImageInfo,
    DecoderConfig,
    DrainError,
    EventMessage,
    FrameStream,
    InnerFraming,
    MultiplexFrame,
    PushImageInfo,
    Record,
    StdinPolicy,
    StreamType,
    codec::FrameReader,
};

type Input = Body<Box<dyn Read + Send>>;

fn main() -> ExitCode {
    // Keep standard output for the decoded stream.
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, format = ?cli.format, "decoding failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), DrainError> {
    let reader: Box<dyn Read + Send> = match &cli.input {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin()),
    };
    let body = Body::new(reader);
    let config = DecoderConfig::default()
        .read_chunk_size(cli.chunk_size)
        .stdin_policy(match cli.stdin_policy {
            StdinMode::Drop => StdinPolicy::Drop,
            StdinMode::PassThrough => StdinPolicy::PassThrough,
        })
        .inner_framing(match cli.format {
            Format::WebsocketRaw => InnerFraming::Raw,
            _ => InnerFraming::Multiplexed,
        });

    match cli.format {
        Format::Multiplexed => dump_output(FrameStream::multiplexed(body, &config)),
        Format::Websocket | Format::WebsocketRaw => {
            dump_output(FrameStream::websocket(body, &config))
        }
        Format::Build => dump_records::<BuildInfo>(body, &config),
        Format::CreateImage => dump_records::<CreateImageInfo>(body, &config),
        Format::Push => dump_records::<PushImageInfo>(body, &config),
        Format::Events => dump_records::<EventMessage>(body, &config),
    }
}

fn dump_output<D>(mut stream: FrameStream<Input, D>) -> Result<(), DrainError>
where
    D: FrameReader<Item = MultiplexFrame>,
{
    stream.try_on_frame(|frame| {
        match frame.stream {
            StreamType::Stderr => io::stderr().write_all(&frame.payload)?,
            StreamType::Stdout | StreamType::Stdin => io::stdout().write_all(&frame.payload)?,
        }
        Ok(())
    });
    stream.wait()
}

fn dump_records<T: Record>(body: Input, config: &DecoderConfig) -> Result<(), DrainError> {
    let mut stream = FrameStream::<_, dockerframe::JsonStreamCodec<T>>::json(body, config);
    stream.try_on_frame(|record| {
        let line = serde_json::to_string(record)?;
        writeln!(io::stdout().lock(), "{line}")?;
        Ok(())
    });
    stream.wait()?;
    tracing::debug!(
        records = stream.frames_decoded(),
        record = T::KIND.record_name(),
        "records printed"
    );
    Ok(())
}
