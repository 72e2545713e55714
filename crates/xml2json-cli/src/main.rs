use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use xml2json::{convert_reader, ConvertOptions};

/// Reads one XML document from stdin and prints it as a single line of JSON.
#[derive(Debug, Parser)]
#[command(name = "xml2json", version, about)]
struct Args {}

fn main() -> ExitCode {
    let _args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let options = ConvertOptions {
        source_name: Some("<stdin>".to_string()),
        ..ConvertOptions::default()
    };
    let json = convert_reader(io::stdin().lock(), &options).context("failed to convert stdin")?;
    debug!(bytes = json.len(), "conversion finished");

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}").context("failed to write stdout")?;
    stdout.flush().context("failed to flush stdout")?;
    Ok(())
}
