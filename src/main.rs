use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use lotofacil_ingest::handle;

#[derive(Parser, Debug)]
#[command(name = "lotofacil-ingest")]
#[command(author, version, about = "Uploads new Lotofácil draw results to the results API")]
struct Cli {
    /// Trigger event JSON file, or `-` for stdin
    #[arg(long)]
    event: Option<PathBuf>,

    /// Read the results table from this file instead of the configured source
    #[arg(long)]
    table: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log format: text or json
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    log_format: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, &cli.log_format);

    let event = read_event(cli.event.as_ref())?;
    let response = handle(&event, cli.table.as_deref()).await;

    println!("{}", serde_json::to_string(&response)?);

    Ok(if response.status_code == 200 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing(verbose: bool, format: &str) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    if format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_event(path: Option<&PathBuf>) -> Result<Value> {
    let raw = match path {
        None => return Ok(Value::Object(Default::default())),
        Some(path) if path.as_os_str() == "-" => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read trigger event from stdin")?;
            raw
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read trigger event {}", path.display()))?,
    };

    serde_json::from_str(&raw).context("trigger event is not valid JSON")
}
