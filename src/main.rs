//! `kvstore` — a stdio-driven harness for the store.
//!
//! This binary is explicitly a stand-in for the out-of-scope network
//! transport (§1, §4.13 of the design doc): it reads one request line at a
//! time from stdin, feeds it to the dispatcher, and writes the reply
//! followed by a newline to stdout. It exists so the crate's behavior can
//! be driven and observed end-to-end (`echo "BSET a 1" | kvstore`) — it is
//! not a production server, and nothing about framing, concurrency, or
//! connection handling here is meant to generalize to one.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use kvstore_core::{Config, CONFIG_FILE_NAME};
use kvstore_dispatch::Dispatcher;
use kvstore_registry::EngineRegistry;

/// In-memory key/value store with pluggable indexing engines.
#[derive(Debug, Parser)]
#[command(name = "kvstore", version, about)]
struct Cli {
    /// Path to a `kvstore.toml` config file. Defaults to looking for
    /// `kvstore.toml` in the current directory; a missing file falls back
    /// to built-in defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the skip list engine's RNG seed from the config file.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Increase log verbosity; repeat for more (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(seed) = cli.seed {
        config.skiplist.seed = seed;
    }

    tracing::info!(max_tokens = config.max_tokens, "starting kvstore harness");
    let mut registry = EngineRegistry::new(&config);
    let dispatcher = Dispatcher::new();

    run_stdio_loop(&dispatcher, &mut registry, config.max_tokens);

    registry.shutdown();
    tracing::info!("kvstore harness exiting");
    ExitCode::SUCCESS
}

fn load_config(path: Option<&std::path::Path>) -> kvstore_core::Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::load(std::path::Path::new(CONFIG_FILE_NAME)),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "kvstore=info",
        1 => "kvstore=debug,kvstore_dispatch=debug",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

/// Feed stdin to the dispatcher one line at a time, writing each reply
/// (plus a trailing newline) to stdout. Returns once stdin reaches EOF.
fn run_stdio_loop(dispatcher: &Dispatcher, registry: &mut EngineRegistry, max_tokens: usize) {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                tracing::error!(error = %err, "failed to read stdin line");
                break;
            }
        };
        let reply = dispatcher.dispatch(registry, &line, max_tokens);
        if writeln!(out, "{reply}").is_err() {
            tracing::error!("failed to write reply to stdout");
            break;
        }
    }
}
