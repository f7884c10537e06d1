//! pathtree – inspect compressed content path trees.
//!
//! ```bash
//! pathtree list content.bin            # every decoded path, one per line
//! pathtree check content.bin /a/b /c   # exit 0 when all paths are present
//! pathtree dump - < content.bin        # node-by-node structure from stdin
//! ```

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use pathtree::dictionary::PRODUCER_LEVEL;
use pathtree::{decode_detailed, DecodeOptions, Decoded, SplitStrategy};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pathtree", about = "Decode compressed content path trees", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every path in the tree
    List(Input),

    /// Check that every PATH is in the tree
    Check {
        #[command(flatten)]
        input: Input,

        /// Paths to look up, e.g. /content/dist/rhel/server/7/os
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the node structure of the tree
    Dump(Input),
}

#[derive(Args, Debug)]
struct Input {
    /// Blob to decode ("-" for stdin)
    file: PathBuf,

    /// Locate the payload by the bytes the inflater consumed
    #[arg(long, conflicts_with = "level")]
    consumed_input: bool,

    /// zlib level used to re-deflate the dictionary
    #[arg(long, default_value_t = PRODUCER_LEVEL, value_parser = clap::value_parser!(u32).range(0..=9))]
    level: u32,

    /// Refuse blobs declaring more nodes than this
    #[arg(long, default_value_t = pathtree::decoder::DEFAULT_MAX_NODES)]
    max_nodes: usize,

    /// Fail if the decoded edges form a cycle
    #[arg(long)]
    reject_cycles: bool,
}

impl Input {
    fn options(&self) -> DecodeOptions {
        let split = if self.consumed_input {
            SplitStrategy::ConsumedInput
        } else {
            SplitStrategy::Recompress { level: self.level }
        };
        DecodeOptions {
            split,
            max_nodes: self.max_nodes,
            reject_cycles: self.reject_cycles,
        }
    }

    fn decode(&self) -> Result<Decoded, String> {
        let blob = read_blob(&self.file)
            .map_err(|e| format!("{}: {}", self.file.display(), e))?;
        decode_detailed(&blob, &self.options())
            .map_err(|e| format!("{}: {}", self.file.display(), e))
    }
}

fn read_blob(path: &Path) -> io::Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(path)
    }
}

fn run(command: &Command) -> Result<bool, String> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let write_err = |e: io::Error| format!("write failed: {e}");

    match command {
        Command::List(input) => {
            let decoded = input.decode()?;
            let paths = decoded
                .tree
                .paths()
                .map_err(|e| format!("{}: {}", input.file.display(), e))?;
            for path in paths {
                writeln!(out, "{path}").map_err(write_err)?;
            }
        }
        Command::Check { input, paths } => {
            let decoded = input.decode()?;
            let mut all_present = true;
            for path in paths {
                if !decoded.tree.contains(path) {
                    writeln!(out, "missing: {path}").map_err(write_err)?;
                    all_present = false;
                }
            }
            out.flush().map_err(write_err)?;
            return Ok(all_present);
        }
        Command::Dump(input) => {
            let decoded = input.decode()?;
            write!(out, "{}", decoded.tree).map_err(write_err)?;
            tracing::info!(
                names = decoded.names,
                nodes = decoded.node_count,
                edges = decoded.stats.edges,
                bits = decoded.stats.bits_consumed,
                exhausted = decoded.stats.exhausted,
                "decoded"
            );
        }
    }
    out.flush().map_err(write_err)?;
    Ok(true)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pathtree={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(&cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(msg) => {
            eprintln!("pathtree: {msg}");
            ExitCode::from(2)
        }
    }
}
