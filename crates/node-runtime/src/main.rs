//! # Danutella Node
//!
//! `node-runtime` starts a peer configured from `DN_CONFIG` and the
//! environment, then reads commands from stdin.
//!
//! `node-runtime generate-fixtures <DIR> <PEERS> <FILES>` writes sample
//! owned files instead.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use node_runtime::{cli, fixtures, load_config, NodeRuntime};

/// Danutella peer: flooding search with push/pull replica consistency
#[derive(Parser, Debug)]
#[command(name = "node-runtime")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    task: Option<Task>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Task {
    /// Write sample owned files for a set of peers
    GenerateFixtures {
        /// Root directory; each peer gets `peerN/myfiles` under it
        dir: PathBuf,
        /// Number of peers
        peers: u32,
        /// Files per peer, sized 1 KiB up to this many KiB
        files: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Log to stderr so the prompt on stdout stays readable
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.task {
        None => run_node().await,
        Some(Task::GenerateFixtures { dir, peers, files }) => {
            generate_fixtures(&dir, peers, files).await
        }
    }
}

async fn run_node() -> Result<()> {
    let config = load_config()?;
    let mut runtime = NodeRuntime::new(config);
    runtime.start().await?;

    let peer = runtime.peer();
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    println!("{}", cli::HELP);

    tokio::select! {
        result = cli::run(peer.as_ref(), stdin, &mut stdout) => {
            result.context("Prompt failed")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            info!("Interrupted");
        }
    }

    runtime.shutdown().await;
    Ok(())
}

async fn generate_fixtures(dir: &Path, peers: u32, files: u32) -> Result<()> {
    let written = fixtures::generate(dir, peers, files)
        .await
        .with_context(|| format!("Failed to write fixtures under {}", dir.display()))?;
    println!("Wrote {} files under {}", written.len(), dir.display());
    Ok(())
}
