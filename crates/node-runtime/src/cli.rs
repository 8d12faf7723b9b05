//! # Interactive Prompt
//!
//! One command per line:
//!
//! | Command          | Effect                                        |
//! |------------------|-----------------------------------------------|
//! | `get <file>`     | flood a search; the first hit is downloaded   |
//! | `edit <file>`    | bump the version of an owned file             |
//! | `list`           | owned files (`+++`) and replicas (`-`)        |
//! | `refresh [file]` | bring invalid or expired replicas up to date  |
//! | `exit`           | stop the peer                                 |

use dn_peer::PeerApi;
use std::io;
use std::str::FromStr;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub const HELP: &str = "Commands: get <file>, edit <file>, list, refresh [file], exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get(String),
    Edit(String),
    List,
    Refresh(Option<String>),
    Help,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Invalid Command! {HELP}")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let arg = words.next().map(str::to_string);
        if words.next().is_some() {
            return Err(CommandError::Unknown(line.trim().to_string()));
        }

        match (verb, arg) {
            ("get", Some(file)) => Ok(Command::Get(file)),
            ("get", None) => Err(CommandError::Usage("get <file>")),
            ("edit", Some(file)) => Ok(Command::Edit(file)),
            ("edit", None) => Err(CommandError::Usage("edit <file>")),
            ("list", None) => Ok(Command::List),
            ("refresh", file) => Ok(Command::Refresh(file)),
            ("help", None) => Ok(Command::Help),
            ("exit" | "quit", None) => Ok(Command::Exit),
            _ => Err(CommandError::Unknown(line.trim().to_string())),
        }
    }
}

pub fn prompt(port: u16) -> String {
    format!("danutella-{port}> ")
}

/// Runs `command`, writing its output. Returns `false` once the user asked to exit.
pub async fn execute<S, W>(peer: &S, command: Command, out: &mut W) -> io::Result<bool>
where
    S: PeerApi + ?Sized,
    W: AsyncWrite + Unpin,
{
    let text = match command {
        Command::Get(file) => {
            let id = peer.get(&file).await;
            format!("Searching for {file} ({id})\n")
        }
        Command::Edit(file) => match peer.edit(&file).await {
            Ok(version) => format!("{file} is now version {version}\n"),
            Err(err) => format!("{err}\n"),
        },
        Command::List => {
            let listing = peer.list_files();
            if listing.entries.is_empty() {
                "No files\n".to_string()
            } else {
                listing.to_string()
            }
        }
        Command::Refresh(file) => peer.refresh(file.as_deref()).await.to_string(),
        Command::Help => format!("{HELP}\n"),
        Command::Exit => {
            out.write_all(b"Shutting down peer. Goodbye!\n").await?;
            out.flush().await?;
            return Ok(false);
        }
    };
    out.write_all(text.as_bytes()).await?;
    out.flush().await?;
    Ok(true)
}

/// Reads commands from `input` until `exit` or end of input.
pub async fn run<S, R, W>(peer: &S, input: R, out: &mut W) -> io::Result<()>
where
    S: PeerApi + ?Sized,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let prompt = prompt(peer.local_id().port());
    let mut lines = input.lines();
    loop {
        out.write_all(prompt.as_bytes()).await?;
        out.flush().await?;

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(command) => {
                if !execute(peer, command, out).await? {
                    return Ok(());
                }
            }
            Err(err) => {
                out.write_all(format!("{err}\n").as_bytes()).await?;
            }
        }
    }
}
