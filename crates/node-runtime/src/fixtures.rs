//! # Fixture Generator
//!
//! Lays out sample peers for a local test network:
//! `peer<N>/myfiles/p<N>-<K>k.txt`, each file about `K` KiB, plus an empty
//! `peer<N>/otherfiles/`.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Writes `files` owned files for each of `peers` peers under `root`.
/// Peers are numbered from 0, file sizes from 1 KiB.
pub async fn generate(root: &Path, peers: u32, files: u32) -> io::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for peer in 0..peers {
        let owned = root.join(format!("peer{peer}")).join("myfiles");
        fs::create_dir_all(&owned).await?;
        fs::create_dir_all(root.join(format!("peer{peer}")).join("otherfiles")).await?;

        for kib in 1..=files {
            let path = owned.join(format!("p{peer}-{kib}k.txt"));
            fs::write(&path, contents(peer, kib)).await?;
            written.push(path);
        }
    }
    info!(root = %root.display(), peers, files = written.len(), "Fixtures generated");
    Ok(written)
}

/// One sentence repeated to fill (at most) `kib` KiB.
fn contents(peer: u32, kib: u32) -> String {
    let line = format!("This is peer {peer}'s file of size {kib}K. ");
    let target = kib as usize * 1024;
    line.repeat(target / line.len())
}
