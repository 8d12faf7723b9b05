//! # Frame Codec
//!
//! Every call on the wire is one frame: a 4-byte big-endian length followed
//! by the bincode encoding of a [`shared_types::PeerRequest`] or
//! [`shared_types::PeerResponse`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::ports::NetworkError;

/// Largest frame accepted (64 MiB).
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Encodes `value` as a complete frame, length prefix included.
pub fn encode_frame<T: Serialize>(value: &T) -> Result<Vec<u8>, NetworkError> {
    let body = bincode::serialize(value).map_err(|e| NetworkError::Codec(e.to_string()))?;
    if body.len() > MAX_FRAME_LEN {
        return Err(NetworkError::Codec(format!(
            "frame of {} bytes exceeds limit of {MAX_FRAME_LEN}",
            body.len()
        )));
    }
    let len = u32::try_from(body.len()).map_err(|e| NetworkError::Codec(e.to_string()))?;

    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Writes one frame and flushes.
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), NetworkError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode_frame(value)?;
    writer.write_all(&frame).await.map_err(map_io_error)?;
    writer.flush().await.map_err(map_io_error)
}

/// Reads one frame.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T, NetworkError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_bytes = [0u8; 4];
    reader
        .read_exact(&mut len_bytes)
        .await
        .map_err(map_io_error)?;
    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_FRAME_LEN {
        return Err(NetworkError::Codec(format!(
            "frame of {len} bytes exceeds limit of {MAX_FRAME_LEN}"
        )));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(map_io_error)?;
    bincode::deserialize(&body).map_err(|e| NetworkError::Codec(e.to_string()))
}

/// Classifies socket errors.
pub(crate) fn map_io_error(err: io::Error) -> NetworkError {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => NetworkError::ConnectionRefused,
        io::ErrorKind::TimedOut => NetworkError::Timeout,
        _ => NetworkError::Io(err.to_string()),
    }
}
