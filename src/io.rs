//! Cancellable stream primitives shared by every codec.

use crate::{Result, SerializationError};
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Upper bound on buffer or element capacity reserved up front from a decoded count.
pub(crate) const MAX_PREALLOCATION: usize = 4096;

/// Output stream handed to serializers.
pub type Sink<'a> = dyn AsyncWrite + Unpin + Send + 'a;

/// Input stream handed to serializers.
pub type Source<'a> = dyn AsyncRead + Unpin + Send + 'a;

/// Writes all of `data`, racing the write against `token`.
pub async fn write_all(stream: &mut Sink<'_>, data: &[u8], token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        return Err(SerializationError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(SerializationError::Cancelled),
        res = stream.write_all(data) => res.map_err(SerializationError::from),
    }
}

/// Reads exactly `len` bytes.
///
/// A stream that ends early yields [`SerializationError::InsufficientData`].
pub async fn read_exact(
    stream: &mut Source<'_>,
    len: usize,
    token: &CancellationToken,
) -> Result<BytesMut> {
    if token.is_cancelled() {
        return Err(SerializationError::Cancelled);
    }
    let mut buf = BytesMut::zeroed(len);
    if len == 0 {
        return Ok(buf);
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(SerializationError::Cancelled),
        res = stream.read_exact(&mut buf[..]) => match res {
            Ok(_) => Ok(buf),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(SerializationError::InsufficientData)
            }
            Err(e) => Err(e.into()),
        },
    }
}

/// Reads a length-prefixed payload of `len` bytes.
///
/// The buffer grows as bytes arrive, so a forged length cannot force a large
/// allocation. Fewer than `len` bytes yields [`SerializationError::InsufficientData`].
pub async fn read_payload(
    stream: &mut Source<'_>,
    len: usize,
    token: &CancellationToken,
) -> Result<Vec<u8>> {
    if token.is_cancelled() {
        return Err(SerializationError::Cancelled);
    }
    let mut buf = Vec::with_capacity(len.min(MAX_PREALLOCATION));
    if len == 0 {
        return Ok(buf);
    }
    let mut limited = AsyncReadExt::take(&mut *stream, len as u64);
    let read = tokio::select! {
        biased;
        _ = token.cancelled() => return Err(SerializationError::Cancelled),
        res = limited.read_to_end(&mut buf) => res?,
    };
    if read < len {
        return Err(SerializationError::InsufficientData);
    }
    Ok(buf)
}

/// Reads a single byte.
pub async fn read_u8(stream: &mut Source<'_>, token: &CancellationToken) -> Result<u8> {
    let buf = read_exact(stream, 1, token).await?;
    Ok(buf[0])
}
