//! The byte-stream contract the archive is driven against.
//!
//! A transport has exactly two operations: fill a buffer of a known length,
//! or accept a run of bytes. Both are suspension points, so the trait is
//! async. No framing, no buffering guarantees beyond "what you wrote is what
//! comes back out in order" are implied by the trait itself.

use crate::error::{Error, Result};
use async_trait::async_trait;

#[async_trait]
pub trait Transport: Send {
  /// Fill `buf` completely from the stream. Fails with
  /// [`Error::EndOfStream`] if the stream runs out first.
  async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

  /// Write all of `buf` to the stream.
  async fn write_all(&mut self, buf: &[u8]) -> Result<()>;
}

/// The canonical transport: a growable in-memory buffer with a read cursor.
///
/// Reads consume from the cursor forward; writes append to the end. This is
/// what every test in this crate round-trips through, and it is also the
/// natural way to pre-serialize a message before handing it to a real
/// socket.
#[derive(Debug, Default, Clone)]
pub struct MemoryTransport {
  buf: Vec<u8>,
  pos: usize,
}

impl MemoryTransport {
  pub fn new() -> Self { Self::default() }

  /// Wraps an existing buffer for reading from the start.
  pub fn from_vec(buf: Vec<u8>) -> Self { MemoryTransport { buf, pos: 0 } }

  /// The bytes written so far (or remaining to be read, plus what's already
  /// been consumed).
  pub fn into_inner(self) -> Vec<u8> { self.buf }

  pub fn as_slice(&self) -> &[u8] { &self.buf }

  /// How many unread bytes remain.
  pub fn remaining(&self) -> usize { self.buf.len() - self.pos }
}

#[async_trait]
impl Transport for MemoryTransport {
  async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
    if self.remaining() < buf.len() {
      return Err(Error::EndOfStream);
    }
    let start = self.pos;
    let end = start + buf.len();
    buf.copy_from_slice(&self.buf[start..end]);
    self.pos = end;
    Ok(())
  }

  async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
    self.buf.extend_from_slice(buf);
    Ok(())
  }
}

#[cfg(feature = "tokio-io")]
mod tokio_io {
  use super::*;
  use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

  /// Adapts any tokio async byte stream into a [`Transport`], so the archive
  /// can be pointed at a real socket without a bespoke wrapper.
  pub struct TokioTransport<S>(pub S);

  #[async_trait]
  impl<S> Transport for TokioTransport<S>
  where
    S: AsyncRead + AsyncWrite + Unpin + Send,
  {
    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
      self.0.read_exact(buf).await.map_err(|_| Error::EndOfStream)?;
      Ok(())
    }

    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
      self.0.write_all(buf).await.map_err(|e| Error::WriteError(e.to_string()))
    }
  }
}

#[cfg(feature = "tokio-io")]
pub use tokio_io::TokioTransport;
