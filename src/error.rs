use thiserror::Error;

/// Everything that can go wrong while driving an [`Archive`](crate::archive::Archive)
/// over a [`Transport`](crate::transport::Transport).
///
/// There is no rollback: once any of these is returned, the transport's
/// cursor is left wherever the last completed read or write landed, and any
/// caller-supplied decode target may be partially populated.
#[derive(Debug, Error)]
pub enum Error {
  /// The transport had fewer bytes available than a read requested.
  #[error("end of stream")]
  EndOfStream,

  /// The transport failed to accept a write.
  #[error("write error: {0}")]
  WriteError(String),

  /// The bytes on the wire don't satisfy the schema: bad UTF-8, an unknown
  /// variant tag, a container whose length disagrees with its target, an
  /// oversized varint, and so on.
  #[error("decode error: {0}")]
  DecodeError(String),

  /// The value being encoded doesn't satisfy the schema: a missing message
  /// field, a variant with no active alternative, a blob whose length
  /// disagrees with its fixed size.
  #[error("encode error: {0}")]
  EncodeError(String),

  /// The descriptor itself is inconsistent: an unknown kind, duplicate
  /// variant codes.
  #[error("schema error: {0}")]
  SchemaError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
  /// Prefixes a decode/encode/schema error with the container index it
  /// occurred at, leaving transport-level errors (`EndOfStream`,
  /// `WriteError`) untouched since those already carry no schema context
  /// to annotate.
  pub fn at_index(self, i: usize) -> Error {
    match self {
      Error::DecodeError(msg) => Error::DecodeError(format!("[{i}]: {msg}")),
      Error::EncodeError(msg) => Error::EncodeError(format!("[{i}]: {msg}")),
      other => other,
    }
  }

  /// Prefixes a decode/encode/schema error with the message field it
  /// occurred in.
  pub fn at_field(self, name: &str) -> Error {
    match self {
      Error::DecodeError(msg) => Error::DecodeError(format!(".{name}: {msg}")),
      Error::EncodeError(msg) => Error::EncodeError(format!(".{name}: {msg}")),
      other => other,
    }
  }
}
