//! The schema model: a closed set of type-kind descriptors, built once by
//! the caller and then driven repeatedly by the [`archive`](crate::archive)
//! dispatch engine.
//!
//! A descriptor is schema *data*, not a Rust type -- the same [`Descriptor`]
//! tree is reused across every encode/decode call for a given message kind,
//! the way a protobuf `FileDescriptorProto` would be, except there is no
//! wire-level type tag: the reader must already hold the matching
//! descriptor (see the crate's non-goals around self-description).

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::value::Value;

/// One schema node. See §3 of the design doc for the wire encoding each
/// kind implies.
#[derive(Clone)]
pub enum Descriptor {
  /// Unsigned variable-length integer.
  Varint,
  /// Fixed-width little-endian integer.
  Int { width: u8, signed: bool },
  /// A byte blob, fixed-size or length-prefixed.
  Blob { fixed: Option<usize> },
  /// Length-prefixed UTF-8 text.
  Text,
  /// A homogeneous sequence, fixed-size or length-prefixed.
  Container { element: Arc<Descriptor>, fixed: Option<usize> },
  /// A tagged union. Alternatives are tried in declared order only when
  /// searching for a decoded wire tag; encoding looks the active tag up by
  /// name.
  Variant { alternatives: Vec<Alternative> },
  /// An ordered sequence of named fields.
  Message { fields: Vec<FieldDesc> },
  /// A descriptor that fully replaces dispatch with caller-supplied
  /// encode/decode logic. See [`Hook`].
  Custom(Arc<dyn Hook>),
}

/// One alternative of a [`Descriptor::Variant`].
#[derive(Clone)]
pub struct Alternative {
  pub tag: String,
  pub code: u64,
  pub ty: Arc<Descriptor>,
}

/// One field of a [`Descriptor::Message`].
#[derive(Clone)]
pub struct FieldDesc {
  pub name: String,
  pub ty: Arc<Descriptor>,
  pub params: Vec<Param>,
}

/// A parameter threaded down into a compound type's element codec.
///
/// For a container, `params[0]` (if present) overrides the declared
/// element type, and `params[1..]` are handed to that element's own
/// codec call; the same rule applies to a blob descriptor nested under a
/// field that wants to override its size. This is how a single `Container`
/// descriptor for "a list of varints" can be reused as "a list of
/// `TxinToKey`" by a field that supplies a different element type as its
/// first param.
#[derive(Clone)]
pub enum Param {
  /// Override the compound type's declared element/inner type.
  Type(Arc<Descriptor>),
  /// Override a blob's declared fixed size.
  BlobSize(usize),
}

/// A fully custom encode/decode implementation for one descriptor node,
/// bypassing the default per-kind wire rules entirely. Used for schema
/// nodes with irregular framing or cross-field invariants the closed kind
/// set can't express -- the core ships the mechanism, no implementations.
#[async_trait]
pub trait Hook: Send + Sync {
  async fn encode(&self, t: &mut dyn Transport, value: &Value) -> Result<()>;
  async fn decode(&self, t: &mut dyn Transport, existing: Option<Value>) -> Result<Value>;
}

impl Descriptor {
  pub fn varint() -> Arc<Descriptor> { Arc::new(Descriptor::Varint) }

  pub fn int(width: u8, signed: bool) -> Result<Arc<Descriptor>> {
    match width {
      1 | 2 | 4 | 8 => Ok(Arc::new(Descriptor::Int { width, signed })),
      w => Err(Error::SchemaError(format!("unsupported fixed-int width {w}"))),
    }
  }

  pub fn fixed_blob(size: usize) -> Arc<Descriptor> {
    Arc::new(Descriptor::Blob { fixed: Some(size) })
  }

  pub fn blob() -> Arc<Descriptor> { Arc::new(Descriptor::Blob { fixed: None }) }

  pub fn text() -> Arc<Descriptor> { Arc::new(Descriptor::Text) }

  pub fn container(element: Arc<Descriptor>, fixed: Option<usize>) -> Arc<Descriptor> {
    Arc::new(Descriptor::Container { element, fixed })
  }

  /// Builds a variant descriptor, rejecting duplicate variant codes up
  /// front (§4.9.1) rather than relying on the documented
  /// first-declared-wins fallback at decode time.
  pub fn variant(alternatives: Vec<Alternative>) -> Result<Arc<Descriptor>> {
    let mut seen = HashSet::new();
    for alt in &alternatives {
      if !seen.insert(alt.code) {
        return Err(Error::SchemaError(format!(
          "duplicate variant code {} (tag `{}`)",
          alt.code, alt.tag
        )));
      }
    }
    Ok(Arc::new(Descriptor::Variant { alternatives }))
  }

  pub fn message(fields: Vec<FieldDesc>) -> Arc<Descriptor> {
    Arc::new(Descriptor::Message { fields })
  }

  pub fn kind_name(&self) -> &'static str {
    match self {
      Descriptor::Varint => "varint",
      Descriptor::Int { .. } => "int",
      Descriptor::Blob { .. } => "blob",
      Descriptor::Text => "text",
      Descriptor::Container { .. } => "container",
      Descriptor::Variant { .. } => "variant",
      Descriptor::Message { .. } => "message",
      Descriptor::Custom(_) => "custom",
    }
  }
}

impl Alternative {
  pub fn new(tag: impl Into<String>, code: u64, ty: Arc<Descriptor>) -> Alternative {
    Alternative { tag: tag.into(), code, ty }
  }
}

impl FieldDesc {
  pub fn new(name: impl Into<String>, ty: Arc<Descriptor>) -> FieldDesc {
    FieldDesc { name: name.into(), ty, params: Vec::new() }
  }

  pub fn with_params(name: impl Into<String>, ty: Arc<Descriptor>, params: Vec<Param>) -> FieldDesc {
    FieldDesc { name: name.into(), ty, params }
  }
}
