//! The runtime value representation.
//!
//! The schema is data, not Rust types, so there is no one-Rust-type-per-
//! message-type the way a `#[derive(MessageRead, MessageWrite)]` style
//! crate would generate. Instead every decoded or to-be-encoded value,
//! whatever its schema kind, is one of these variants, and structural
//! equality (`#[derive(PartialEq)]`) gives round-trip checks for free.

use std::collections::HashMap;

use bytes::Bytes;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  /// A varint-typed field. Wide enough to hold values well beyond any
  /// fixed-width integer (see scenario S4 in the tests).
  Varint(u128),
  /// A fixed-width integer field. The raw bit pattern; signed
  /// interpretation is applied by the caller via [`crate::fixed::as_signed`]
  /// when the descriptor says so.
  Int(u64),
  /// A blob: either fixed-size or length-prefixed, indistinguishable once
  /// in memory. `Bytes` rather than `Vec<u8>` so that seeding a nested
  /// decode from an existing target (see [`crate::archive`]) is a refcount
  /// bump rather than a copy.
  Blob(Bytes),
  /// A length-prefixed UTF-8 string.
  Text(String),
  /// A homogeneous sequence.
  Container(Vec<Value>),
  /// A tagged union: exactly one active alternative, named by its
  /// declared tag.
  Variant { tag: String, value: Box<Value> },
  /// An ordered-field message. Stored as a name -> value map; wire order
  /// comes from the schema at encode time, not from this map's iteration
  /// order. Fields absent from the schema but present here are ignored at
  /// encode time (schema is authoritative).
  Message(HashMap<String, Value>),
}

impl Value {
  pub fn empty_message() -> Value { Value::Message(HashMap::new()) }

  pub fn as_varint(&self) -> Option<u128> {
    match self {
      Value::Varint(v) => Some(*v),
      _ => None,
    }
  }

  pub fn as_blob(&self) -> Option<&[u8]> {
    match self {
      Value::Blob(b) => Some(b.as_ref()),
      _ => None,
    }
  }

  pub fn as_container(&self) -> Option<&[Value]> {
    match self {
      Value::Container(c) => Some(c),
      _ => None,
    }
  }

  pub fn as_message(&self) -> Option<&HashMap<String, Value>> {
    match self {
      Value::Message(m) => Some(m),
      _ => None,
    }
  }
}
