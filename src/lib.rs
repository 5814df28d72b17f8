//! A streaming binary codec for a schema-driven, Monero-style
//! serialization format.
//!
//! Given a declarative [`Descriptor`] tree -- messages with ordered named
//! fields, tagged variants, fixed- and variable-size blobs, homogeneous
//! containers, and fixed- and variable-width integers -- this crate
//! encodes in-memory [`Value`]s to a byte stream and decodes them back,
//! preserving equality.
//!
//! There is no wire-level type tag and no framing beyond what the schema
//! itself implies: the reader must already hold the matching descriptor.
//! This is deliberate -- the intended use is a fixed, already-agreed
//! schema (the original motivating case is Monero's wire formats), not a
//! self-describing interchange format.
//!
//! # Layout
//!
//! - [`transport`] -- the byte-stream contract the rest of the crate is
//!   driven against, plus an in-memory implementation.
//! - [`varint`] / [`fixed`] -- the two leaf integer codecs.
//! - [`value`] -- the runtime value representation every decoded (or
//!   to-be-encoded) value is built from.
//! - [`schema`] -- the descriptor tree: the type-kind union schemas are
//!   built out of.
//! - [`archive`] -- the recursive dispatch engine plus the `Archive`
//!   facade described in the external interface.
//! - [`error`] -- the error taxonomy shared by every fallible operation.
//!
//! # Example
//!
//! ```
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! use xmr_transfer::archive::{decode_message, encode_message};
//! use xmr_transfer::schema::{Descriptor, FieldDesc};
//! use xmr_transfer::transport::MemoryTransport;
//! use xmr_transfer::value::Value;
//! use std::collections::HashMap;
//!
//! let desc = Descriptor::message(vec![FieldDesc::new("height", Descriptor::varint())]);
//! let value = Value::Message(HashMap::from([("height".to_string(), Value::Varint(42))]));
//!
//! let mut t = MemoryTransport::new();
//! encode_message(&mut t, &desc, &value).await.unwrap();
//! assert_eq!(t.as_slice(), &[0x2a]);
//!
//! let mut t = MemoryTransport::from_vec(t.into_inner());
//! let decoded = decode_message(&mut t, &desc, None).await.unwrap();
//! assert_eq!(decoded, value);
//! # });
//! ```

pub mod archive;
pub mod error;
pub mod fixed;
pub mod schema;
pub mod transport;
pub mod value;
pub mod varint;

pub use archive::{decode_message, encode_message, Archive};
pub use error::{Error, Result};
pub use schema::{Alternative, Descriptor, FieldDesc, Hook, Param};
pub use transport::{MemoryTransport, Transport};
pub use value::Value;
