//! The dispatch engine: a single recursive, type-directed encode/decode
//! driven by a [`Descriptor`] tree and bound to a [`Transport`].
//!
//! There is exactly one recursive function per direction --
//! [`encode_value`] and [`decode_value`] -- and every compound kind
//! (container, variant, message) recurses back through the same function
//! for its children. [`Archive`] is the thin public facade over those two
//! functions that matches the external surface described in the design
//! doc (`encode_message`, `decode_blob`, `encode_field`, ...).
//!
//! Async recursion needs one level of boxing per call (the same trick
//! `#[async_trait]` performs under the hood) since a `Future` can't
//! directly contain itself.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use log::{trace, warn};

use crate::error::{Error, Result};
use crate::fixed::{read_fixed, write_fixed};
use crate::schema::{Descriptor, Param};
use crate::transport::Transport;
use crate::value::Value;
use crate::varint::{read_uvarint, write_uvarint};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Resolves the element/inner type a compound descriptor should use for
/// this call: `params[0]`, if it carries a type override, wins over the
/// descriptor's own declared type.
fn resolve_type<'a>(declared: &'a Descriptor, params: &'a [Param]) -> &'a Descriptor {
  match params.first() {
    Some(Param::Type(d)) => d,
    _ => declared,
  }
}

/// Resolves the fixed size a blob should use for this call, preferring a
/// `BlobSize` override in `params[0]` over the descriptor's own.
fn resolve_blob_size(declared: Option<usize>, params: &[Param]) -> Option<usize> {
  match params.first() {
    Some(Param::BlobSize(n)) => Some(*n),
    _ => declared,
  }
}

/// The params passed down to a compound type's element/field codec once
/// this call's own override (if any) has been consumed.
fn rest_params(params: &[Param]) -> &[Param] {
  if params.is_empty() { params } else { &params[1..] }
}

/// Encodes `value` under `desc`, writing to `t`. `params` carries any
/// type/size overrides inherited from the enclosing field (see
/// [`Param`]).
pub fn encode_value<'a>(
  t: &'a mut dyn Transport,
  desc: &'a Descriptor,
  params: &'a [Param],
  value: &'a Value,
) -> BoxFuture<'a, ()> {
  Box::pin(async move {
    if let Descriptor::Custom(hook) = desc {
      trace!("encode: custom hook");
      return hook.encode(t, value).await;
    }

    match desc {
      Descriptor::Varint => {
        let v = value
          .as_varint()
          .ok_or_else(|| Error::EncodeError("expected a varint value".into()))?;
        write_uvarint(t, v).await
      }

      Descriptor::Int { width, .. } => {
        let v = match value {
          Value::Int(v) => *v,
          _ => return Err(Error::EncodeError("expected an int value".into())),
        };
        write_fixed(t, *width, v).await
      }

      Descriptor::Blob { fixed } => {
        let fixed = resolve_blob_size(*fixed, params);
        let bytes =
          value.as_blob().ok_or_else(|| Error::EncodeError("expected a blob value".into()))?;
        match fixed {
          Some(size) if bytes.len() != size => {
            return Err(Error::EncodeError(format!(
              "fixed blob length mismatch: schema wants {size}, value has {}",
              bytes.len()
            )));
          }
          Some(_) => {}
          None => write_uvarint(t, bytes.len() as u128).await?,
        }
        t.write_all(bytes).await
      }

      Descriptor::Text => {
        let s = match value {
          Value::Text(s) => s,
          _ => return Err(Error::EncodeError("expected a text value".into())),
        };
        write_uvarint(t, s.len() as u128).await?;
        t.write_all(s.as_bytes()).await
      }

      Descriptor::Container { element, fixed } => {
        let items = value
          .as_container()
          .ok_or_else(|| Error::EncodeError("expected a container value".into()))?;
        let elem_ty = resolve_type(element, params);
        let rest = rest_params(params);

        match fixed {
          Some(n) if items.len() != *n => {
            return Err(Error::EncodeError(format!(
              "fixed container length mismatch: schema wants {n}, value has {}",
              items.len()
            )));
          }
          Some(_) => {}
          None => write_uvarint(t, items.len() as u128).await?,
        }

        trace!("encode: container of {} element(s)", items.len());
        for (i, item) in items.iter().enumerate() {
          encode_value(t, elem_ty, rest, item).await.map_err(|e| e.at_index(i))?;
        }
        Ok(())
      }

      Descriptor::Variant { alternatives } => {
        let (tag, inner) = match value {
          Value::Variant { tag, value } => (tag, value.as_ref()),
          _ => return Err(Error::EncodeError("variant has no active alternative".into())),
        };
        let alt = alternatives
          .iter()
          .find(|a| &a.tag == tag)
          .ok_or_else(|| Error::EncodeError(format!("no alternative declared for tag `{tag}`")))?;
        trace!("encode: variant tag `{tag}` (code {})", alt.code);
        write_uvarint(t, alt.code as u128).await?;
        encode_value(t, &alt.ty, &[], inner).await
      }

      Descriptor::Message { fields } => {
        let map = value
          .as_message()
          .ok_or_else(|| Error::EncodeError("expected a message value".into()))?;
        trace!("encode: message with {} declared field(s)", fields.len());
        for f in fields {
          let v = map
            .get(&f.name)
            .ok_or_else(|| Error::EncodeError(format!("missing field `{}`", f.name)))?;
          encode_value(t, &f.ty, &f.params, v).await.map_err(|e| e.at_field(&f.name))?;
        }
        Ok(())
      }

      Descriptor::Custom(_) => unreachable!("handled above"),
    }
  })
}

/// Decodes a value under `desc` from `t`. `existing` is the matching child
/// of a caller-supplied target, if any -- the element-reference
/// abstraction described in the design doc is realized here as "the slot
/// this call seeds itself from", plucked out by the caller before
/// recursing rather than passed as a live mutable reference (there is no
/// first-class mutable-reference facility in this codec; see the design
/// notes). Compound kinds pluck their own children's `existing` out of
/// this value before recursing, by field name or by index.
pub fn decode_value<'a>(
  t: &'a mut dyn Transport,
  desc: &'a Descriptor,
  params: &'a [Param],
  existing: Option<Value>,
) -> BoxFuture<'a, Value> {
  Box::pin(async move {
    if let Descriptor::Custom(hook) = desc {
      trace!("decode: custom hook");
      return hook.decode(t, existing).await;
    }

    match desc {
      Descriptor::Varint => Ok(Value::Varint(read_uvarint(t).await?)),

      Descriptor::Int { width, .. } => Ok(Value::Int(read_fixed(t, *width).await?)),

      Descriptor::Blob { fixed } => {
        let fixed = resolve_blob_size(*fixed, params);
        let size = match fixed {
          Some(s) => s,
          None => read_uvarint(t).await?.try_into().map_err(|_| {
            Error::DecodeError("blob length prefix exceeds addressable memory".into())
          })?,
        };
        let mut buf = vec![0u8; size];
        t.read_exact(&mut buf).await?;
        Ok(Value::Blob(Bytes::from(buf)))
      }

      Descriptor::Text => {
        let len: usize = read_uvarint(t)
          .await?
          .try_into()
          .map_err(|_| Error::DecodeError("text length prefix exceeds addressable memory".into()))?;
        let mut buf = vec![0u8; len];
        t.read_exact(&mut buf).await?;
        let s = String::from_utf8(buf)
          .map_err(|e| Error::DecodeError(format!("invalid UTF-8 in text field: {e}")))?;
        Ok(Value::Text(s))
      }

      Descriptor::Container { element, fixed } => {
        let elem_ty = resolve_type(element, params);
        let rest = rest_params(params);

        let existing_items = match existing {
          Some(Value::Container(items)) => Some(items),
          _ => None,
        };

        let count: usize = match fixed {
          Some(n) => *n,
          None => read_uvarint(t)
            .await?
            .try_into()
            .map_err(|_| Error::DecodeError("container length exceeds addressable memory".into()))?,
        };

        // §9 open question: a variable container decoded into a matching-length
        // existing target reuses its slots in place rather than replacing them.
        if let Some(items) = &existing_items {
          if items.len() != count {
            warn!(
              "container size mismatch: target has {} element(s), wire has {count}",
              items.len()
            );
            return Err(Error::DecodeError(format!(
              "container size mismatch: target has {} element(s), wire has {count}",
              items.len()
            )));
          }
        }

        trace!("decode: container of {count} element(s)");
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
          let seed = existing_items.as_ref().and_then(|items| items.get(i).cloned());
          let v = decode_value(t, elem_ty, rest, seed).await.map_err(|e| e.at_index(i))?;
          out.push(v);
        }
        Ok(Value::Container(out))
      }

      Descriptor::Variant { alternatives } => {
        let code = read_uvarint(t).await?;
        let alt = alternatives.iter().find(|a| a.code as u128 == code).ok_or_else(|| {
          warn!("unknown variant tag {code}");
          Error::DecodeError(format!("unknown variant tag {code}"))
        })?;
        let seed = match existing {
          Some(Value::Variant { tag, value }) if tag == alt.tag => Some(*value),
          _ => None,
        };
        trace!("decode: variant tag `{}` (code {code})", alt.tag);
        let inner = decode_value(t, &alt.ty, &[], seed).await?;
        Ok(Value::Variant { tag: alt.tag.clone(), value: Box::new(inner) })
      }

      Descriptor::Message { fields } => {
        // Seed `out` from the supplied target, if any, so that keys the
        // schema doesn't declare are left untouched rather than dropped
        // (Lifecycles: "any fields not covered by the schema are left
        // untouched").
        let mut out = match existing {
          Some(Value::Message(m)) => m,
          _ => HashMap::with_capacity(fields.len()),
        };
        trace!("decode: message with {} declared field(s)", fields.len());
        for f in fields {
          let seed = out.remove(&f.name);
          let v = decode_value(t, &f.ty, &f.params, seed).await.map_err(|e| e.at_field(&f.name))?;
          out.insert(f.name.clone(), v);
        }
        Ok(Value::Message(out))
      }

      Descriptor::Custom(_) => unreachable!("handled above"),
    }
  })
}

/// A dispatcher bound to one transport and one mode. This is a thin facade
/// over [`encode_value`]/[`decode_value`] matching the member-function
/// surface described in the design doc; the recursion itself lives in the
/// free functions so internal recursive calls don't need to re-borrow an
/// `Archive`.
pub struct Archive<'t> {
  transport: &'t mut dyn Transport,
  writing: bool,
}

impl<'t> Archive<'t> {
  pub fn new(transport: &'t mut dyn Transport, writing: bool) -> Archive<'t> {
    Archive { transport, writing }
  }

  pub fn is_writing(&self) -> bool { self.writing }

  pub async fn encode_message(&mut self, desc: &Descriptor, value: &Value) -> Result<()> {
    debug_assert!(matches!(desc, Descriptor::Message { .. }));
    encode_value(self.transport, desc, &[], value).await
  }

  pub async fn decode_message(&mut self, desc: &Descriptor, target: Option<Value>) -> Result<Value> {
    debug_assert!(matches!(desc, Descriptor::Message { .. }));
    decode_value(self.transport, desc, &[], target).await
  }

  pub async fn encode_blob(&mut self, desc: &Descriptor, value: &Value) -> Result<()> {
    encode_value(self.transport, desc, &[], value).await
  }

  pub async fn decode_blob(&mut self, desc: &Descriptor, target: Option<Value>) -> Result<Value> {
    decode_value(self.transport, desc, &[], target).await
  }

  pub async fn encode_field(
    &mut self,
    desc: &Descriptor,
    params: &[Param],
    value: &Value,
  ) -> Result<()> {
    encode_value(self.transport, desc, params, value).await
  }

  pub async fn decode_field(
    &mut self,
    desc: &Descriptor,
    params: &[Param],
    target: Option<Value>,
  ) -> Result<Value> {
    decode_value(self.transport, desc, params, target).await
  }
}

/// `encode-message(transport, value)` from the design doc's external
/// interface, for callers who don't need a held-open [`Archive`].
pub async fn encode_message(t: &mut dyn Transport, desc: &Descriptor, value: &Value) -> Result<()> {
  Archive::new(t, true).encode_message(desc, value).await
}

/// `decode-message(transport, message-descriptor, optional target)` from
/// the design doc's external interface.
pub async fn decode_message(
  t: &mut dyn Transport,
  desc: &Descriptor,
  target: Option<Value>,
) -> Result<Value> {
  Archive::new(t, false).decode_message(desc, target).await
}
