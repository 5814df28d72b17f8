//! End-to-end scenarios built out of a small Monero-flavored schema: a
//! `TxIn` variant with a no-op `TxinGen` alternative and a `TxinToKey`
//! alternative carrying an amount, a list of key offsets, and a fixed
//! 32-byte key image. These are exactly the shapes `monero-serialize`
//! round-trips for Monero's transaction inputs; the concrete schema
//! stays a test fixture here, the codec doesn't know anything about
//! Monero.

use std::collections::HashMap;

use pretty_assertions::assert_eq;

use xmr_transfer::archive::{decode_message, encode_message};
use xmr_transfer::schema::{Alternative, Descriptor, FieldDesc};
use xmr_transfer::transport::MemoryTransport;
use xmr_transfer::value::Value;
use xmr_transfer::Error;

fn message(fields: &[(&str, Value)]) -> Value {
  Value::Message(fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
}

fn txin_to_key_descriptor() -> std::sync::Arc<Descriptor> {
  Descriptor::message(vec![
    FieldDesc::new("amount", Descriptor::varint()),
    FieldDesc::new("key_offsets", Descriptor::container(Descriptor::varint(), None)),
    FieldDesc::new("k_image", Descriptor::fixed_blob(32)),
  ])
}

fn txin_descriptor() -> std::sync::Arc<Descriptor> {
  Descriptor::variant(vec![
    Alternative::new("gen", 0xff, Descriptor::message(vec![FieldDesc::new("height", Descriptor::varint())])),
    Alternative::new("to_key", 0x02, txin_to_key_descriptor()),
  ])
  .unwrap()
}

#[tokio::test]
async fn txin_gen_round_trips() {
  let desc = txin_descriptor();
  let value = Value::Variant {
    tag: "gen".into(),
    value: Box::new(message(&[("height", Value::Varint(42))])),
  };

  let mut t = MemoryTransport::new();
  xmr_transfer::archive::encode_value(&mut t, &desc, &[], &value).await.unwrap();
  // uvarint(0xff) is two bytes, then the single varint field.
  assert_eq!(t.as_slice(), &[0xff, 0x01, 0x2a]);

  let mut t = MemoryTransport::from_vec(t.into_inner());
  let decoded = xmr_transfer::archive::decode_value(&mut t, &desc, &[], None).await.unwrap();
  assert_eq!(decoded, value);
}

#[tokio::test]
async fn txin_to_key_round_trips_through_the_variant() {
  let desc = txin_descriptor();
  let k_image: Vec<u8> = (0u8..32).collect();
  let value = Value::Variant {
    tag: "to_key".into(),
    value: Box::new(message(&[
      ("amount", Value::Varint(123)),
      (
        "key_offsets",
        Value::Container(vec![Value::Varint(1), Value::Varint(2), Value::Varint(3), Value::Varint(1u128 << 76)]),
      ),
      ("k_image", Value::Blob(bytes::Bytes::from(k_image))),
    ])),
  };

  let mut t = MemoryTransport::new();
  xmr_transfer::archive::encode_value(&mut t, &desc, &[], &value).await.unwrap();
  let mut t = MemoryTransport::from_vec(t.into_inner());
  let decoded = xmr_transfer::archive::decode_value(&mut t, &desc, &[], None).await.unwrap();
  assert_eq!(decoded, value);
}

#[tokio::test]
async fn a_list_of_txin_to_key_round_trips_and_reuses_a_supplied_target() {
  let element = txin_to_key_descriptor();
  let desc = Descriptor::container(element, None);

  let k1: Vec<u8> = (0u8..32).collect();
  let k2: Vec<u8> = (32u8..64).collect();
  let value = Value::Container(vec![
    message(&[
      ("amount", Value::Varint(1)),
      ("key_offsets", Value::Container(vec![Value::Varint(7)])),
      ("k_image", Value::Blob(bytes::Bytes::from(k1))),
    ]),
    message(&[
      ("amount", Value::Varint(2)),
      ("key_offsets", Value::Container(vec![])),
      ("k_image", Value::Blob(bytes::Bytes::from(k2))),
    ]),
  ]);

  let mut t = MemoryTransport::new();
  xmr_transfer::archive::encode_value(&mut t, &desc, &[], &value).await.unwrap();

  // Decode into a preallocated target of the right shape and length, per
  // the in-place reuse invariant: decode(encode(v), T, target=t) leaves t
  // equal to v.
  let target = Value::Container(vec![
    message(&[
      ("amount", Value::Varint(0)),
      ("key_offsets", Value::Container(vec![Value::Varint(0)])),
      ("k_image", Value::Blob(bytes::Bytes::new())),
    ]),
    message(&[
      ("amount", Value::Varint(0)),
      ("key_offsets", Value::Container(vec![])),
      ("k_image", Value::Blob(bytes::Bytes::new())),
    ]),
  ]);

  let mut t = MemoryTransport::from_vec(t.into_inner());
  let decoded = xmr_transfer::archive::decode_value(&mut t, &desc, &[], Some(target)).await.unwrap();
  assert_eq!(decoded, value);
}

#[tokio::test]
async fn unknown_variant_tag_is_a_decode_error_not_a_panic() {
  let desc = txin_descriptor();
  // A variant code (0x7f) that's declared by neither alternative.
  let mut t = MemoryTransport::from_vec(vec![0x7f]);
  let err = xmr_transfer::archive::decode_value(&mut t, &desc, &[], None).await.unwrap_err();
  assert!(matches!(err, Error::DecodeError(_)));
}

#[tokio::test]
async fn top_level_message_surface_round_trips_a_single_input() {
  let desc = txin_to_key_descriptor();
  let value = message(&[
    ("amount", Value::Varint(5_000_000)),
    ("key_offsets", Value::Container(vec![Value::Varint(10), Value::Varint(20)])),
    ("k_image", Value::Blob(bytes::Bytes::from(vec![0x42u8; 32]))),
  ]);

  let mut t = MemoryTransport::new();
  encode_message(&mut t, &desc, &value).await.unwrap();
  let mut t = MemoryTransport::from_vec(t.into_inner());
  let decoded = decode_message(&mut t, &desc, None).await.unwrap();
  assert_eq!(decoded, value);
}

#[tokio::test]
async fn fixed_blob_short_stream_is_end_of_stream() {
  let desc = txin_to_key_descriptor();
  // amount=0, key_offsets=[] encode fine, but only 10 bytes follow for the
  // 32-byte key image.
  let mut t = MemoryTransport::new();
  xmr_transfer::varint::write_uvarint(&mut t, 0).await.unwrap();
  xmr_transfer::varint::write_uvarint(&mut t, 0).await.unwrap();
  let mut bytes = t.into_inner();
  bytes.extend_from_slice(&[0u8; 10]);
  let mut t = MemoryTransport::from_vec(bytes);

  let err = decode_message(&mut t, &desc, None).await.unwrap_err();
  assert!(matches!(err, Error::EndOfStream));
}

#[tokio::test]
async fn missing_field_is_an_encode_error_keyed_by_field_name() {
  let desc = txin_to_key_descriptor();
  let incomplete = Value::Message(HashMap::from([("amount".to_string(), Value::Varint(1))]));
  let mut t = MemoryTransport::new();
  let err = encode_message(&mut t, &desc, &incomplete).await.unwrap_err();
  match err {
    Error::EncodeError(msg) => assert!(msg.contains("key_offsets")),
    other => panic!("expected EncodeError, got {other:?}"),
  }
}
