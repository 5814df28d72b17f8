//! Unsigned variable-length integers: 7 bits of payload per byte, high bit
//! set while more bytes follow.
//!
//! This is the plain unsigned varint used to frame lengths, counts, and
//! variant/tag codes throughout the wire format -- no zig-zag, since there
//! is nothing signed to encode here. The wire format itself is unbounded;
//! this codec represents decoded values as `u128` so that values like
//! `2^76` (larger than any fixed-width integer field but well within what
//! a container of varints can carry) round-trip exactly, while still
//! rejecting anything that would overflow even that.

use crate::error::{Error, Result};
use crate::transport::Transport;

/// 19 groups of 7 bits covers the full 128-bit range with room to spare for
/// detecting genuine overflow.
const MAX_GROUPS: usize = 19;

pub async fn write_uvarint(t: &mut dyn Transport, mut v: u128) -> Result<()> {
  loop {
    if v >= 0x80 {
      t.write_all(&[(v as u8 & 0x7f) | 0x80]).await?;
      v >>= 7;
    } else {
      t.write_all(&[v as u8]).await?;
      return Ok(());
    }
  }
}

pub async fn read_uvarint(t: &mut dyn Transport) -> Result<u128> {
  let mut out: u128 = 0;
  let mut shift = 0u32;
  for _ in 0..MAX_GROUPS {
    let mut byte = [0u8; 1];
    t.read_exact(&mut byte).await?;
    let byte = byte[0];
    let low7 = (byte & 0x7f) as u128;
    if shift >= 128 || (low7.checked_shl(shift).map(|s| s >> shift) != Some(low7)) {
      return Err(Error::DecodeError("uvarint overflows u128".into()));
    }
    out |= low7 << shift;
    if byte & 0x80 == 0 {
      return Ok(out);
    }
    shift += 7;
  }
  Err(Error::DecodeError("uvarint longer than 19 groups".into()))
}

/// The number of bytes [`write_uvarint`] would emit for `v`, without writing
/// anything. Useful for sizing length-prefixed frames ahead of time.
pub fn uvarint_len(mut v: u128) -> usize {
  let mut n = 1;
  while v >= 0x80 {
    v >>= 7;
    n += 1;
  }
  n
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::transport::MemoryTransport;

  async fn round_trip(v: u128) -> u128 {
    let mut t = MemoryTransport::new();
    write_uvarint(&mut t, v).await.unwrap();
    assert_eq!(t.as_slice().len(), uvarint_len(v));
    let mut t = MemoryTransport::from_vec(t.into_inner());
    read_uvarint(&mut t).await.unwrap()
  }

  #[tokio::test]
  async fn small_values() {
    assert_eq!(round_trip(0).await, 0);
    assert_eq!(round_trip(1).await, 1);
    assert_eq!(round_trip(127).await, 127);
  }

  #[tokio::test]
  async fn u64_boundary() {
    let v = u64::MAX as u128;
    let t = round_trip(v).await;
    assert_eq!(t, v);
  }

  #[tokio::test]
  async fn large_value_2_pow_76() {
    // scenario S4: 2^76 needs 77 bits, ceil(77/7) = 11 bytes on the wire.
    let v: u128 = 1u128 << 76;
    let mut t = MemoryTransport::new();
    write_uvarint(&mut t, v).await.unwrap();
    assert_eq!(t.as_slice().len(), 11);
    let mut t2 = MemoryTransport::from_vec(t.into_inner());
    assert_eq!(read_uvarint(&mut t2).await.unwrap(), v);
  }

  #[tokio::test]
  async fn empty_container_tag_is_single_zero_byte() {
    let mut t = MemoryTransport::new();
    write_uvarint(&mut t, 0).await.unwrap();
    assert_eq!(t.as_slice(), &[0x00]);
  }

  #[tokio::test]
  async fn overflow_is_rejected() {
    // 19 continuation bytes with the high bit set can't fit in a u128.
    let bytes = vec![0xffu8; 19];
    let mut t = MemoryTransport::from_vec(bytes);
    assert!(matches!(read_uvarint(&mut t).await, Err(Error::DecodeError(_))));
  }

  proptest::proptest! {
    #[test]
    fn prop_round_trip_u64_range(v: u64) {
      let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
      let got = rt.block_on(round_trip(v as u128));
      prop_assert_eq!(got, v as u128);
    }
  }
}
