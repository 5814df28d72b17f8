//! Fixed-width little-endian integers, widths 1/2/4/8.
//!
//! Unlike the varint codec, these never carry a length prefix: the width is
//! part of the schema, known to both sides ahead of time.

use crate::error::{Error, Result};
use crate::transport::Transport;

pub async fn write_fixed(t: &mut dyn Transport, width: u8, v: u64) -> Result<()> {
  match width {
    1 => t.write_all(&(v as u8).to_le_bytes()).await,
    2 => t.write_all(&(v as u16).to_le_bytes()).await,
    4 => t.write_all(&(v as u32).to_le_bytes()).await,
    8 => t.write_all(&v.to_le_bytes()).await,
    w => Err(Error::SchemaError(format!("unsupported fixed-int width {w}"))),
  }
}

pub async fn read_fixed(t: &mut dyn Transport, width: u8) -> Result<u64> {
  match width {
    1 => {
      let mut buf = [0u8; 1];
      t.read_exact(&mut buf).await?;
      Ok(buf[0] as u64)
    }
    2 => {
      let mut buf = [0u8; 2];
      t.read_exact(&mut buf).await?;
      Ok(u16::from_le_bytes(buf) as u64)
    }
    4 => {
      let mut buf = [0u8; 4];
      t.read_exact(&mut buf).await?;
      Ok(u32::from_le_bytes(buf) as u64)
    }
    8 => {
      let mut buf = [0u8; 8];
      t.read_exact(&mut buf).await?;
      Ok(u64::from_le_bytes(buf))
    }
    w => Err(Error::SchemaError(format!("unsupported fixed-int width {w}"))),
  }
}

/// Two's-complement reinterpretation of the raw bits read back by
/// [`read_fixed`], for descriptors with `signed = true`.
pub fn as_signed(width: u8, raw: u64) -> i64 {
  match width {
    1 => raw as u8 as i8 as i64,
    2 => raw as u16 as i16 as i64,
    4 => raw as u32 as i32 as i64,
    _ => raw as i64,
  }
}

/// Inverse of [`as_signed`]: the raw unsigned bit pattern to hand to
/// [`write_fixed`] for a signed value at a given width.
pub fn from_signed(width: u8, v: i64) -> u64 {
  match width {
    1 => (v as i8 as u8) as u64,
    2 => (v as i16 as u16) as u64,
    4 => (v as i32 as u32) as u64,
    _ => v as u64,
  }
}
