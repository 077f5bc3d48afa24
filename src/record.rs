//! Record codec — the 24-byte packed unit every SON value is stored as.
//!
//! # On-disk layout (24 bytes, little-endian)
//!
//! ```text
//! Offset  Size  Field
//!    0      1   flags          low nibble = ValueKind tag
//!    1      1   next_page      high byte of next_offset
//!    2      2   next_page_off  low 16 bits of next_offset
//!    4     16   key            zero-padded, <=15 bytes + NUL terminator
//!   20      4   checksum       additive: sum of all four u32 words == 0
//! ```
//!
//! `next_offset = next_page * 65536 + next_page_offset`, reconstructing the
//! 24-bit forward link the original C struct packs into a `u8`+`u16` pair
//! (`son_pos_t`) rather than a plain `u32`, to keep the record at 24 bytes on
//! architectures that would otherwise pad a `u32` after the single-byte
//! `o_flags`.

use std::io::{Read, Write};

use crate::error::{IoResultExt, Result, SonError};

pub const RECORD_SIZE: usize = 24;
pub const KEY_NAME_SIZE: usize = 15;
pub const KEY_NAME_CAPACITY: usize = 16;
pub const ROOT_KEY: &str = "$";

const MARKER_MASK: u8 = 0x0F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ValueKind {
    String = 0,
    Float = 1,
    U32 = 2,
    S32 = 3,
    Data = 4,
    Object = 5,
    Array = 6,
    True = 7,
    False = 8,
    Null = 9,
}

impl ValueKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag & MARKER_MASK {
            0 => Some(ValueKind::String),
            1 => Some(ValueKind::Float),
            2 => Some(ValueKind::U32),
            3 => Some(ValueKind::S32),
            4 => Some(ValueKind::Data),
            5 => Some(ValueKind::Object),
            6 => Some(ValueKind::Array),
            7 => Some(ValueKind::True),
            8 => Some(ValueKind::False),
            9 => Some(ValueKind::Null),
            _ => None,
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, ValueKind::Object | ValueKind::Array)
    }
}

/// One 24-byte record: a key, its kind, a forward link, and a checksum.
#[derive(Debug, Clone)]
pub struct Record {
    pub kind: ValueKind,
    pub next_offset: u32,
    pub key: [u8; KEY_NAME_CAPACITY],
}

impl Record {
    pub fn new(kind: ValueKind, key: &str) -> Self {
        Self {
            kind,
            next_offset: 0,
            key: encode_key(key),
        }
    }

    pub fn key_str(&self) -> &str {
        let end = self.key.iter().position(|&b| b == 0).unwrap_or(self.key.len());
        std::str::from_utf8(&self.key[..end]).unwrap_or("")
    }

    /// Write the 24-byte record. The checksum is computed here so callers
    /// never construct a record with a stale or hand-set checksum field.
    pub fn write<W: Write>(&self, mut w: W) -> Result<()> {
        let mut buf = [0u8; RECORD_SIZE];

        buf[0] = self.kind as u8;
        buf[1] = (self.next_offset >> 16) as u8;
        buf[2..4].copy_from_slice(&(self.next_offset as u16).to_le_bytes());
        buf[4..20].copy_from_slice(&self.key);

        let sum = sum_words(&buf[..20]);
        let checksum = 0u32.wrapping_sub(sum);
        buf[20..24].copy_from_slice(&checksum.to_le_bytes());

        w.write_all(&buf).write_io()
    }

    /// Read and validate a 24-byte record. The checksum is verified first —
    /// the cheapest possible check, and the one most likely to catch a torn
    /// or mis-seeked read before any field is trusted.
    pub fn read<R: Read>(mut r: R) -> Result<Self> {
        let mut buf = [0u8; RECORD_SIZE];
        r.read_exact(&mut buf).read_io()?;

        if sum_words(&buf) != 0 {
            tracing::warn!("record checksum did not sum to zero");
            return Err(SonError::ReadChecksum);
        }

        let tag = buf[0];
        // A bad tag under a checksum that still summed to zero is the same
        // kind of untrustworthy record as a bad checksum.
        let kind = ValueKind::from_tag(tag).ok_or(SonError::ReadChecksum)?;
        let next_page = buf[1] as u32;
        let next_page_offset = u16::from_le_bytes(buf[2..4].try_into().unwrap()) as u32;
        let next_offset = next_page * 65536 + next_page_offset;
        let key: [u8; KEY_NAME_CAPACITY] = buf[4..20].try_into().unwrap();

        Ok(Self { kind, next_offset, key })
    }
}

fn sum_words(buf: &[u8]) -> u32 {
    buf.chunks(4)
        .fold(0u32, |acc, chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            acc.wrapping_add(u32::from_le_bytes(word))
        })
}

/// Truncate to `KEY_NAME_SIZE` bytes and zero-pad to `KEY_NAME_CAPACITY`.
/// Mirrors `son_local_store_insert_key`'s silent truncation in the original.
pub fn encode_key(key: &str) -> [u8; KEY_NAME_CAPACITY] {
    let mut out = [0u8; KEY_NAME_CAPACITY];
    let bytes = key.as_bytes();
    let n = bytes.len().min(KEY_NAME_SIZE);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

/// 4-byte container header: version + reserved, both zero-initialized.
pub const HEADER_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct SonHeader {
    pub version: u16,
    pub reserved: u16,
}

impl SonHeader {
    pub fn write<W: Write>(&self, mut w: W) -> Result<()> {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..2].copy_from_slice(&self.version.to_le_bytes());
        buf[2..4].copy_from_slice(&self.reserved.to_le_bytes());
        w.write_all(&buf).write_io()
    }

    pub fn read<R: Read>(mut r: R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        r.read_exact(&mut buf).read_io()?;
        Ok(Self {
            version: u16::from_le_bytes(buf[0..2].try_into().unwrap()),
            reserved: u16::from_le_bytes(buf[2..4].try_into().unwrap()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_record() {
        let rec = Record::new(ValueKind::Object, "hello");
        let mut buf = Vec::new();
        rec.write(&mut buf).unwrap();
        assert_eq!(buf.len(), RECORD_SIZE);
        let back = Record::read(&buf[..]).unwrap();
        assert_eq!(back.kind, ValueKind::Object);
        assert_eq!(back.key_str(), "hello");
        assert_eq!(back.next_offset, 0);
    }

    #[test]
    fn checksum_sums_to_zero() {
        let rec = Record::new(ValueKind::Array, "arr");
        let mut buf = Vec::new();
        rec.write(&mut buf).unwrap();
        assert_eq!(sum_words(&buf), 0);
    }

    #[test]
    fn rejects_corrupted_checksum() {
        let rec = Record::new(ValueKind::String, "k");
        let mut buf = Vec::new();
        rec.write(&mut buf).unwrap();
        buf[10] ^= 0xFF;
        assert!(Record::read(&buf[..]).is_err());
    }

    #[test]
    fn long_key_is_truncated_not_rejected() {
        let key = "a_key_name_that_is_way_too_long_for_the_slot";
        let rec = Record::new(ValueKind::Null, key);
        assert_eq!(rec.key_str(), &key[..KEY_NAME_SIZE]);
    }

    #[test]
    fn next_offset_packs_page_and_page_offset() {
        let mut rec = Record::new(ValueKind::Object, "x");
        rec.next_offset = 3 * 65536 + 42;
        let mut buf = Vec::new();
        rec.write(&mut buf).unwrap();
        let back = Record::read(&buf[..]).unwrap();
        assert_eq!(back.next_offset, 3 * 65536 + 42);
    }
}
