//! Read engine — resolves an access string, then reads and converts value
//! bytes.
//!
//! Grounded on sixcy's `SixCyReader` (`io_stream/mod.rs`) for the shape of a
//! generic `S: Read + Seek` reader struct; the typed-conversion table and
//! `seek_next` behavior follow `son_read.c`/`son.c`'s `son_read_str`/
//! `son_read_num`/... switch statements in `original_source/`.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{IoResultExt, Result, SonError};
use crate::handle::HandleIntegrity;
use crate::path::{self, ResolvedRecord};
use crate::record::{Record, ValueKind, RECORD_SIZE};

/// A reader handle tracks no stack, so the one integrity-checked word is a
/// fixed tag rather than a live depth/capacity pair — the same mechanism as
/// the writer's, guarding against the same class of out-of-band corruption.
const READER_TAG: u32 = 0x5EA2_0001;

pub struct SonReader<S: Read + Seek> {
    sink: S,
    integrity: HandleIntegrity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekDirection {
    NextSibling,
    NextChild,
}

impl<S: Read + Seek> SonReader<S> {
    pub fn open(sink: S) -> Self {
        let mut integrity = HandleIntegrity::new();
        integrity.restore(&[READER_TAG]);
        Self { sink, integrity }
    }

    fn verify_integrity(&self) -> Result<()> {
        self.integrity.verify(&[READER_TAG])
    }

    fn resolve(&mut self, access: &str) -> Result<ResolvedRecord> {
        self.verify_integrity()?;
        let r = path::resolve(&mut self.sink, access);
        self.integrity.restore(&[READER_TAG]);
        r
    }

    /// Read up to `cap` bytes of the value at `access` into `buf`, zero-
    /// filling any trailing capacity. Returns the number of bytes copied
    /// from the value (before zero-fill).
    pub fn read_raw(&mut self, access: &str, buf: &mut [u8]) -> Result<usize> {
        let r = self.resolve(access)?;
        let n = (r.value_size as usize).min(buf.len());
        for b in buf.iter_mut() {
            *b = 0;
        }
        self.sink.seek(SeekFrom::Start(r.value_offset)).seek_io()?;
        self.sink.read_exact(&mut buf[..n]).read_io()?;
        Ok(n)
    }

    fn read_value_bytes(&mut self, r: &ResolvedRecord) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; r.value_size as usize];
        self.sink.seek(SeekFrom::Start(r.value_offset)).seek_io()?;
        self.sink.read_exact(&mut buf).read_io()?;
        Ok(buf)
    }

    pub fn read_str(&mut self, access: &str) -> Result<String> {
        let r = self.resolve(access)?;
        match r.record.kind {
            ValueKind::String => {
                let mut bytes = self.read_value_bytes(&r)?;
                if let Some(&0) = bytes.last() {
                    bytes.pop();
                }
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            ValueKind::Float => Ok(format!("{:.6}", self.read_float_inner(&r)?)),
            ValueKind::U32 => Ok(self.read_unum_inner(&r)?.to_string()),
            ValueKind::S32 => Ok(self.read_num_inner(&r)?.to_string()),
            ValueKind::True => Ok("true".to_string()),
            ValueKind::False => Ok("false".to_string()),
            ValueKind::Null => Ok("null".to_string()),
            ValueKind::Data => {
                let bytes = self.read_value_bytes(&r)?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            ValueKind::Object | ValueKind::Array => Err(SonError::CannotConvert),
        }
    }

    pub fn read_num(&mut self, access: &str) -> Result<i32> {
        let r = self.resolve(access)?;
        self.read_num_inner(&r)
    }

    fn read_num_inner(&mut self, r: &ResolvedRecord) -> Result<i32> {
        match r.record.kind {
            ValueKind::S32 => {
                let bytes = self.read_value_bytes(r)?;
                Ok(i32::from_le_bytes(bytes[..4].try_into().unwrap()))
            }
            ValueKind::U32 => {
                let bytes = self.read_value_bytes(r)?;
                Ok(u32::from_le_bytes(bytes[..4].try_into().unwrap()) as i32)
            }
            ValueKind::Float => Ok(self.read_float_inner(r)? as i32),
            ValueKind::True => Ok(1),
            ValueKind::False | ValueKind::Null => Ok(0),
            ValueKind::String => {
                let bytes = self.read_value_bytes(r)?;
                let s = String::from_utf8_lossy(&bytes);
                Ok(s.trim_end_matches('\0').trim().parse::<i32>().unwrap_or(0))
            }
            ValueKind::Data => Err(SonError::CannotConvert),
            ValueKind::Object | ValueKind::Array => Err(SonError::CannotConvert),
        }
    }

    pub fn read_unum(&mut self, access: &str) -> Result<u32> {
        let r = self.resolve(access)?;
        self.read_unum_inner(&r)
    }

    fn read_unum_inner(&mut self, r: &ResolvedRecord) -> Result<u32> {
        match r.record.kind {
            ValueKind::U32 => {
                let bytes = self.read_value_bytes(r)?;
                Ok(u32::from_le_bytes(bytes[..4].try_into().unwrap()))
            }
            ValueKind::S32 => {
                let bytes = self.read_value_bytes(r)?;
                Ok(i32::from_le_bytes(bytes[..4].try_into().unwrap()) as u32)
            }
            ValueKind::Float => Ok(self.read_float_inner(r)? as u32),
            ValueKind::True => Ok(1),
            ValueKind::False | ValueKind::Null => Ok(0),
            ValueKind::String => {
                let bytes = self.read_value_bytes(r)?;
                let s = String::from_utf8_lossy(&bytes);
                Ok(s.trim_end_matches('\0').trim().parse::<u32>().unwrap_or(0))
            }
            ValueKind::Data => Err(SonError::CannotConvert),
            ValueKind::Object | ValueKind::Array => Err(SonError::CannotConvert),
        }
    }

    pub fn read_float(&mut self, access: &str) -> Result<f32> {
        let r = self.resolve(access)?;
        self.read_float_inner(&r)
    }

    fn read_float_inner(&mut self, r: &ResolvedRecord) -> Result<f32> {
        match r.record.kind {
            ValueKind::Float => {
                let bytes = self.read_value_bytes(r)?;
                Ok(f32::from_le_bytes(bytes[..4].try_into().unwrap()))
            }
            ValueKind::U32 => Ok(self.read_unum_inner(r)? as f32),
            ValueKind::S32 => Ok(self.read_num_inner(r)? as f32),
            ValueKind::True => Ok(1.0),
            ValueKind::False | ValueKind::Null => Ok(0.0),
            ValueKind::String => {
                let bytes = self.read_value_bytes(r)?;
                let s = String::from_utf8_lossy(&bytes);
                Ok(s.trim_end_matches('\0').trim().parse::<f32>().unwrap_or(0.0))
            }
            ValueKind::Data => Err(SonError::CannotConvert),
            ValueKind::Object | ValueKind::Array => Err(SonError::CannotConvert),
        }
    }

    /// Copies the value's raw stored bytes regardless of kind, matching
    /// `son_local_read_raw_data`'s unconditional byte copy.
    pub fn read_data(&mut self, access: &str) -> Result<Vec<u8>> {
        let r = self.resolve(access)?;
        self.read_value_bytes(&r)
    }

    pub fn read_bool(&mut self, access: &str) -> Result<bool> {
        let r = self.resolve(access)?;
        match r.record.kind {
            ValueKind::True => Ok(true),
            ValueKind::False | ValueKind::Null => Ok(false),
            _ => Err(SonError::CannotConvert),
        }
    }

    /// Read the record at the current position, report its key/kind, and
    /// advance to its first child or following sibling.
    pub fn seek_next(&mut self, direction: SeekDirection) -> Result<(String, ValueKind)> {
        self.verify_integrity()?;

        let pos = self.sink.stream_position().seek_io()?;
        let rec = Record::read(&mut self.sink)?;
        let key = rec.key_str().to_string();
        let kind = rec.kind;

        match direction {
            SeekDirection::NextChild => {
                if !kind.is_container() {
                    return Err(SonError::NoChildren);
                }
                self.sink.seek(SeekFrom::Start(pos + RECORD_SIZE as u64)).seek_io()?;
            }
            SeekDirection::NextSibling => {
                if rec.next_offset == 0 {
                    return Err(SonError::NoChildren);
                }
                self.sink.seek(SeekFrom::Start(rec.next_offset as u64)).seek_io()?;
            }
        }

        self.integrity.restore(&[READER_TAG]);
        Ok((key, kind))
    }

    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.verify_integrity()?;
        self.sink.seek(SeekFrom::Start(offset)).seek_io()?;
        self.integrity.restore(&[READER_TAG]);
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}
