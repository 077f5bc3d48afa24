//! Edit engine — in-place rewrites that preserve record boundaries.
//!
//! Grounded on `son_edit.c`'s `son_edit_*`/`edit_raw_data` family
//! (`original_source/`) for the kind-match-then-truncate semantics, and on
//! sixcy's `recovery/scanner.rs` for the general style of a seek-read-
//! rewrite-in-place pass over an already-written file.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{IoResultExt, Result, SonError};
use crate::handle::HandleIntegrity;
use crate::path;
use crate::record::{Record, ValueKind, RECORD_SIZE};

/// An editor handle tracks no stack either, so it reuses the same fixed-tag
/// mechanism as `SonReader`, under its own tag value.
const EDITOR_TAG: u32 = 0x5E31_0002;

pub struct SonEditor<S: Read + Write + Seek> {
    sink: S,
    integrity: HandleIntegrity,
}

impl<S: Read + Write + Seek> SonEditor<S> {
    pub fn open(sink: S) -> Self {
        let mut integrity = HandleIntegrity::new();
        integrity.restore(&[EDITOR_TAG]);
        Self { sink, integrity }
    }

    fn verify_integrity(&self) -> Result<()> {
        self.integrity.verify(&[EDITOR_TAG])
    }

    /// Resolve `access`, require its stored kind to match `expected_kind`,
    /// then overwrite `min(bytes.len(), value_size)` bytes in place.
    /// Variable-length values are never grown or shrunk on disk: a shorter
    /// write leaves the original length; a longer write is truncated.
    pub fn edit_typed(&mut self, access: &str, bytes: &[u8], expected_kind: ValueKind) -> Result<()> {
        self.verify_integrity()?;

        let r = path::resolve(&mut self.sink, access)?;
        if r.record.kind != expected_kind {
            return Err(SonError::EditTypeMismatch);
        }
        let n = bytes.len().min(r.value_size as usize);
        self.sink.seek(SeekFrom::Start(r.value_offset)).seek_io()?;
        self.sink.write_all(&bytes[..n]).write_io()?;

        self.integrity.restore(&[EDITOR_TAG]);
        Ok(())
    }

    pub fn edit_float(&mut self, access: &str, value: f32) -> Result<()> {
        self.edit_typed(access, &value.to_le_bytes(), ValueKind::Float)
    }

    pub fn edit_num(&mut self, access: &str, value: i32) -> Result<()> {
        self.edit_typed(access, &value.to_le_bytes(), ValueKind::S32)
    }

    pub fn edit_unum(&mut self, access: &str, value: u32) -> Result<()> {
        self.edit_typed(access, &value.to_le_bytes(), ValueKind::U32)
    }

    pub fn edit_str(&mut self, access: &str, value: &str) -> Result<()> {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        self.edit_typed(access, &bytes, ValueKind::String)
    }

    pub fn edit_data(&mut self, access: &str, value: &[u8]) -> Result<()> {
        self.edit_typed(access, value, ValueKind::Data)
    }

    /// Rewrite the record's tag to TRUE or FALSE with no prior-kind check,
    /// and regenerate `next_offset` as `position + record_size` since
    /// TRUE/FALSE carry no value bytes.
    pub fn edit_bool(&mut self, access: &str, value: bool) -> Result<()> {
        self.verify_integrity()?;

        let r = path::resolve(&mut self.sink, access)?;
        let mut rec = Record::new(
            if value { ValueKind::True } else { ValueKind::False },
            r.record.key_str(),
        );
        rec.next_offset = (r.record_offset + RECORD_SIZE as u64) as u32;
        self.sink.seek(SeekFrom::Start(r.record_offset)).seek_io()?;
        rec.write(&mut self.sink)?;

        self.integrity.restore(&[EDITOR_TAG]);
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}
