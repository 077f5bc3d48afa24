//! Write engine — a streaming writer with a depth-bounded, caller-sized
//! back-patch stack.
//!
//! Grounded on sixcy's `SixCyWriter` (`io_stream/mod.rs`) for the general
//! shape of a generic `S: Read + Write + Seek` writer struct that owns the
//! sink for its lifetime, and on sixcy's `archive.rs` finalize pattern
//! (seek back, rewrite a header field, seek forward again) for the
//! back-patch mechanics. The open/close bookkeeping itself follows
//! `write_open_marker`/`write_close_marker` in `son.c`.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{IoResultExt, Result, SonError};
use crate::handle::HandleIntegrity;
use crate::record::{Record, ValueKind, SonHeader, HEADER_SIZE, RECORD_SIZE, ROOT_KEY};

pub struct SonWriter<S: Read + Write + Seek> {
    sink: S,
    stack: Vec<u64>,
    stack_size: usize,
    integrity: HandleIntegrity,
}

impl<S: Read + Write + Seek> SonWriter<S> {
    /// Write the header and start with an empty back-patch stack of the
    /// given capacity.
    pub fn create(mut sink: S, stack_size: usize) -> Result<Self> {
        sink.seek(SeekFrom::Start(0)).seek_io()?;
        SonHeader::default().write(&mut sink)?;
        let mut w = Self { sink, stack: Vec::new(), stack_size, integrity: HandleIntegrity::new() };
        w.touch_integrity();
        Ok(w)
    }

    /// Identical to `create`, but documents intent: the sink is a fixed-size
    /// buffer meant for message framing, not a file.
    pub fn create_message(sink: S, stack_size: usize) -> Result<Self> {
        Self::create(sink, stack_size)
    }

    /// Open an existing, sealed container for appending siblings to the
    /// root. Fails `CANNOT_APPEND` if the root was never closed.
    pub fn append(mut sink: S, stack_size: usize) -> Result<Self> {
        sink.seek(SeekFrom::Start(HEADER_SIZE as u64)).seek_io()?;
        let root = Record::read(&mut sink)?;
        if root.next_offset == 0 {
            return Err(SonError::CannotAppend);
        }
        sink.seek(SeekFrom::Start(root.next_offset as u64)).seek_io()?;
        let mut w = Self {
            sink,
            stack: vec![HEADER_SIZE as u64],
            stack_size,
            integrity: HandleIntegrity::new(),
        };
        w.touch_integrity();
        Ok(w)
    }

    fn integrity_fields(&self) -> [u32; 2] {
        [self.stack.len() as u32, self.stack_size as u32]
    }

    fn verify_integrity(&self) -> Result<()> {
        self.integrity.verify(&self.integrity_fields())
    }

    fn touch_integrity(&mut self) {
        let fields = self.integrity_fields();
        self.integrity.restore(&fields);
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Open an OBJECT, ARRAY, or DATA container. The first call on a fresh
    /// writer must pass an empty `key`; it becomes the root (key `"$"`).
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn open_container(&mut self, kind: ValueKind, key: &str) -> Result<()> {
        self.verify_integrity()?;

        let stack_loc = self.stack.len();
        let actual_key = if stack_loc == 0 {
            if !key.is_empty() {
                return Err(SonError::NoRoot);
            }
            ROOT_KEY
        } else {
            if key.is_empty() {
                return Err(SonError::InvalidKey);
            }
            key
        };
        if stack_loc == self.stack_size {
            return Err(SonError::StackOverflow);
        }

        let pos = self.sink.stream_position().seek_io()?;
        let rec = Record::new(kind, actual_key);
        rec.write(&mut self.sink)?;
        self.stack.push(pos);

        self.touch_integrity();
        Ok(())
    }

    /// Pop the innermost open container and back-patch its `next_offset`
    /// to the current sink position.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn close_container(&mut self) -> Result<()> {
        self.verify_integrity()?;

        let pos = self.stack.pop().ok_or(SonError::StackOverflow)?;
        let current = self.sink.stream_position().seek_io()?;

        self.sink.seek(SeekFrom::Start(pos)).seek_io()?;
        let mut rec = Record::read(&mut self.sink)?;
        rec.next_offset = current as u32;
        self.sink.seek(SeekFrom::Start(pos)).seek_io()?;
        rec.write(&mut self.sink)?;
        self.sink.seek(SeekFrom::Start(current)).seek_io()?;

        self.touch_integrity();
        Ok(())
    }

    /// Close every still-open container, outermost last.
    pub fn close_all(&mut self) -> Result<()> {
        while !self.stack.is_empty() {
            self.close_container()?;
        }
        Ok(())
    }

    /// Write one fixed- or variable-length value record plus its bytes.
    pub fn write_value(&mut self, kind: ValueKind, key: &str, bytes: &[u8]) -> Result<()> {
        self.verify_integrity()?;

        if self.stack_size == 0 {
            return Err(SonError::CannotWrite);
        }
        if self.stack.is_empty() {
            return Err(SonError::NoRoot);
        }
        if key.is_empty() {
            return Err(SonError::InvalidKey);
        }

        let pos = self.sink.stream_position().seek_io()?;
        let mut rec = Record::new(kind, key);
        rec.next_offset = (pos + RECORD_SIZE as u64 + bytes.len() as u64) as u32;
        rec.write(&mut self.sink)?;
        self.sink.write_all(bytes).write_io()?;

        self.touch_integrity();
        Ok(())
    }

    pub fn write_str(&mut self, key: &str, value: &str) -> Result<()> {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        self.write_value(ValueKind::String, key, &bytes)
    }

    pub fn write_num(&mut self, key: &str, value: i32) -> Result<()> {
        self.write_value(ValueKind::S32, key, &value.to_le_bytes())
    }

    pub fn write_unum(&mut self, key: &str, value: u32) -> Result<()> {
        self.write_value(ValueKind::U32, key, &value.to_le_bytes())
    }

    pub fn write_float(&mut self, key: &str, value: f32) -> Result<()> {
        self.write_value(ValueKind::Float, key, &value.to_le_bytes())
    }

    pub fn write_true(&mut self, key: &str) -> Result<()> {
        self.write_value(ValueKind::True, key, &[])
    }

    pub fn write_false(&mut self, key: &str) -> Result<()> {
        self.write_value(ValueKind::False, key, &[])
    }

    pub fn write_null(&mut self, key: &str) -> Result<()> {
        self.write_value(ValueKind::Null, key, &[])
    }

    pub fn write_data(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.write_value(ValueKind::Data, key, value)
    }

    /// Append raw bytes directly to an already-open DATA container, so a
    /// value larger than any single in-memory buffer can be streamed.
    pub fn write_open_data(&mut self, bytes: &[u8]) -> Result<()> {
        self.verify_integrity()?;
        if self.stack.is_empty() {
            return Err(SonError::NoRoot);
        }
        self.sink.write_all(bytes).write_io()?;
        self.touch_integrity();
        Ok(())
    }

    /// Flush any remaining open containers and hand back the sink.
    pub fn close(mut self) -> Result<S> {
        self.close_all()?;
        self.sink.flush().close_io()?;
        Ok(self.sink)
    }

    pub fn get_ref(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn new_writer(stack_size: usize) -> SonWriter<Cursor<Vec<u8>>> {
        SonWriter::create(Cursor::new(Vec::new()), stack_size).unwrap()
    }

    #[test]
    fn writes_an_empty_root_object() {
        let mut w = new_writer(4);
        w.open_container(ValueKind::Object, "").unwrap();
        w.close_container().unwrap();
        let buf = w.close().unwrap().into_inner();
        assert_eq!(buf.len(), HEADER_SIZE + RECORD_SIZE);
        let root = Record::read(&buf[HEADER_SIZE..]).unwrap();
        assert_eq!(root.next_offset as usize, HEADER_SIZE + RECORD_SIZE);
    }

    #[test]
    fn non_empty_key_at_root_fails_no_root() {
        let mut w = new_writer(4);
        assert!(matches!(w.open_container(ValueKind::Object, "oops"), Err(SonError::NoRoot)));
    }

    #[test]
    fn exceeding_stack_size_fails_overflow() {
        let mut w = new_writer(1);
        w.open_container(ValueKind::Object, "").unwrap();
        assert!(matches!(w.open_container(ValueKind::Array, "a"), Err(SonError::StackOverflow)));
    }

    #[test]
    fn write_value_without_root_fails() {
        let mut w = new_writer(4);
        assert!(matches!(w.write_num("a", 1), Err(SonError::NoRoot)));
    }

    #[test]
    fn write_value_on_read_only_stack_fails_cannot_write() {
        let mut w = new_writer(0);
        assert!(matches!(w.write_num("a", 1), Err(SonError::CannotWrite)));
    }
}
