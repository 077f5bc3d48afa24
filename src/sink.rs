//! Byte-sink abstraction — seekable read/write over a file or an in-memory
//! buffer.
//!
//! The engine (`writer.rs`/`reader.rs`/`editor.rs`/`message.rs`) is generic
//! over any `S: Read + Write + Seek`, the same shape sixcy's `SixCyWriter`/
//! `SixCyReader` use. `std::fs::File` and `std::io::Cursor<Vec<u8>>` already
//! satisfy this bound for the file-backed and buffer-backed variants; the
//! only sink-level machinery this crate adds on top is [`BufferSink`], whose
//! writes saturate at a fixed capacity instead of growing, and
//! [`SinkDriver`], a safe stand-in for the original library's caller-supplied
//! platform function table (`son_phy_set_driver`).

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// A fixed-capacity, in-memory sink whose writes saturate rather than grow
/// the buffer. Used for message framing, where the buffer is caller-owned
/// and a short write is the mechanism by which callers detect message
/// truncation, not an error.
pub struct BufferSink {
    buf: Vec<u8>,
    capacity: usize,
    pos: usize,
}

impl BufferSink {
    pub fn new(capacity: usize) -> Self {
        Self { buf: vec![0u8; capacity], capacity, pos: 0 }
    }

    pub fn from_vec(mut buf: Vec<u8>) -> Self {
        let capacity = buf.len();
        buf.resize(capacity, 0);
        Self { buf, capacity, pos: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

impl Read for BufferSink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let avail = self.capacity.saturating_sub(self.pos);
        let n = buf.len().min(avail);
        buf[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for BufferSink {
    /// Truncates at capacity instead of erroring: a partial write's short
    /// count is the caller's signal that the buffer overflowed.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let avail = self.capacity.saturating_sub(self.pos);
        let n = buf.len().min(avail);
        self.buf[self.pos..self.pos + n].copy_from_slice(&buf[..n]);
        self.pos += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for BufferSink {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::Current(n) => self.pos as i64 + n,
            SeekFrom::End(n) => self.capacity as i64 + n,
        };
        if new_pos < 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "negative seek position"));
        }
        self.pos = new_pos as usize;
        Ok(self.pos as u64)
    }
}

/// A caller-supplied platform driver, routed to instead of the native file
/// APIs. Corresponds to the original library's `son_phy_set_driver` hook:
/// two concrete sink variants behind one capability set, rather than a raw
/// function-pointer table.
pub trait SinkDriver: Read + Write + Seek {}

impl<T: Read + Write + Seek> SinkDriver for T {}

/// Wraps any sink behind a trait object, for callers that want to select a
/// driver at runtime (file, buffer, or a custom platform driver) without
/// monomorphizing the whole engine per variant.
pub struct DynSink {
    inner: Box<dyn SinkDriver>,
}

impl DynSink {
    pub fn new<S: SinkDriver + 'static>(sink: S) -> Self {
        Self { inner: Box::new(sink) }
    }

    pub fn buffer(capacity: usize) -> Self {
        Self::new(BufferSink::new(capacity))
    }

    pub fn memory(buf: Vec<u8>) -> Self {
        Self::new(Cursor::new(buf))
    }
}

impl Read for DynSink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for DynSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Seek for DynSink {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}
