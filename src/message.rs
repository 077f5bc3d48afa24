//! Message framing — length-prefixed, checksummed send/receive of a
//! complete container over a byte stream.
//!
//! Grounded directly on `son_message.c` (`original_source/`): the wire
//! frame, the byte-by-byte magic scan (`son_message_recv_start`), and the
//! would-block retry loop with an inter-chunk timeout
//! (`son_message_transfer_data`) are all reproduced here, using
//! `io::ErrorKind::WouldBlock` and `std::thread::sleep` in place of the
//! original's `EAGAIN`/`son_phy_msleep`.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::thread;
use std::time::Duration;

use crate::error::{IoResultExt, Result, SonError};
use crate::record::{Record, HEADER_SIZE};

pub const MESSAGE_MAGIC: u32 = 0x0123_4567;
const HEADER_WIRE_SIZE: usize = 12;

fn header_checksum(size: u32) -> u32 {
    0u32.wrapping_sub(MESSAGE_MAGIC.wrapping_add(size))
}

/// Reads the root record's `next_offset`, the total size of a sealed
/// container. `INCOMPLETE_MESSAGE` if the root was never closed.
pub fn get_message_size<S: Read + Seek>(sink: &mut S) -> Result<u32> {
    sink.seek(SeekFrom::Start(HEADER_SIZE as u64)).seek_io()?;
    let root = Record::read(&mut *sink)?;
    if root.next_offset == 0 {
        return Err(SonError::IncompleteMessage);
    }
    Ok(root.next_offset)
}

fn read_byte_with_retry<T: Read>(stream: &mut T, timeout_ms: u64) -> Result<u8> {
    let mut byte = [0u8; 1];
    let mut elapsed_ms = 0u64;
    loop {
        match stream.read(&mut byte) {
            Ok(0) => return Err(SonError::MessageIo),
            Ok(_) => return Ok(byte[0]),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                if elapsed_ms >= timeout_ms {
                    return Err(SonError::MessageTimeout);
                }
                thread::sleep(Duration::from_millis(1));
                elapsed_ms += 1;
            }
            Err(_) => return Err(SonError::MessageIo),
        }
    }
}

/// Inter-chunk timeout: the elapsed counter resets after every successful
/// transfer, so only a stall with no forward progress can time out.
fn read_exact_with_retry<T: Read>(stream: &mut T, buf: &mut [u8], timeout_ms: u64) -> Result<()> {
    let mut filled = 0;
    let mut elapsed_ms = 0u64;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => return Err(SonError::MessageIo),
            Ok(n) => {
                filled += n;
                elapsed_ms = 0;
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                if elapsed_ms >= timeout_ms {
                    return Err(SonError::MessageTimeout);
                }
                thread::sleep(Duration::from_millis(1));
                elapsed_ms += 1;
            }
            Err(_) => return Err(SonError::MessageIo),
        }
    }
    Ok(())
}

fn write_all_with_retry<T: Write>(stream: &mut T, buf: &[u8], timeout_ms: u64) -> Result<()> {
    let mut sent = 0;
    let mut elapsed_ms = 0u64;
    while sent < buf.len() {
        match stream.write(&buf[sent..]) {
            Ok(0) => return Err(SonError::MessageIo),
            Ok(n) => {
                sent += n;
                elapsed_ms = 0;
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                if elapsed_ms >= timeout_ms {
                    return Err(SonError::MessageTimeout);
                }
                thread::sleep(Duration::from_millis(1));
                elapsed_ms += 1;
            }
            Err(_) => return Err(SonError::MessageIo),
        }
    }
    Ok(())
}

/// Send a sealed container over `stream`. Fails `INCOMPLETE_MESSAGE` if the
/// root has not been closed. The payload is clamped to `capacity` (the
/// sender's own buffer size), mirroring the original's defensive clamp.
pub fn send_message<S: Read + Seek, T: Write>(
    sink: &mut S,
    stream: &mut T,
    capacity: usize,
    timeout_ms: u64,
) -> Result<usize> {
    let size = get_message_size(sink)? as usize;
    let clamped = size.min(capacity);

    let mut header = [0u8; HEADER_WIRE_SIZE];
    header[0..4].copy_from_slice(&MESSAGE_MAGIC.to_le_bytes());
    header[4..8].copy_from_slice(&(clamped as u32).to_le_bytes());
    header[8..12].copy_from_slice(&header_checksum(clamped as u32).to_le_bytes());
    write_all_with_retry(stream, &header, timeout_ms)?;

    sink.seek(SeekFrom::Start(0)).seek_io()?;
    let mut payload = vec![0u8; clamped];
    sink.read_exact(&mut payload).read_io()?;
    write_all_with_retry(stream, &payload, timeout_ms)?;

    Ok(clamped)
}

/// Scan `stream` byte-by-byte for the magic sequence, read the frame
/// header, verify its zero-sum, then fill `sink` (zeroed up to `capacity`
/// first) with up to `capacity` payload bytes. A short reception from
/// buffer overflow is not an error — the caller observes truncation via
/// the returned byte count.
pub fn recv_message<S: Write + Seek, T: Read>(
    sink: &mut S,
    stream: &mut T,
    capacity: usize,
    timeout_ms: u64,
) -> Result<usize> {
    let magic_bytes = MESSAGE_MAGIC.to_le_bytes();
    let mut matched = 0usize;
    loop {
        let b = read_byte_with_retry(stream, timeout_ms)?;
        if b == magic_bytes[matched] {
            matched += 1;
            if matched == magic_bytes.len() {
                break;
            }
        } else {
            matched = if b == magic_bytes[0] { 1 } else { 0 };
        }
    }

    let mut rest = [0u8; 8];
    read_exact_with_retry(stream, &mut rest, timeout_ms)?;
    let size = u32::from_le_bytes(rest[0..4].try_into().unwrap());
    let checksum = u32::from_le_bytes(rest[4..8].try_into().unwrap());
    if MESSAGE_MAGIC.wrapping_add(size).wrapping_add(checksum) != 0 {
        return Err(SonError::NoMessage);
    }

    sink.seek(SeekFrom::Start(0)).seek_io()?;
    sink.write_all(&vec![0u8; capacity]).write_io()?;

    let n = (size as usize).min(capacity);
    let mut payload = vec![0u8; n];
    read_exact_with_retry(stream, &mut payload, timeout_ms)?;
    sink.seek(SeekFrom::Start(0)).seek_io()?;
    sink.write_all(&payload).write_io()?;

    Ok(n)
}
