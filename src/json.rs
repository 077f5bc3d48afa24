//! JSON export — recursive walk over the record chain, emitting JSON.
//!
//! Grounded on `son_to_json`/`to_json_recursial` in `son.c`
//! (`original_source/`) for the recursion shape (array vs. object key-name
//! suppression, depth-first child walk via `next_offset` ranges). DATA
//! values are base64-encoded here rather than printed as the literal
//! string `"DATA"` the original emits — an explicit upgrade this format
//! calls for that the original predates.

use std::io::{Read, Seek, SeekFrom, Write};

use base64::Engine as _;

use crate::error::{IoResultExt, Result};
use crate::record::{Record, ValueKind, HEADER_SIZE, RECORD_SIZE, ROOT_KEY};

/// Walk the container starting at the root record and write it as JSON to
/// `out`.
pub fn export<S: Read + Seek, W: Write>(sink: &mut S, out: &mut W) -> Result<()> {
    sink.seek(SeekFrom::Start(HEADER_SIZE as u64)).seek_io()?;
    let root = Record::read(&mut *sink)?;
    debug_assert_eq!(root.key_str(), ROOT_KEY);
    write_container(sink, out, HEADER_SIZE as u64 + RECORD_SIZE as u64, root.next_offset as u64, root.kind)
}

fn write_container<S: Read + Seek, W: Write>(
    sink: &mut S,
    out: &mut W,
    start: u64,
    end: u64,
    kind: ValueKind,
) -> Result<()> {
    let is_array = kind == ValueKind::Array;
    out.write_all(if is_array { b"[" } else { b"{" }).write_io()?;

    let mut pos = start;
    let mut first = true;
    while pos < end {
        sink.seek(SeekFrom::Start(pos)).seek_io()?;
        let rec = Record::read(&mut *sink)?;

        if !first {
            out.write_all(b",").write_io()?;
        }
        first = false;

        if !is_array {
            write_json_string(out, rec.key_str())?;
            out.write_all(b":").write_io()?;
        }

        let value_start = pos + RECORD_SIZE as u64;
        let value_end = rec.next_offset as u64;

        if rec.kind.is_container() {
            write_container(sink, out, value_start, value_end, rec.kind)?;
        } else {
            write_scalar(sink, out, &rec, value_start, value_end)?;
        }

        if rec.next_offset == 0 {
            break;
        }
        pos = rec.next_offset as u64;
    }

    out.write_all(if is_array { b"]" } else { b"}" }).write_io()?;
    Ok(())
}

fn write_scalar<S: Read + Seek, W: Write>(
    sink: &mut S,
    out: &mut W,
    rec: &Record,
    start: u64,
    end: u64,
) -> Result<()> {
    let size = end.saturating_sub(start) as usize;
    let mut bytes = vec![0u8; size];
    sink.seek(SeekFrom::Start(start)).seek_io()?;
    sink.read_exact(&mut bytes).read_io()?;

    match rec.kind {
        ValueKind::String => {
            if bytes.last() == Some(&0) {
                bytes.pop();
            }
            write_json_string(out, &String::from_utf8_lossy(&bytes))?;
        }
        ValueKind::Float => {
            let v = f32::from_le_bytes(bytes[..4].try_into().unwrap());
            write!(out, "{:.6}", v).write_io()?;
        }
        ValueKind::U32 => {
            let v = u32::from_le_bytes(bytes[..4].try_into().unwrap());
            write!(out, "{v}").write_io()?;
        }
        ValueKind::S32 => {
            let v = i32::from_le_bytes(bytes[..4].try_into().unwrap());
            write!(out, "{v}").write_io()?;
        }
        ValueKind::Data => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
            write_json_string(out, &encoded)?;
        }
        ValueKind::True => out.write_all(b"true").write_io()?,
        ValueKind::False => out.write_all(b"false").write_io()?,
        ValueKind::Null => out.write_all(b"null").write_io()?,
        ValueKind::Object | ValueKind::Array => unreachable!("containers handled separately"),
    }
    Ok(())
}

fn write_json_string<W: Write>(out: &mut W, s: &str) -> Result<()> {
    out.write_all(b"\"").write_io()?;
    for c in s.chars() {
        match c {
            '"' => out.write_all(b"\\\"").write_io()?,
            '\\' => out.write_all(b"\\\\").write_io()?,
            '\n' => out.write_all(b"\\n").write_io()?,
            '\r' => out.write_all(b"\\r").write_io()?,
            '\t' => out.write_all(b"\\t").write_io()?,
            c if (c as u32) < 0x20 => write!(out, "\\u{:04x}", c as u32).write_io()?,
            c => write!(out, "{c}").write_io()?,
        }
    }
    out.write_all(b"\"").write_io()?;
    Ok(())
}
