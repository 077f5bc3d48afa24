//! Path resolver — walks the forward-linked record chain for a dotted +
//! bracket-indexed access string, without recursing into sibling subtrees
//! and without any in-memory index.
//!
//! Grounded on the original library's `store_seek`/`seek_key`/
//! `seek_array_key`/`is_token_array` (`son.c`, in `original_source/`): the
//! walk is a pure forward seek, one container range at a time, the same
//! shape as the C version's `"$."`-anchored tokenizer — reproduced here
//! without the anchor prefix hack, since the root record is already read
//! directly before any segment is processed.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{IoResultExt, Result, SonError};
use crate::record::{Record, ValueKind, HEADER_SIZE, RECORD_SIZE, ROOT_KEY};

/// Maximum length of a caller-supplied access string, matching
/// `SON_ACCESS_MAX_USER_SIZE` in the original header.
pub const SON_ACCESS_MAX_USER_SIZE: usize = 93;

/// The outcome of a successful walk: the matched record, its own offset,
/// and the `[value_offset, value_offset + value_size)` range of its value
/// bytes (zero-length for containers and TRUE/FALSE/NULL).
#[derive(Debug, Clone)]
pub struct ResolvedRecord {
    pub record: Record,
    pub record_offset: u64,
    pub value_offset: u64,
    pub value_size: u64,
}

fn read_at<S: Read + Seek>(sink: &mut S, offset: u64) -> Result<Record> {
    sink.seek(SeekFrom::Start(offset)).seek_io()?;
    Record::read(sink)
}

/// Split one dotted segment into its key and left-to-right bracket indices,
/// e.g. `"arr[0][1]"` -> `("arr", [0, 1])`.
fn parse_segment(segment: &str) -> Result<(&str, Vec<usize>)> {
    let bracket = segment.find('[').unwrap_or(segment.len());
    let key = &segment[..bracket];
    if key.is_empty() {
        return Err(SonError::InvalidKey);
    }

    let mut indices = Vec::new();
    let mut rest = &segment[bracket..];
    while !rest.is_empty() {
        let close = rest.find(']').ok_or(SonError::InvalidKey)?;
        if !rest.starts_with('[') {
            return Err(SonError::InvalidKey);
        }
        let digits = &rest[1..close];
        let idx: usize = digits.parse().map_err(|_| SonError::InvalidKey)?;
        indices.push(idx);
        rest = &rest[close + 1..];
    }
    Ok((key, indices))
}

/// Linear scan for `key` within the sibling chain `[start, end)`. Mirrors
/// `seek_key` in `son.c`.
fn seek_key<S: Read + Seek>(sink: &mut S, start: u64, end: u64, key: &str) -> Result<(Record, u64)> {
    let mut pos = start;
    loop {
        if pos >= end {
            return Err(SonError::KeyNotFound);
        }
        let rec = read_at(sink, pos)?;
        if rec.key[0] == 0 {
            return Err(SonError::InvalidKey);
        }
        if rec.key_str() == key {
            return Ok((rec, pos));
        }
        if rec.next_offset == 0 {
            return Err(SonError::KeyNotFound);
        }
        pos = rec.next_offset as u64;
    }
}

/// Step `index + 1` times over the array's child chain starting at `start`.
/// Mirrors `seek_array_key`.
fn seek_array_index<S: Read + Seek>(
    sink: &mut S,
    start: u64,
    end: u64,
    index: usize,
) -> Result<(Record, u64)> {
    let mut pos = start;
    if pos >= end {
        return Err(SonError::ArrayIndexNotFound);
    }
    let mut rec = read_at(sink, pos)?;
    for _ in 0..index {
        if rec.next_offset == 0 || rec.next_offset as u64 >= end {
            return Err(SonError::ArrayIndexNotFound);
        }
        pos = rec.next_offset as u64;
        rec = read_at(sink, pos)?;
    }
    Ok((rec, pos))
}

/// Resolve `access` against the container whose root record begins
/// immediately after the header, returning the matched record's position
/// and value-byte range.
pub fn resolve<S: Read + Seek>(sink: &mut S, access: &str) -> Result<ResolvedRecord> {
    if access.len() > SON_ACCESS_MAX_USER_SIZE {
        return Err(SonError::AccessTooLong);
    }

    let root_offset = HEADER_SIZE as u64;
    let root = read_at(sink, root_offset)?;
    if root.key_str() != ROOT_KEY || !root.kind.is_container() {
        return Err(SonError::InvalidRoot);
    }

    let root_next_offset = root.next_offset;
    let mut record = root;
    let mut record_offset = root_offset;
    let mut range_start = root_offset + RECORD_SIZE as u64;
    let mut range_end = root_next_offset as u64;

    if !access.is_empty() {
        for segment in access.split('.') {
            let (key, indices) = parse_segment(segment)?;

            let (rec, off) = seek_key(sink, range_start, range_end, key)?;
            record = rec;
            record_offset = off;
            range_start = record_offset + RECORD_SIZE as u64;
            range_end = record.next_offset as u64;

            for idx in indices {
                if record.kind != ValueKind::Array {
                    return Err(SonError::ArrayIndexNotFound);
                }
                let (rec, off) = seek_array_index(sink, range_start, range_end, idx)?;
                record = rec;
                record_offset = off;
                range_start = record_offset + RECORD_SIZE as u64;
                range_end = record.next_offset as u64;
            }
        }
    }

    let value_offset = record_offset + RECORD_SIZE as u64;
    let value_size = range_end.saturating_sub(value_offset);

    Ok(ResolvedRecord { record, record_offset, value_offset, value_size })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SonHeader;
    use std::io::{Cursor, Write};

    fn build_simple_container() -> Cursor<Vec<u8>> {
        // header + root OBJECT{ "a": U32(42) } sealed
        let mut buf = Vec::new();
        SonHeader::default().write(&mut buf).unwrap();
        let root_offset = buf.len() as u64;
        let mut root = Record::new(ValueKind::Object, ROOT_KEY);
        root.write(&mut buf).unwrap();
        let child_offset = buf.len() as u64;
        let mut child = Record::new(ValueKind::U32, "a");
        child.next_offset = (child_offset + RECORD_SIZE as u64 + 4) as u32;
        child.write(&mut buf).unwrap();
        buf.write_all(&42u32.to_le_bytes()).unwrap();
        let end = buf.len() as u64;

        // back-patch root's next_offset
        root.next_offset = end as u32;
        let mut tmp = Vec::new();
        root.write(&mut tmp).unwrap();
        buf[root_offset as usize..root_offset as usize + RECORD_SIZE].copy_from_slice(&tmp);

        Cursor::new(buf)
    }

    #[test]
    fn resolves_root_with_empty_access() {
        let mut sink = build_simple_container();
        let r = resolve(&mut sink, "").unwrap();
        assert_eq!(r.record.key_str(), ROOT_KEY);
    }

    #[test]
    fn resolves_a_direct_key() {
        let mut sink = build_simple_container();
        let r = resolve(&mut sink, "a").unwrap();
        assert_eq!(r.record.kind, ValueKind::U32);
        assert_eq!(r.value_size, 4);
    }

    #[test]
    fn missing_key_fails_key_not_found() {
        let mut sink = build_simple_container();
        assert!(matches!(resolve(&mut sink, "missing"), Err(SonError::KeyNotFound)));
    }

    #[test]
    fn access_string_too_long_is_rejected() {
        let mut sink = build_simple_container();
        let long = "x".repeat(SON_ACCESS_MAX_USER_SIZE + 1);
        assert!(matches!(resolve(&mut sink, &long), Err(SonError::AccessTooLong)));
    }

    #[test]
    fn parses_nested_bracket_indices() {
        let (key, indices) = parse_segment("arr[0][1]").unwrap();
        assert_eq!(key, "arr");
        assert_eq!(indices, vec![0, 1]);
    }
}
