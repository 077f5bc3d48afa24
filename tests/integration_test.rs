use sonrs::editor::SonEditor;
use sonrs::error::SonError;
use sonrs::json;
use sonrs::reader::SonReader;
use sonrs::record::ValueKind;
use sonrs::writer::SonWriter;
use std::fs::{File, OpenOptions};
use std::path::Path;
use tempfile::NamedTempFile;

/// A writer's sink must support both directions: `close_container` seeks
/// back and re-reads the record it is about to back-patch.
fn create_rw(path: &Path) -> File {
    OpenOptions::new().read(true).write(true).create(true).truncate(true).open(path).unwrap()
}

#[test]
fn empty_root_has_the_documented_byte_layout() {
    let temp = NamedTempFile::new().unwrap();
    let path = temp.path().to_path_buf();

    {
        let file = create_rw(&path);
        let mut w = SonWriter::create(file, 4).unwrap();
        w.open_container(ValueKind::Object, "").unwrap();
        w.close_container().unwrap();
        w.close().unwrap();
    }

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 4 + 24);
    let root = sonrs::record::Record::read(&bytes[4..]).unwrap();
    assert_eq!(root.next_offset, 28);
}

#[test]
fn primitive_values_round_trip_through_a_file() {
    let temp = NamedTempFile::new().unwrap();
    let path = temp.path().to_path_buf();

    {
        let file = create_rw(&path);
        let mut w = SonWriter::create(file, 4).unwrap();
        w.open_container(ValueKind::Object, "").unwrap();
        w.write_unum("a", 42).unwrap();
        w.write_str("b", "hi").unwrap();
        w.close_container().unwrap();
        w.close().unwrap();
    }

    let file = File::open(&path).unwrap();
    let mut r = SonReader::open(file);
    assert_eq!(r.read_unum("a").unwrap(), 42);
    assert_eq!(r.read_str("b").unwrap(), "hi");
    assert_eq!(r.read_num("b").unwrap(), 0);
    assert_eq!(r.read_float("a").unwrap(), 42.0);
}

#[test]
fn nested_array_supports_indexed_reads() {
    let temp = NamedTempFile::new().unwrap();
    let path = temp.path().to_path_buf();

    {
        let file = create_rw(&path);
        let mut w = SonWriter::create(file, 4).unwrap();
        w.open_container(ValueKind::Object, "").unwrap();
        w.open_container(ValueKind::Array, "arr").unwrap();
        w.write_unum("0", 10).unwrap();
        w.write_unum("1", 20).unwrap();
        w.write_unum("2", 30).unwrap();
        w.close_container().unwrap();
        w.close_container().unwrap();
        w.close().unwrap();
    }

    let file = File::open(&path).unwrap();
    let mut r = SonReader::open(file);
    assert_eq!(r.read_unum("arr[0]").unwrap(), 10);
    assert_eq!(r.read_unum("arr[2]").unwrap(), 30);
    assert!(matches!(r.read_unum("arr[3]"), Err(SonError::ArrayIndexNotFound)));
}

#[test]
fn deep_dotted_path_resolves_through_nested_objects() {
    let temp = NamedTempFile::new().unwrap();
    let path = temp.path().to_path_buf();

    {
        let file = create_rw(&path);
        let mut w = SonWriter::create(file, 4).unwrap();
        w.open_container(ValueKind::Object, "").unwrap();
        w.open_container(ValueKind::Object, "make").unwrap();
        w.open_container(ValueKind::Object, "model").unwrap();
        w.write_str("color", "red").unwrap();
        w.close_container().unwrap();
        w.close_container().unwrap();
        w.close_container().unwrap();
        w.close().unwrap();
    }

    let file = File::open(&path).unwrap();
    let mut r = SonReader::open(file);
    assert_eq!(r.read_str("make.model.color").unwrap(), "red");
}

#[test]
fn type_mismatched_edit_leaves_the_float_untouched() {
    let temp = NamedTempFile::new().unwrap();
    let path = temp.path().to_path_buf();

    {
        let file = create_rw(&path);
        let mut w = SonWriter::create(file, 4).unwrap();
        w.open_container(ValueKind::Object, "").unwrap();
        w.write_float("x", 3.25).unwrap();
        w.close_container().unwrap();
        w.close().unwrap();
    }

    {
        let file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
        let mut e = SonEditor::open(file);
        assert!(matches!(e.edit_num("x", 5), Err(SonError::EditTypeMismatch)));
    }

    let file = File::open(&path).unwrap();
    let mut r = SonReader::open(file);
    assert_eq!(r.read_float("x").unwrap(), 3.25);
}

#[test]
fn append_adds_siblings_without_disturbing_earlier_values() {
    let temp = NamedTempFile::new().unwrap();
    let path = temp.path().to_path_buf();

    {
        let file = create_rw(&path);
        let mut w = SonWriter::create(file, 4).unwrap();
        w.open_container(ValueKind::Object, "").unwrap();
        w.write_unum("first", 1).unwrap();
        w.close_container().unwrap();
        w.close().unwrap();
    }

    {
        let file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
        let mut w = SonWriter::append(file, 4).unwrap();
        w.write_unum("second", 2).unwrap();
        w.close_container().unwrap();
        w.close().unwrap();
    }

    let file = File::open(&path).unwrap();
    let mut r = SonReader::open(file);
    assert_eq!(r.read_unum("first").unwrap(), 1);
    assert_eq!(r.read_unum("second").unwrap(), 2);
}

#[test]
fn cat_exports_the_same_tree_as_json() {
    let temp = NamedTempFile::new().unwrap();
    let path = temp.path().to_path_buf();

    {
        let file = create_rw(&path);
        let mut w = SonWriter::create(file, 4).unwrap();
        w.open_container(ValueKind::Object, "").unwrap();
        w.write_unum("n", 7).unwrap();
        w.write_data("blob", b"ab").unwrap();
        w.close_container().unwrap();
        w.close().unwrap();
    }

    let mut file = File::open(&path).unwrap();
    let mut out = Vec::new();
    json::export(&mut file, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), r#"{"n":7,"blob":"YWI="}"#);
}

#[test]
fn opening_more_containers_than_stack_capacity_fails_cleanly() {
    let mut w = SonWriter::create(std::io::Cursor::new(Vec::new()), 2).unwrap();
    w.open_container(ValueKind::Object, "").unwrap();
    w.open_container(ValueKind::Object, "child").unwrap();
    assert!(matches!(
        w.open_container(ValueKind::Object, "grandchild"),
        Err(SonError::StackOverflow)
    ));
}
