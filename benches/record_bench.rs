use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sonrs::record::{Record, ValueKind};
use sonrs::path;
use sonrs::writer::SonWriter;
use std::io::Cursor;

fn bench_record_round_trip(c: &mut Criterion) {
    let rec = Record::new(ValueKind::U32, "benchmark_key");
    c.bench_function("record_encode", |b| {
        b.iter(|| {
            let mut buf = Vec::new();
            black_box(&rec).write(&mut buf).unwrap();
            buf
        })
    });

    let mut buf = Vec::new();
    rec.write(&mut buf).unwrap();
    c.bench_function("record_decode", |b| {
        b.iter(|| Record::read(black_box(&buf[..])).unwrap())
    });
}

fn bench_path_resolve(c: &mut Criterion) {
    let mut w = SonWriter::create(Cursor::new(Vec::new()), 4).unwrap();
    w.open_container(ValueKind::Object, "").unwrap();
    for i in 0..64 {
        w.write_unum(&format!("key_{i}"), i as u32).unwrap();
    }
    w.close_container().unwrap();
    let mut buf = w.close().unwrap();

    c.bench_function("path_resolve_last_of_64", |b| {
        b.iter(|| path::resolve(black_box(&mut buf), "key_63").unwrap())
    });
}

criterion_group!(benches, bench_record_round_trip, bench_path_resolve);
criterion_main!(benches);
