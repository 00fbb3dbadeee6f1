use chrono::prelude::{Timelike, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use pdfcore::Object;

fn create_and_parse_datetime(c: &mut Criterion) {
    c.bench_function("create_and_parse_datetime", |b| {
        b.iter(|| {
            let time = Utc::now().with_nanosecond(0).unwrap();
            let text: Object = time.into();
            let parsed = text.as_datetime();
            assert!(parsed.is_some());
        });
    });
}

fn bench_integer_write(c: &mut Criterion) {
    c.bench_function("integer_write", |b| {
        b.iter(|| {
            let mut writer = pdfcore::Writer::new();
            writer.document_mut().add_object(Object::Integer(5));
            let mut buf = Vec::new();
            writer.write(&mut buf).unwrap();
        })
    });
}

fn bench_floating_point_write(c: &mut Criterion) {
    c.bench_function("floating_point_write", |b| {
        b.iter(|| {
            let mut writer = pdfcore::Writer::new();
            writer.document_mut().add_object(Object::Real(5.0));
            let mut buf = Vec::new();
            writer.write(&mut buf).unwrap();
        })
    });
}

fn bench_boolean_write(c: &mut Criterion) {
    c.bench_function("boolean_write", |b| {
        b.iter(|| {
            let mut writer = pdfcore::Writer::new();
            writer.document_mut().add_object(Object::Boolean(false));
            let mut buf = Vec::new();
            writer.write(&mut buf).unwrap();
        })
    });
}

criterion_group!(
    benches,
    create_and_parse_datetime,
    bench_integer_write,
    bench_floating_point_write,
    bench_boolean_write
);
criterion_main!(benches);
