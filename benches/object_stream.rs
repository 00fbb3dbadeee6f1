use std::collections::BTreeMap;

use criterion::{criterion_group, criterion_main, Criterion};
use pdfcore::{dictionary, Document, Object, ObjectStreamBuilder, ObjectStreamConfig};

fn sample_objects(count: u32) -> BTreeMap<(u32, u16), Object> {
    let mut objects = BTreeMap::new();
    for i in 1..=count {
        let dict = dictionary! {
            "Type" => "TestObj",
            "Value" => Object::Integer(i as i64),
        };
        objects.insert((i, 0), Object::Dictionary(dict));
    }
    objects
}

fn bench_object_stream_compress(c: &mut Criterion) {
    let objects = sample_objects(100);
    c.bench_function("object_stream_compress", |b| {
        b.iter(|| {
            let mut builder = ObjectStreamBuilder::new(ObjectStreamConfig::default());
            for (&(num, _), object) in &objects {
                builder.push(num, object.clone());
            }
            let _ = builder.build().unwrap();
        })
    });
}

fn bench_object_stream_parse(c: &mut Criterion) {
    let mut writer = pdfcore::Writer::new();
    for _ in 0..100 {
        let mut page = pdfcore::Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(writer.pages_id()));
        let page_id = writer.document_mut().add_object(page);
        writer.add_page(page_id).unwrap();
    }
    let mut buffer = Vec::new();
    writer
        .write_with_options(
            &mut buffer,
            pdfcore::SaveOptionsBuilder::new().use_object_streams(true).build(),
        )
        .unwrap();

    c.bench_function("object_stream_parse", |b| {
        b.iter(|| {
            Document::load_mem(&buffer).unwrap();
        })
    });
}

criterion_group!(benches, bench_object_stream_compress, bench_object_stream_parse);
criterion_main!(benches);
