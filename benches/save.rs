use criterion::{criterion_group, criterion_main, Criterion};
use pdfcore::{Dictionary, Object, SaveOptionsBuilder, Writer};

fn build_writer(pages: u32) -> Writer {
    let mut writer = Writer::new();
    for _ in 0..pages {
        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(writer.pages_id()));
        let page_id = writer.document_mut().add_object(page);
        writer.add_page(page_id).unwrap();
    }
    writer
}

fn bench_save_standard(c: &mut Criterion) {
    c.bench_function("save_standard", |b| {
        b.iter_batched(
            || build_writer(200),
            |writer| {
                let mut output = Vec::new();
                writer.write(&mut output).unwrap();
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_save_object_streams(c: &mut Criterion) {
    c.bench_function("save_object_streams", |b| {
        b.iter_batched(
            || build_writer(200),
            |writer| {
                let mut output = Vec::new();
                writer
                    .write_with_options(&mut output, SaveOptionsBuilder::new().use_object_streams(true).build())
                    .unwrap();
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_save_standard, bench_save_object_streams);
criterion_main!(benches);
