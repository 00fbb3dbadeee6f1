use criterion::{criterion_group, criterion_main, Criterion};
use pdfcore::{Dictionary, Document, IncrementalDocument, Object, Writer};

fn build_sample_pdf(pages: u32) -> Vec<u8> {
    let mut writer = Writer::new();
    for _ in 0..pages {
        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(writer.pages_id()));
        page.set("MediaBox", Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]));
        let page_id = writer.document_mut().add_object(page);
        writer.add_page(page_id).unwrap();
    }
    let mut bytes = Vec::new();
    writer.write(&mut bytes).unwrap();
    bytes
}

fn bench_load(c: &mut Criterion) {
    let buffer = build_sample_pdf(50);
    c.bench_function("load", |b| {
        b.iter(|| {
            Document::load_mem(&buffer).unwrap();
        })
    });
}

fn bench_load_incremental_pdf(c: &mut Criterion) {
    let original = build_sample_pdf(50);
    let mut incremental: IncrementalDocument = original.as_slice().try_into().unwrap();
    let info_id = incremental.document().trailer.get(b"Info").unwrap().as_reference().unwrap();
    let mut info = Dictionary::new();
    info.set("Title", Object::string_literal(b"Benchmark".to_vec()));
    incremental.document_mut().set_object(info_id, info);
    let mut buffer = Vec::new();
    incremental.save(&mut buffer).unwrap();

    c.bench_function("load_incremental_pdf", |b| {
        b.iter(|| {
            Document::load_mem(&buffer).unwrap();
        })
    });
}

criterion_group!(benches, bench_load, bench_load_incremental_pdf);
criterion_main!(benches);
