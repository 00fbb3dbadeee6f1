use criterion::{criterion_group, criterion_main, Criterion};
use pdfcore::{Dictionary, Document, Object, Permissions, Writer};

fn build_large_pdf() -> Vec<u8> {
    let mut writer = Writer::new();
    for i in 0..500 {
        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(writer.pages_id()));
        page.set("MediaBox", Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]));
        let content_id = writer
            .document_mut()
            .add_object(pdfcore::Stream::new(Dictionary::new(), format!("BT /F{i} 12 Tf ET").into_bytes()));
        page.set("Contents", Object::Reference(content_id));
        let page_id = writer.document_mut().add_object(page);
        writer.add_page(page_id).unwrap();
    }
    let mut bytes = Vec::new();
    writer.write(&mut bytes).unwrap();
    bytes
}

fn build_encrypted_pdf() -> Vec<u8> {
    let mut writer = Writer::new();
    writer.encrypt("user", "owner", 4, Permissions::from_bits_truncate(-4));
    let mut bytes = Vec::new();
    writer.write(&mut bytes).unwrap();
    bytes
}

fn bench_load_large(c: &mut Criterion) {
    let buffer = build_large_pdf();
    c.bench_function("load_large", |b| {
        b.iter(|| {
            Document::load_mem(&buffer).unwrap();
        })
    });
}

fn bench_load_encrypted(c: &mut Criterion) {
    let buffer = build_encrypted_pdf();
    c.bench_function("load_encrypted", |b| {
        b.iter(|| {
            let mut document = Document::load_mem(&buffer).unwrap();
            let _ = document.authenticate("user");
        })
    });
}

criterion_group!(benches, bench_load_large, bench_load_encrypted);
criterion_main!(benches);
