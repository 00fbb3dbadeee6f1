use criterion::{criterion_group, criterion_main, Criterion};
use pdfcore::{dictionary, filters};

fn sample_content() -> Vec<u8> {
    (0..64 * 1024).map(|i| (i % 251) as u8).collect()
}

fn bench_flate_round_trip(c: &mut Criterion) {
    let content = sample_content();
    let dict = dictionary! { "Filter" => "FlateDecode" };
    c.bench_function("flate_round_trip", |b| {
        b.iter(|| {
            let encoded = filters::encode_stream(&dict, &content).unwrap();
            let decoded = filters::decode_stream(&dict, &encoded, None).unwrap();
            assert_eq!(decoded, content);
        })
    });
}

fn bench_lzw_round_trip(c: &mut Criterion) {
    let content = sample_content();
    let dict = dictionary! { "Filter" => "LZWDecode" };
    c.bench_function("lzw_round_trip", |b| {
        b.iter(|| {
            let encoded = filters::encode_stream(&dict, &content).unwrap();
            let decoded = filters::decode_stream(&dict, &encoded, None).unwrap();
            assert_eq!(decoded, content);
        })
    });
}

fn bench_ascii85_round_trip(c: &mut Criterion) {
    let content = sample_content();
    let dict = dictionary! { "Filter" => "ASCII85Decode" };
    c.bench_function("ascii85_round_trip", |b| {
        b.iter(|| {
            let encoded = filters::encode_stream(&dict, &content).unwrap();
            let decoded = filters::decode_stream(&dict, &encoded, None).unwrap();
            assert_eq!(decoded, content);
        })
    });
}

criterion_group!(benches, bench_flate_round_trip, bench_lzw_round_trip, bench_ascii85_round_trip);
criterion_main!(benches);
