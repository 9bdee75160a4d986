use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use opsgate::engine::matcher::{CredentialEntry, CredentialTable};
use opsgate::protocol::codec::LineCodec;
use opsgate::protocol::command::Line;
use tokio_util::codec::Decoder;

fn bench_codec_decode(c: &mut Criterion) {
    let mut codec = LineCodec::new();
    let data = b":alice!ali@ops.admin.example.com KILL bob :flooding the channel\r\n";

    c.bench_function("codec_decode_kill", |b| {
        b.iter(|| {
            let mut src = BytesMut::from(&data[..]);
            let _ = codec.decode(black_box(&mut src));
        })
    });
}

fn bench_line_decode(c: &mut Criterion) {
    c.bench_function("line_parse_and_decode_oper", |b| {
        b.iter(|| {
            let line = Line::parse(black_box("OPER root hunter2")).ok();
            line.map(|l| l.decode())
        })
    });
}

fn bench_credential_lookup(c: &mut Criterion) {
    let mut entries: Vec<CredentialEntry> = (0..64)
        .map(|i| CredentialEntry::new(format!("*@*.site{}.example.com", i), "ops", "pw"))
        .collect();
    entries.push(CredentialEntry::new("*@*.admin.example.com", "root", "hunter2"));
    let table = CredentialTable::new(entries);

    c.bench_function("credential_lookup_last_of_65", |b| {
        b.iter(|| {
            let _ = table.lookup(black_box("ali@ops.admin.example.com"));
        })
    });
}

criterion_group!(
    benches,
    bench_codec_decode,
    bench_line_decode,
    bench_credential_lookup
);
criterion_main!(benches);
