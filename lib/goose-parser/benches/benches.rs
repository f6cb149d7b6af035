use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use goose_parser::test_util::{FrameBuilder, sample_pdu};
use goose_parser::{EthernetFrame, GooseHeader, decode_apdu};

fn benchmark_decode_apdu(c: &mut Criterion) {
    let pdu = sample_pdu();

    let mut group = c.benchmark_group("goose-parser/apdu");
    group.throughput(Throughput::Bytes(pdu.len() as u64));
    group.bench_function("decode", |b| {
        b.iter_batched(
            || pdu.clone(),
            |pdu| decode_apdu(&pdu),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn benchmark_decode_frame(c: &mut Criterion) {
    let frame = FrameBuilder::new().vlan(0x8005).padding(16).build();

    let mut group = c.benchmark_group("goose-parser/frame");
    group.throughput(Throughput::Bytes(frame.len() as u64));
    group.bench_function("ethernet+header+apdu", |b| {
        b.iter(|| {
            let ethernet = EthernetFrame::parse(&frame).ok()?;
            let (_, apdu) = GooseHeader::parse(ethernet.payload).ok()?;
            decode_apdu(apdu).ok()
        })
    });
    group.finish();
}

criterion_group!(benches, benchmark_decode_apdu, benchmark_decode_frame);
criterion_main!(benches);
