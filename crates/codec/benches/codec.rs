use bytes::BytesMut;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use stun_probe_codec::{
    Attributes,
    message::{Message, MessageEncoder, attributes::*, methods::*},
};

fn criterion_benchmark(c: &mut Criterion) {
    let token = [0x2eu8; 12];

    let request = {
        let mut buf = BytesMut::with_capacity(1280);
        MessageEncoder::new(BINDING_REQUEST, &token, &mut buf)
            .flush()
            .unwrap();
        buf.freeze()
    };

    let response = {
        let mut buf = BytesMut::with_capacity(1280);
        let mut encoder = MessageEncoder::new(BINDING_RESPONSE, &token, &mut buf);
        encoder.append::<XorMappedAddress>("104.187.79.178:53977".parse().unwrap());
        encoder.append::<MappedAddress>("104.187.79.178:53977".parse().unwrap());
        encoder.append::<ResponseOrigin>("104.187.79.1:3478".parse().unwrap());
        encoder.append::<OtherAddress>("104.187.79.2:3479".parse().unwrap());
        encoder.append::<Software>("stun-probe");
        encoder.flush().unwrap();
        buf.freeze()
    };

    let mut attributes = Attributes::default();
    let mut samples = [&request[..], &response[..]].into_iter().cycle();

    let mut stun_criterion = c.benchmark_group("stun");

    stun_criterion.throughput(Throughput::Elements(1));
    stun_criterion.bench_function("decode_binding_samples", |bencher| {
        bencher.iter(|| {
            Message::decode(samples.next().unwrap(), &mut attributes).unwrap();
        })
    });

    stun_criterion.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
