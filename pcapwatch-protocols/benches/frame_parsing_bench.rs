#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};

use pcapwatch_protocols::{EthernetParser, FrameParser};

// Ethernet II + IPv4 + TCP SYN, 10.0.0.5:40000 -> 10.0.0.1:80
const TCP_SYN_FRAME: &[u8] = &[
    0x02, 0x00, 0x00, 0x00, 0x00, 0x02, 0x02, 0x00, 0x00, 0x00, 0x00, 0x01, 0x08, 0x00, // Ethernet
    0x45, 0x00, 0x00, 0x28, 0x00, 0x00, 0x40, 0x00, 0x40, 0x06, 0x00, 0x00, // IPv4
    0x0A, 0x00, 0x00, 0x05, 0x0A, 0x00, 0x00, 0x01, // Addresses
    0x9C, 0x40, 0x00, 0x50, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, // Ports, seq, ack
    0x50, 0x02, 0xFA, 0xF0, 0x00, 0x00, 0x00, 0x00, // Offset, SYN, window
];

// Ethernet II + IPv4 + ICMP Echo-Request
const ICMP_ECHO_FRAME: &[u8] = &[
    0x02, 0x00, 0x00, 0x00, 0x00, 0x02, 0x02, 0x00, 0x00, 0x00, 0x00, 0x01, 0x08, 0x00, // Ethernet
    0x45, 0x00, 0x00, 0x1C, 0x00, 0x00, 0x40, 0x00, 0x40, 0x01, 0x00, 0x00, // IPv4
    0x0A, 0x00, 0x00, 0x05, 0x0A, 0x00, 0x00, 0x01, // Addresses
    0x08, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, // Echo-Request
];

fn benchmark_tcp_parsing(c: &mut Criterion) {
    let parser = EthernetParser::new();
    c.bench_function("ethernet_tcp_parsing", |b| {
        b.iter(|| {
            black_box(parser.parse(black_box(TCP_SYN_FRAME))).unwrap();
        })
    });
}

fn benchmark_icmp_parsing(c: &mut Criterion) {
    let parser = EthernetParser::new();
    c.bench_function("ethernet_icmp_parsing", |b| {
        b.iter(|| {
            black_box(parser.parse(black_box(ICMP_ECHO_FRAME))).unwrap();
        })
    });
}

criterion_group!(benches, benchmark_tcp_parsing, benchmark_icmp_parsing);
criterion_main!(benches);
