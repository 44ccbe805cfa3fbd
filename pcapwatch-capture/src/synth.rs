//! # Synthetic capture streams
//!
//! Builders for PCAP byte streams and minimal Ethernet frames, used by tests,
//! benchmarks and local replays. Timestamps are always zero.

use std::net::Ipv4Addr;

use bytes::{BufMut, Bytes, BytesMut};

use crate::pcap::ByteOrder;

pub const TCP_FIN: u8 = 0x01;
pub const TCP_SYN: u8 = 0x02;
pub const TCP_RST: u8 = 0x04;
pub const TCP_PSH: u8 = 0x08;
pub const TCP_ACK: u8 = 0x10;

const LINKTYPE_ETHERNET: u32 = 1;
const SNAPLEN: u32 = 65_535;

/// Builds a PCAP byte stream record by record.
#[derive(Debug, Clone)]
pub struct PcapStreamBuilder {
    byte_order: ByteOrder,
    buf: BytesMut,
}

impl PcapStreamBuilder {
    /// Starts a stream without a global header.
    pub fn new(byte_order: ByteOrder) -> Self {
        Self {
            byte_order,
            buf: BytesMut::new(),
        }
    }

    /// Starts a stream with a microsecond global header in `byte_order`.
    pub fn with_global_header(byte_order: ByteOrder) -> Self {
        let mut builder = Self::new(byte_order);
        builder.put_u32(0xA1B2_C3D4);
        builder.put_u16(2);
        builder.put_u16(4);
        builder.put_u32(0); // thiszone
        builder.put_u32(0); // sigfigs
        builder.put_u32(SNAPLEN);
        builder.put_u32(LINKTYPE_ETHERNET);
        builder
    }

    /// Appends a well-formed record carrying `frame`.
    pub fn record(self, frame: &[u8]) -> Self {
        self.corrupt_record(frame.len() as u32, frame)
    }

    /// Appends a record whose length field says `captured_len` regardless of
    /// how many bytes actually follow.
    pub fn corrupt_record(mut self, captured_len: u32, frame: &[u8]) -> Self {
        self.put_u32(0);
        self.put_u32(0);
        self.put_u32(captured_len);
        self.put_u32(captured_len);
        self.buf.put_slice(frame);
        self
    }

    /// Appends raw bytes.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.put_slice(bytes);
        self
    }

    pub fn build(self) -> Bytes {
        self.buf.freeze()
    }

    fn put_u32(&mut self, value: u32) {
        match self.byte_order {
            ByteOrder::Big => self.buf.put_u32(value),
            ByteOrder::Little => self.buf.put_u32_le(value),
        }
    }

    fn put_u16(&mut self, value: u16) {
        match self.byte_order {
            ByteOrder::Big => self.buf.put_u16(value),
            ByteOrder::Little => self.buf.put_u16_le(value),
        }
    }
}

fn ethernet_ipv4(buf: &mut BytesMut, src: Ipv4Addr, dst: Ipv4Addr, protocol: u8, payload_len: u16) {
    buf.put_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x02]);
    buf.put_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
    buf.put_u16(0x0800);

    buf.put_u8(0x45);
    buf.put_u8(0);
    buf.put_u16(20 + payload_len);
    buf.put_u16(0);
    buf.put_u16(0x4000); // don't fragment
    buf.put_u8(64);
    buf.put_u8(protocol);
    buf.put_u16(0); // checksum is not verified by the decoder
    buf.put_slice(&src.octets());
    buf.put_slice(&dst.octets());
}

/// A 54-byte Ethernet + IPv4 + TCP frame with no payload.
pub fn ipv4_tcp_frame(src: Ipv4Addr, dst: Ipv4Addr, src_port: u16, dst_port: u16, flags: u8) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(54);
    ethernet_ipv4(&mut buf, src, dst, 6, 20);

    buf.put_u16(src_port);
    buf.put_u16(dst_port);
    buf.put_u32(1);
    buf.put_u32(0);
    buf.put_u8(0x50);
    buf.put_u8(flags);
    buf.put_u16(64_240);
    buf.put_u16(0);
    buf.put_u16(0);
    buf.to_vec()
}

/// A 42-byte Ethernet + IPv4 + ICMP frame of the given type.
pub fn ipv4_icmp_frame(src: Ipv4Addr, dst: Ipv4Addr, icmp_type: u8) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(42);
    ethernet_ipv4(&mut buf, src, dst, 1, 8);

    buf.put_u8(icmp_type);
    buf.put_u8(0);
    buf.put_u16(0);
    buf.put_u16(1);
    buf.put_u16(1);
    buf.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_sizes() {
        let a = Ipv4Addr::new(10, 0, 0, 1);
        let b = Ipv4Addr::new(10, 0, 0, 2);
        assert_eq!(ipv4_tcp_frame(a, b, 1234, 80, TCP_SYN).len(), 54);
        assert_eq!(ipv4_icmp_frame(a, b, 8).len(), 42);
    }

    #[test]
    fn global_header_magic_follows_byte_order() {
        let big = PcapStreamBuilder::with_global_header(ByteOrder::Big).build();
        let little = PcapStreamBuilder::with_global_header(ByteOrder::Little).build();
        assert_eq!(&big[..4], &[0xA1, 0xB2, 0xC3, 0xD4]);
        assert_eq!(&little[..4], &[0xD4, 0xC3, 0xB2, 0xA1]);
        assert_eq!(big.len(), 24);
    }
}
