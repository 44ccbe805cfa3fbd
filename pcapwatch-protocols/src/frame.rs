//! ## pcapwatch-protocols::frame
//! Typed header fields of a decoded frame and the [`FrameView`] capability
//! through which consumers read them.

use std::net::IpAddr;

/// ICMP Echo-Request.
pub const ICMP_ECHO_REQUEST: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpHeader {
    pub source: IpAddr,
    pub destination: IpAddr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpFlags {
    pub fin: bool,
    pub syn: bool,
    pub rst: bool,
    pub psh: bool,
    pub ack: bool,
    pub urg: bool,
}

impl TcpFlags {
    /// Opening handshake segment: SYN without ACK.
    pub fn is_connection_request(&self) -> bool {
        self.syn && !self.ack
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpHeader {
    pub source_port: u16,
    pub destination_port: u16,
    pub flags: TcpFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpHeader {
    pub icmp_type: u8,
    pub code: u8,
}

impl IcmpHeader {
    pub fn is_echo_request(&self) -> bool {
        self.icmp_type == ICMP_ECHO_REQUEST
    }
}

/// Read access to the protocol layers of one frame.
///
/// Each accessor returns `None` when the layer is absent, so a partially
/// decoded frame is simply a view with fewer layers.
pub trait FrameView {
    /// Total length of the link-layer frame in bytes.
    fn frame_len(&self) -> usize;

    fn ip(&self) -> Option<IpHeader>;

    fn tcp(&self) -> Option<TcpHeader>;

    /// ICMPv4 header, if any.
    fn icmp(&self) -> Option<IcmpHeader>;

    fn is_ip(&self) -> bool {
        self.ip().is_some()
    }

    fn is_tcp(&self) -> bool {
        self.tcp().is_some()
    }

    fn is_icmp(&self) -> bool {
        self.icmp().is_some()
    }
}

/// Owned result of decoding a frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedFrame {
    pub len: usize,
    pub ip: Option<IpHeader>,
    pub tcp: Option<TcpHeader>,
    pub icmp: Option<IcmpHeader>,
}

impl FrameView for DecodedFrame {
    fn frame_len(&self) -> usize {
        self.len
    }

    fn ip(&self) -> Option<IpHeader> {
        self.ip
    }

    fn tcp(&self) -> Option<TcpHeader> {
        self.tcp
    }

    fn icmp(&self) -> Option<IcmpHeader> {
        self.icmp
    }
}
