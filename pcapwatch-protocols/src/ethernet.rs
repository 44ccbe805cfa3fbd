//! ## pcapwatch-protocols::ethernet
//! Ethernet II frame decoder backed by `etherparse` slicing.
//!
//! Only the fields the detectors read are lifted out; checksums are not
//! verified. Frames whose headers cannot be sliced are rejected with
//! [`FrameParseError`] and never reach the counters.

use std::net::IpAddr;

use etherparse::{NetSlice, SlicedPacket, TransportSlice};
use thiserror::Error;

use crate::frame::{DecodedFrame, IcmpHeader, IpHeader, TcpFlags, TcpHeader};

/// Errors that can occur while decoding a frame.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum FrameParseError {
    #[error("Empty frame")]
    Empty,
    #[error("Frame not decodable: {0}")]
    Undecodable(String),
}

/// Decodes raw frame bytes into header fields.
pub trait FrameParser: Send + Sync {
    type Frame: crate::frame::FrameView;

    fn parse(&self, raw: &[u8]) -> Result<Self::Frame, FrameParseError>;
}

#[derive(Default, Debug, Copy, Clone)]
pub struct EthernetParser;

impl EthernetParser {
    pub fn new() -> Self {
        Self
    }

    fn ip_header(sliced: &SlicedPacket<'_>) -> Option<IpHeader> {
        match &sliced.net {
            Some(NetSlice::Ipv4(ipv4)) => {
                let header = ipv4.header();
                Some(IpHeader {
                    source: IpAddr::from(header.source_addr()),
                    destination: IpAddr::from(header.destination_addr()),
                })
            }
            Some(NetSlice::Ipv6(ipv6)) => {
                let header = ipv6.header();
                Some(IpHeader {
                    source: IpAddr::from(header.source_addr()),
                    destination: IpAddr::from(header.destination_addr()),
                })
            }
            _ => None,
        }
    }
}

impl FrameParser for EthernetParser {
    type Frame = DecodedFrame;

    fn parse(&self, raw: &[u8]) -> Result<DecodedFrame, FrameParseError> {
        if raw.is_empty() {
            return Err(FrameParseError::Empty);
        }
        let sliced = SlicedPacket::from_ethernet(raw)
            .map_err(|e| FrameParseError::Undecodable(e.to_string()))?;

        let mut frame = DecodedFrame {
            len: raw.len(),
            ip: Self::ip_header(&sliced),
            ..Default::default()
        };

        match &sliced.transport {
            Some(TransportSlice::Tcp(tcp)) => {
                frame.tcp = Some(TcpHeader {
                    source_port: tcp.source_port(),
                    destination_port: tcp.destination_port(),
                    flags: TcpFlags {
                        fin: tcp.fin(),
                        syn: tcp.syn(),
                        rst: tcp.rst(),
                        psh: tcp.psh(),
                        ack: tcp.ack(),
                        urg: tcp.urg(),
                    },
                });
            }
            Some(TransportSlice::Icmpv4(icmp)) => {
                frame.icmp = Some(IcmpHeader {
                    icmp_type: icmp.type_u8(),
                    code: icmp.code_u8(),
                });
            }
            _ => {}
        }

        Ok(frame)
    }
}
