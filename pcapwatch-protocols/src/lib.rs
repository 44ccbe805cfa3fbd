//! # pcapwatch Protocol Decoding
//!
//! Turns raw link-layer frames into the handful of header fields the feature
//! extractor needs: IP addresses, TCP ports and flags, and the ICMP type.

pub mod ethernet;
pub mod frame;

pub use ethernet::{EthernetParser, FrameParseError, FrameParser};
pub use frame::{DecodedFrame, FrameView, IcmpHeader, IpHeader, TcpFlags, TcpHeader};
