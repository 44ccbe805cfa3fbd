//! pcapwatch‑capture
//!
//! Recovers link-layer frames from raw PCAP-framed byte chunks as they arrive
//! from a probe. Each chunk is framed on its own: a global header is honoured
//! only when it opens the chunk, and nothing is carried over between chunks.

pub mod packet;
pub mod pcap;
pub mod synth;

pub use packet::Frame;
pub use pcap::{ByteOrder, FrameExtractor, Frames, ParseStep};
