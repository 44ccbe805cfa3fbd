//! ## pcapwatch-capture::pcap
//! **Stream framing for PCAP-style chunks**
//!
//! A chunk may open with the 24-byte global header, in which case its magic
//! number decides the byte order of every record length that follows. Without
//! a header the chunk is read little-endian. Records are a 16-byte header
//! followed by `captured_len` frame bytes.
//!
//! Corrupt framing is never fatal: when a record length is negative in the
//! signed wire view, shorter than an Ethernet header (zero included), or runs
//! past the end of the chunk, the cursor slides forward one byte and scanning
//! resumes from there.

use std::iter::FusedIterator;

use bytes::Bytes;

use crate::packet::Frame;

/// Smallest chunk worth scanning (one Ethernet header).
pub const MIN_FRAME_LEN: usize = 14;
/// Length of the one-time global header.
pub const GLOBAL_HEADER_LEN: usize = 24;
/// Length of the per-record header.
pub const RECORD_HEADER_LEN: usize = 16;

const CAPTURED_LEN_OFFSET: usize = 8;

/// Byte order of the record header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    Big,
    #[default]
    Little,
}

impl ByteOrder {
    /// Detects the byte order from the first two bytes of a global header.
    ///
    /// Both bytes must match: `A1 B2` is big-endian (micro- and nanosecond
    /// variants share it), `D4 C3` and `4D 3C` are the little-endian
    /// microsecond and nanosecond variants.
    pub fn from_magic(prefix: &[u8]) -> Option<Self> {
        match prefix {
            [0xA1, 0xB2, ..] => Some(ByteOrder::Big),
            [0xD4, 0xC3, ..] | [0x4D, 0x3C, ..] => Some(ByteOrder::Little),
            _ => None,
        }
    }

    #[inline]
    pub fn read_u32(self, raw: [u8; 4]) -> u32 {
        match self {
            ByteOrder::Big => u32::from_be_bytes(raw),
            ByteOrder::Little => u32::from_le_bytes(raw),
        }
    }
}

/// Outcome of parsing a single record at a cursor position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseStep {
    /// A complete record; `consumed` covers the record header and frame.
    Frame { frame: Frame, consumed: usize },
    /// Framing is inconsistent here; advance by this many bytes and retry.
    Skip(usize),
}

/// Parses the record whose header starts at `cursor`.
pub fn parse_record(chunk: &Bytes, cursor: usize, byte_order: ByteOrder) -> ParseStep {
    let len_at = cursor + CAPTURED_LEN_OFFSET;
    let Some(field) = chunk.get(len_at..len_at + 4) else {
        return ParseStep::Skip(1);
    };
    let Ok(raw) = <[u8; 4]>::try_from(field) else {
        return ParseStep::Skip(1);
    };
    let captured_len = byte_order.read_u32(raw);

    // Lengths above i32::MAX are negative on the wire and treated as corrupt.
    // A record too short to hold an Ethernet header can never decode.
    if captured_len < MIN_FRAME_LEN as u32 || captured_len > i32::MAX as u32 {
        return ParseStep::Skip(1);
    }

    let start = cursor + RECORD_HEADER_LEN;
    let end = match start.checked_add(captured_len as usize) {
        Some(end) if end <= chunk.len() => end,
        _ => return ParseStep::Skip(1),
    };

    ParseStep::Frame {
        frame: Frame::new(chunk.slice(start..end), byte_order),
        consumed: RECORD_HEADER_LEN + captured_len as usize,
    }
}

/// Splits capture chunks into frames.
#[derive(Default, Debug, Copy, Clone)]
pub struct FrameExtractor;

impl FrameExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Returns a lazy iterator over the frames contained in `chunk`.
    pub fn extract(&self, chunk: &Bytes) -> Frames {
        let mut cursor = 0;
        let mut byte_order = ByteOrder::default();
        let mut global_header = false;

        if chunk.len() < MIN_FRAME_LEN {
            cursor = chunk.len();
        } else if chunk.len() >= GLOBAL_HEADER_LEN {
            if let Some(order) = ByteOrder::from_magic(&chunk[..2]) {
                byte_order = order;
                global_header = true;
                cursor = GLOBAL_HEADER_LEN;
            }
        }

        Frames {
            chunk: chunk.clone(),
            cursor,
            byte_order,
            global_header,
            skipped: 0,
        }
    }
}

/// Frames of a single chunk, in buffer order.
#[derive(Debug)]
pub struct Frames {
    chunk: Bytes,
    cursor: usize,
    byte_order: ByteOrder,
    global_header: bool,
    skipped: usize,
}

impl Frames {
    /// Byte order used for this chunk's record headers.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Whether the chunk opened with a recognised global header.
    pub fn has_global_header(&self) -> bool {
        self.global_header
    }

    /// Bytes stepped over while resynchronising so far.
    pub fn skipped_bytes(&self) -> usize {
        self.skipped
    }
}

impl Iterator for Frames {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        // Strictly less: a trailing bare 16-byte header is never read.
        while self.cursor + RECORD_HEADER_LEN < self.chunk.len() {
            match parse_record(&self.chunk, self.cursor, self.byte_order) {
                ParseStep::Frame { frame, consumed } => {
                    self.cursor += consumed;
                    return Some(frame);
                }
                ParseStep::Skip(advance) => {
                    self.cursor += advance;
                    self.skipped += advance;
                }
            }
        }
        None
    }
}

impl FusedIterator for Frames {}
