/// A frame recovered from a capture chunk.
use bytes::Bytes;

use crate::pcap::ByteOrder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Link-layer bytes, sliced out of the chunk without copying.
    pub data: Bytes,
    /// Byte order the enclosing record header was read with.
    pub byte_order: ByteOrder,
}

impl Frame {
    pub fn new(data: Bytes, byte_order: ByteOrder) -> Self {
        Frame { data, byte_order }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
