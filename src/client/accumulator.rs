//! Received-but-unparsed response bytes.
//!
//! Parsed lines are consumed from the head with `BytesMut::advance`, so the
//! buffer only ever holds what the parser has not looked at yet.

use bytes::{Buf, BytesMut};

const INITIAL_CAPACITY: usize = 1024;

#[derive(Debug)]
pub struct Accumulator {
    buf: BytesMut,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new(INITIAL_CAPACITY)
    }
}

impl Accumulator {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn data(&self) -> &[u8] {
        &self.buf[..]
    }

    /// Drops `n` bytes from the front.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        self.buf.advance(n);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn has_bytes(&self, n: usize) -> bool {
        self.buf.len() >= n
    }
}
