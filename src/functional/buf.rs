//! Minimal slice-cursor abstraction used by the decoders in [`crate::vint`]
//! and [`crate::index`].

/// A contiguous, read-only buffer of bytes that can be advanced.
pub trait Buf: std::fmt::Debug {
    /// Number of bytes not yet consumed.
    fn remaining(&self) -> usize;
    /// Borrow the next `size` bytes without consuming them.
    fn slice(&self, size: usize) -> &[u8];
    /// Consume `n` bytes from the front of the buffer.
    fn advance(&mut self, n: usize);
    /// Whether any bytes remain.
    fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }
}

impl Buf for &[u8] {
    fn remaining(&self) -> usize {
        self.len()
    }

    fn slice(&self, size: usize) -> &[u8] {
        &self[..size]
    }

    fn advance(&mut self, n: usize) {
        *self = &self[n..];
    }
}
