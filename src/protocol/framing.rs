//! Reassembly of `;`-terminated records across socket reads.

use tracing::warn;

/// Longest unterminated tail kept between reads. A tracking record is
/// about 100 bytes.
pub const MAX_PENDING_BYTES: usize = 64 * 1024;

/// Holds the unterminated tail of a connection's byte stream.
///
/// TCP reads split records at arbitrary byte offsets, so everything after
/// the last separator is carried over and prefixed to the next read. A
/// tail longer than the limit cannot be a record and is discarded.
#[derive(Debug)]
pub struct FrameBuffer {
    pending: Vec<u8>,
    max_pending: usize,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::with_limit(MAX_PENDING_BYTES)
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_pending: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_pending,
        }
    }

    /// Appends `bytes` and returns every complete record received so far,
    /// still `;`-terminated, or `None` when no separator has arrived yet.
    pub fn push(&mut self, bytes: &[u8]) -> Option<String> {
        self.pending.extend_from_slice(bytes);
        let complete = self
            .pending
            .iter()
            .rposition(|b| *b == b';')
            .map(|end| self.pending.drain(..=end).collect::<Vec<u8>>());

        if self.pending.len() > self.max_pending {
            warn!(
                "Discarding {} bytes without a record separator",
                self.pending.len()
            );
            self.pending = Vec::new();
        }

        complete.map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Drains whatever is left at end of stream, terminated so the decoder
    /// treats it as a final record.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let text = String::from_utf8_lossy(&rest);
        if text.trim().is_empty() {
            return None;
        }
        Some(format!("{};", text.trim_end()))
    }

    #[cfg(test)]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
