//! Incremental frame reassembly
//!
//! TCP delivers the console stream in arbitrary chunks: a single read may hold
//! half a length header, or several frames back to back. [`FrameReassembler`]
//! accumulates bytes into a fixed buffer and hands out each frame once its
//! declared length has arrived.
//!
//! ## Wire Layout
//!
//! ```text
//! +----------------+---------+---------------------+
//! | length (u16BE) | tag (u8)| payload (length-1)  |
//! +----------------+---------+---------------------+
//! ```
//!
//! A length of zero is padding: the two header bytes are consumed and nothing
//! is emitted.

use tracing::trace;

use crate::types::Frame;

/// Size of the big-endian length header
pub const HEADER_LEN: usize = 2;

/// Largest body the length header can describe, rounded up to 64 KiB
pub const MAX_BODY_LEN: usize = 65536;

/// Capacity of the reassembly buffer
pub const BUFFER_LEN: usize = MAX_BODY_LEN + HEADER_LEN;

/// Stateful reassembler for one connection's byte stream
pub struct FrameReassembler {
    /// Backing storage; bytes past `count` are stale and never read
    buf: Box<[u8]>,

    /// Bytes of the current frame accumulated so far, header included
    count: usize,

    /// Body length of the current frame, `None` while awaiting the header
    frame_size: Option<usize>,
}

impl FrameReassembler {
    pub fn new() -> Self {
        Self { buf: vec![0u8; BUFFER_LEN].into_boxed_slice(), count: 0, frame_size: None }
    }

    /// Discard any partially accumulated frame
    pub fn reset(&mut self) {
        self.count = 0;
        self.frame_size = None;
    }

    /// Whether a frame is partially buffered
    pub fn is_idle(&self) -> bool {
        self.count == 0 && self.frame_size.is_none()
    }

    /// Bytes of the in-progress frame buffered so far
    pub fn buffered(&self) -> usize {
        self.count
    }

    /// Consume a chunk and return every frame it completes, in order
    pub fn feed(&mut self, mut data: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();

        while !data.is_empty() {
            let frame_size = match self.frame_size {
                Some(size) => size,
                None => {
                    let to_copy = (HEADER_LEN - self.count).min(data.len());
                    self.buf[self.count..self.count + to_copy].copy_from_slice(&data[..to_copy]);
                    self.count += to_copy;
                    data = &data[to_copy..];

                    if self.count < HEADER_LEN {
                        return frames;
                    }

                    let size = u16::from_be_bytes([self.buf[0], self.buf[1]]) as usize;
                    if size == 0 {
                        trace!("Skipping zero-length frame");
                        self.reset();
                        continue;
                    }
                    self.frame_size = Some(size);
                    size
                }
            };

            let need = frame_size - (self.count - HEADER_LEN);
            let to_copy = need.min(data.len());
            self.buf[self.count..self.count + to_copy].copy_from_slice(&data[..to_copy]);
            self.count += to_copy;
            data = &data[to_copy..];

            if to_copy == need {
                let body = &self.buf[HEADER_LEN..self.count];
                frames.push(Frame::new(body[0], body[1..].to_vec()));
                trace!(tag = body[0], len = frame_size, "Frame complete");
                self.reset();
            }
        }

        frames
    }
}

impl Default for FrameReassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameReassembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReassembler")
            .field("count", &self.count)
            .field("frame_size", &self.frame_size)
            .finish()
    }
}
