//! Frame stream over an async byte source

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use tokio::io::{AsyncRead, ReadBuf};
use tracing::trace;

use crate::protocol::FrameReassembler;
use crate::types::Frame;

/// Read buffer size; a socket read rarely returns more than this
const READ_CHUNK: usize = 8192;

pin_project! {
    /// Turns a byte stream into a stream of complete frames
    ///
    /// Owns its own [`FrameReassembler`], so every connection starts from a
    /// clean reassembly state. Yields `Err` once on a read error and then ends.
    pub struct FrameStream<R> {
        #[pin]
        reader: R,
        reassembler: FrameReassembler,
        ready: VecDeque<Frame>,
        chunk: Box<[u8]>,
        bytes_read: u64,
        done: bool,
    }
}

impl<R: AsyncRead> FrameStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            reassembler: FrameReassembler::new(),
            ready: VecDeque::new(),
            chunk: vec![0u8; READ_CHUNK].into_boxed_slice(),
            bytes_read: 0,
            done: false,
        }
    }

    /// Total bytes read from the underlying source
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: AsyncRead> Stream for FrameStream<R> {
    type Item = io::Result<Frame>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(frame) = this.ready.pop_front() {
                return Poll::Ready(Some(Ok(frame)));
            }
            if *this.done {
                return Poll::Ready(None);
            }

            let mut buf = ReadBuf::new(&mut this.chunk[..]);
            match ready!(this.reader.as_mut().poll_read(cx, &mut buf)) {
                Ok(()) => {
                    let filled = buf.filled();
                    if filled.is_empty() {
                        if !this.reassembler.is_idle() {
                            trace!(
                                buffered = this.reassembler.buffered(),
                                "Stream ended mid-frame, dropping partial frame"
                            );
                        }
                        *this.done = true;
                        return Poll::Ready(None);
                    }
                    *this.bytes_read += filled.len() as u64;
                    this.ready.extend(this.reassembler.feed(filled));
                }
                Err(e) => {
                    *this.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
            }
        }
    }
}
