use bytes::BytesMut;
use tracing::trace;

use crate::codec::buffer::{decode_hex, remove_block, substring_index};
use crate::protocol::TransferError;

/// Incremental, in-place decoder for chunked transfer encoding.
///
/// The decoder collapses framing bytes out of the receive buffer as they
/// arrive, so the buffer prefix `[0, idx)` is always pure payload ready
/// for delivery. `len` counts the bytes of the current chunk whose size
/// line has been consumed but whose payload has not yet fully arrived.
/// Invariant while stable: `idx + len <= buf.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChunkedDecoder {
    idx: usize,
    len: usize,
}

/// Progress made by one [`ChunkedDecoder::collapse`] pass.
#[derive(Debug)]
pub(crate) struct Collapsed {
    /// Payload bytes newly realized into the collapsed prefix.
    pub newly: usize,
    /// The zero-size terminating chunk has been consumed.
    pub finished: bool,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { idx: 0, len: 0 }
    }

    /// End of the collapsed payload prefix in the buffer.
    pub fn payload_end(&self) -> usize {
        self.idx
    }

    /// Account for `n` payload bytes removed from the front of the buffer.
    pub fn discard_payload(&mut self, n: usize) {
        debug_assert!(n <= self.idx);
        self.idx -= n;
    }

    /// Collapse as much framing as the buffered bytes allow.
    ///
    /// Chunk extensions are discarded with the size line. A CRLF already
    /// buffered after the zero-size chunk (the empty-trailer terminator)
    /// is consumed, but completion does not wait for one. Returns how
    /// many payload bytes were newly collapsed and whether the terminator
    /// was seen; stops silently whenever more data is needed.
    pub fn collapse(&mut self, buf: &mut BytesMut) -> Result<Collapsed, TransferError> {
        let mut newly = 0;

        loop {
            let pos = self.idx + self.len;

            // smallest useful remainder is a "0\r\n" size line
            if pos + 3 > buf.len() {
                break;
            }

            // nothing is mutated until the whole size line (and, past the
            // first chunk, the payload CRLF before it) is buffered
            let line_start = if self.len > 0 {
                if &buf[pos..pos + 2] != b"\r\n" {
                    return Err(TransferError::InvalidChunkEnd {
                        reason: "missing CRLF after chunk payload",
                    });
                }
                2
            } else {
                0
            };

            let line_len = match substring_index(&buf[pos + line_start..], b"\r\n") {
                Some(0) => {
                    return Err(TransferError::InvalidChunkSize { reason: "empty chunk size line" })
                }
                Some(n) => n,
                None => break,
            };

            if self.len > 0 {
                remove_block(buf, pos, 2);
            }

            let (size, width) = decode_hex(&buf[pos..pos + line_len])?;
            if width == 0 {
                return Err(TransferError::InvalidChunkSize { reason: "no hex digits" });
            }
            let size = usize::try_from(size)
                .map_err(|_| TransferError::InvalidChunkSize { reason: "chunk size overflow" })?;

            // the previous chunk's payload is now fully collapsed
            self.idx += self.len;
            newly += self.len;
            self.len = size;

            // drop the size line (digits, discarded extensions, CRLF)
            remove_block(buf, self.idx, line_len + 2);
            trace!(chunk_size = size, collapsed = self.idx, "consumed chunk size line");

            if size == 0 {
                if buf.len() >= self.idx + 2 && &buf[self.idx..self.idx + 2] == b"\r\n" {
                    remove_block(buf, self.idx, 2);
                }
                return Ok(Collapsed { newly, finished: true });
            }
        }

        Ok(Collapsed { newly, finished: false })
    }
}
