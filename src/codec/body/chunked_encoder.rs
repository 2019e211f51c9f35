use std::io;
use std::io::Write;

use bytes::BytesMut;
use tokio_util::codec::Encoder;

use crate::protocol::PayloadItem;

/// Frames outgoing payload as chunked transfer encoding.
///
/// The first chunk is emitted as `<hex>\r\n<payload>`; every later chunk
/// carries a leading `\r\n` closing the previous one. `Eof` emits the
/// terminator, literally `\r\n0\r\n`, after which further items are
/// ignored. No chunk extensions are produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedEncoder {
    chunk_cnt: usize,
    eof: bool,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self { chunk_cnt: 0, eof: false }
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }
}

impl Default for ChunkedEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<PayloadItem> for ChunkedEncoder {
    type Error = io::Error;

    fn encode(&mut self, item: PayloadItem, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Ok(());
        }

        match item {
            PayloadItem::Chunk(bytes) => {
                if bytes.is_empty() {
                    return Ok(());
                }

                if self.chunk_cnt == 0 {
                    write!(helper::Writer(dst), "{:x}\r\n", bytes.len())?;
                } else {
                    write!(helper::Writer(dst), "\r\n{:x}\r\n", bytes.len())?;
                }
                self.chunk_cnt += 1;

                dst.reserve(bytes.len());
                dst.extend_from_slice(&bytes[..]);
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.extend_from_slice(b"\r\n0\r\n");
                Ok(())
            }
        }
    }
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl<'a> io::Write for Writer<'a> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn frames_chunks_and_terminator() {
        let mut encoder = ChunkedEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"abc")), &mut dst).unwrap();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"de")), &mut dst).unwrap();
        encoder.encode(PayloadItem::Eof, &mut dst).unwrap();

        assert_eq!(&dst[..], b"3\r\nabc\r\n2\r\nde\r\n0\r\n");
    }

    #[test]
    fn lowercase_hex_sizes() {
        let mut encoder = ChunkedEncoder::new();
        let mut dst = BytesMut::new();

        let payload = Bytes::from(vec![b'x'; 0x1a]);
        encoder.encode(PayloadItem::Chunk(payload), &mut dst).unwrap();

        assert!(dst.starts_with(b"1a\r\n"));
    }

    #[test]
    fn empty_chunk_emits_nothing() {
        let mut encoder = ChunkedEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::new()), &mut dst).unwrap();
        assert!(dst.is_empty());

        // an empty chunk must not count as the first chunk
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"hi")), &mut dst).unwrap();
        assert_eq!(&dst[..], b"2\r\nhi");
    }

    #[test]
    fn nothing_after_eof() {
        let mut encoder = ChunkedEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Eof, &mut dst).unwrap();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"late")), &mut dst).unwrap();

        assert_eq!(&dst[..], b"\r\n0\r\n");
        assert!(encoder.is_eof());
    }
}
