use std::io;

use bytes::BytesMut;
use tokio_util::codec::Encoder;

use crate::codec::body::ChunkedEncoder;
use crate::protocol::{PayloadItem, TransferEncoding};

/// Appends payload verbatim; the caller's headers carry the framing
/// (a `Content-Length`, or none for connection-close bodies).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEncoder;

impl Encoder<PayloadItem> for RawEncoder {
    type Error = io::Error;

    fn encode(&mut self, item: PayloadItem, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            PayloadItem::Chunk(bytes) => {
                dst.extend_from_slice(&bytes[..]);
                Ok(())
            }
            PayloadItem::Eof => Ok(()),
        }
    }
}

/// Outgoing payload framing, selected from the transfer encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEncoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Chunked(ChunkedEncoder),
    Raw(RawEncoder),
}

impl PayloadEncoder {
    pub fn for_encoding(encoding: TransferEncoding) -> Self {
        match encoding {
            TransferEncoding::Chunked => Self { kind: Kind::Chunked(ChunkedEncoder::new()) },
            TransferEncoding::Length(_) | TransferEncoding::Unknown => {
                Self { kind: Kind::Raw(RawEncoder) }
            }
        }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }
}

impl Encoder<PayloadItem> for PayloadEncoder {
    type Error = io::Error;

    fn encode(&mut self, item: PayloadItem, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match &mut self.kind {
            Kind::Chunked(chunked_encoder) => chunked_encoder.encode(item, dst),
            Kind::Raw(raw_encoder) => raw_encoder.encode(item, dst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn raw_appends_verbatim() {
        let mut encoder = PayloadEncoder::for_encoding(TransferEncoding::Length(5));
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"Hello")), &mut dst).unwrap();
        encoder.encode(PayloadItem::Eof, &mut dst).unwrap();

        assert_eq!(&dst[..], b"Hello");
    }

    #[test]
    fn chunked_frames() {
        let mut encoder = PayloadEncoder::for_encoding(TransferEncoding::Chunked);
        assert!(encoder.is_chunked());

        let mut dst = BytesMut::new();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"Hello")), &mut dst).unwrap();
        encoder.encode(PayloadItem::Eof, &mut dst).unwrap();

        assert_eq!(&dst[..], b"5\r\nHello\r\n0\r\n");
    }
}
