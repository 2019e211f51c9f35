/// How the message body is delimited within the byte stream.
///
/// HTTP/1.x offers three framings: chunked transfer encoding, a fixed
/// `Content-Length`, and connection-close (the body runs until the peer
/// closes the stream).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// HTTP/1.1 chunked transfer encoding.
    Chunked,

    /// The body is exactly this many bytes.
    Length(u64),

    /// The body extends until the peer closes the channel.
    Unknown,
}

impl TransferEncoding {
    pub fn is_unknown(&self) -> bool {
        matches!(self, TransferEncoding::Unknown)
    }
}
