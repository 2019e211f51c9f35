use std::io;
use thiserror::Error;

/// Everything a transfer can report through its error callback.
///
/// The protocol variants are raised by the chunk decoder and the framing
/// helper; the transport variants come from the underlying channel.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("invalid chunk size line: {reason}")]
    InvalidChunkSize { reason: &'static str },

    #[error("invalid chunk framing: {reason}")]
    InvalidChunkEnd { reason: &'static str },

    #[error("invalid header section: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("connection closed by peer")]
    Disconnected,

    #[error("channel accepted no bytes")]
    WriteZero,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl TransferError {
    /// True for errors in the byte stream itself rather than in transport.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            TransferError::InvalidChunkSize { .. }
                | TransferError::InvalidChunkEnd { .. }
                | TransferError::InvalidHeader { .. }
                | TransferError::InvalidContentLength { .. }
        )
    }
}
