//! Asynchronous HTTP/1.x message transfer core.
//!
//! Drives a single full-duplex HTTP/1.x message exchange over a
//! non-blocking byte stream. [`ReadTransfer`] consumes bytes from a
//! channel, finds the header terminator, learns the body framing from a
//! headers callback, then decodes the body (chunked, content-length, or
//! connection-close) and surfaces incremental-body and message-complete
//! events. [`WriteTransfer`] streams a header blob plus a framed body the
//! other way. Both are driven entirely by channel readiness; neither ever
//! blocks the task, and both support mid-transfer cancellation through a
//! handle.
//!
//! The channel is any `AsyncRead`/`AsyncWrite`; it is borrowed, never
//! closed — connection lifecycle stays with the caller.

pub mod codec;
pub mod protocol;
pub mod transfer;

pub use protocol::{
    HeadersAction, PayloadItem, Produce, ReadEvents, TransferEncoding, TransferError,
    TransferFlow, WriteEvents,
};
pub use transfer::{ReadHandle, ReadTransfer, WriteHandle, WriteTransfer};
