use bytes::Bytes;

use crate::protocol::{TransferEncoding, TransferError};

/// Flow decision returned from incremental callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferFlow {
    /// Keep the transfer going.
    Continue,
    /// Stop the transfer now; no further callbacks fire.
    End,
}

/// Decision returned from [`ReadEvents::on_headers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadersAction {
    /// Read the body with this framing.
    Proceed(TransferEncoding),
    /// Terminate the transfer; no further callbacks fire.
    Stop,
}

/// Result of polling a body producer ([`WriteEvents::produce`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Produce {
    /// The next piece of body payload.
    Data(Bytes),
    /// No payload right now; poll again later.
    Pending,
    /// The body is complete; the producer will not be polled again.
    End,
}

/// Event sink for a [`ReadTransfer`](crate::transfer::ReadTransfer).
///
/// Callbacks run to completion on the driving task, in strict order:
/// `on_headers` at most once, then zero or more `on_chunk`, then exactly
/// one of `on_done` or `on_error` as the last callback. Incremental
/// chunks are lent for the duration of the call; the final body is handed
/// over as owned [`Bytes`].
pub trait ReadEvents {
    /// The complete header section, including its terminating
    /// `\r\n\r\n`, has arrived. Decide the body framing.
    fn on_headers(&mut self, header: &[u8]) -> HeadersAction {
        let _ = header;
        HeadersAction::Proceed(TransferEncoding::Unknown)
    }

    /// A run of decoded body bytes.
    fn on_chunk(&mut self, data: &[u8]) -> TransferFlow {
        let _ = data;
        TransferFlow::Continue
    }

    /// The body is complete. When the reader ran with
    /// `overwrite_chunks = false` this is the full body; otherwise it is
    /// empty and the body was delivered through `on_chunk`.
    fn on_done(&mut self, body: Bytes) {
        let _ = body;
    }

    /// The transfer failed. `body_started` distinguishes a header-phase
    /// failure from one mid-body.
    fn on_error(&mut self, error: TransferError, body_started: bool) {
        let _ = (error, body_started);
    }
}

/// Event sink for a [`WriteTransfer`](crate::transfer::WriteTransfer).
///
/// `on_headers_sent` fires at most once, after at least the header prefix
/// has been flushed; `produce` may fire many times; exactly one of
/// `on_done` or `on_error` fires last.
pub trait WriteEvents {
    /// At least the full header prefix has been flushed to the channel.
    fn on_headers_sent(&mut self) {}

    /// Poll for the next piece of body payload.
    fn produce(&mut self) -> Produce {
        Produce::End
    }

    /// The header and complete framed body have been flushed.
    fn on_done(&mut self) {}

    /// The transfer failed. `headers_sent` tells whether the header
    /// prefix had already been flushed.
    fn on_error(&mut self, error: TransferError, headers_sent: bool) {
        let _ = (error, headers_sent);
    }
}
