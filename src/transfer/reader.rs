use bytes::{Buf, Bytes, BytesMut};
use futures::channel::mpsc;
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, error, trace};

use crate::codec::body::ChunkedDecoder;
use crate::codec::substring_index;
use crate::protocol::{HeadersAction, ReadEvents, TransferEncoding, TransferError, TransferFlow};

const RECV_BLOCK_SIZE: usize = 8 * 1024;

enum ReaderCommand {
    Cancel,
    SetEvents(Box<dyn ReadEvents + Send>),
}

/// Control handle for a running [`ReadTransfer`].
///
/// Commands are applied between scheduler steps, never while one of the
/// transfer's own callbacks is on the stack: a cancel issued from inside
/// a callback takes effect once that callback returns, and never frees
/// the transfer beneath its own stack frame. Handles may outlive their
/// transfer; commands to a finished transfer are dropped.
#[derive(Clone)]
pub struct ReadHandle {
    tx: mpsc::UnboundedSender<ReaderCommand>,
}

impl ReadHandle {
    /// Tear the transfer down. No further callbacks fire.
    ///
    /// From inside one of the transfer's own callbacks, prefer returning
    /// [`TransferFlow::End`]; a cancel from there is deferred until the
    /// callback has returned.
    pub fn cancel(&self) {
        let _ = self.tx.unbounded_send(ReaderCommand::Cancel);
    }

    /// Replace the transfer's event sink.
    pub fn set_events<E>(&self, events: E)
    where
        E: ReadEvents + Send + 'static,
    {
        let _ = self.tx.unbounded_send(ReaderCommand::SetEvents(Box::new(events)));
    }

    /// True once the transfer has reached its terminal state.
    pub fn is_finished(&self) -> bool {
        self.tx.is_closed()
    }
}

enum Step {
    Continue,
    Finished,
}

/// Event-driven reader for one HTTP/1.x message.
///
/// Consumes bytes from the channel, finds the `\r\n\r\n` header
/// terminator, learns the body framing from the headers callback, then
/// decodes the body and emits chunk and done events. With
/// `overwrite_chunks` set, delivered body bytes are dropped from the
/// receive buffer so peak memory stays bounded by the read block size
/// plus framing; otherwise the buffer accumulates the whole body for a
/// final consolidated delivery.
///
/// The channel is borrowed, not owned: pass `&mut stream` to keep the
/// connection afterwards. The transfer never closes it.
pub struct ReadTransfer<C> {
    channel: C,
    events: Box<dyn ReadEvents + Send>,
    commands: mpsc::UnboundedReceiver<ReaderCommand>,
    commands_closed: bool,

    recv_buf: BytesMut,
    header_len: usize,
    encoding: TransferEncoding,
    overwrite_chunks: bool,

    chunk: ChunkedDecoder,
    /// Body bytes already delivered but still resident in the buffer.
    delivered_mark: usize,
    /// Total body bytes delivered through `on_chunk`.
    delivered: u64,
}

impl<C> ReadTransfer<C>
where
    C: AsyncRead + Unpin,
{
    pub fn start<E>(channel: C, overwrite_chunks: bool, events: E) -> (Self, ReadHandle)
    where
        E: ReadEvents + Send + 'static,
    {
        let (tx, commands) = mpsc::unbounded();

        let transfer = Self {
            channel,
            events: Box::new(events),
            commands,
            commands_closed: false,
            recv_buf: BytesMut::with_capacity(RECV_BLOCK_SIZE),
            header_len: 0,
            encoding: TransferEncoding::Unknown,
            overwrite_chunks,
            chunk: ChunkedDecoder::new(),
            delivered_mark: 0,
            delivered: 0,
        };

        (transfer, ReadHandle { tx })
    }

    /// Drive the transfer until its terminal callback (or cancellation).
    pub async fn run(mut self) {
        loop {
            self.recv_buf.reserve(RECV_BLOCK_SIZE);

            let read = tokio::select! {
                biased;

                command = self.commands.next(), if !self.commands_closed => {
                    match command {
                        Some(ReaderCommand::Cancel) => {
                            debug!("read transfer cancelled");
                            return;
                        }
                        Some(ReaderCommand::SetEvents(events)) => {
                            self.events = events;
                            continue;
                        }
                        None => {
                            self.commands_closed = true;
                            continue;
                        }
                    }
                }

                read = self.channel.read_buf(&mut self.recv_buf) => read,
            };

            match read {
                Ok(0) => {
                    self.hangup(TransferError::Disconnected);
                    return;
                }
                Ok(n) => {
                    trace!(bytes = n, buffered = self.recv_buf.len(), "channel readable");
                    match self.process() {
                        Ok(Step::Continue) => {}
                        Ok(Step::Finished) => return,
                        Err(e) => {
                            self.fail(e);
                            return;
                        }
                    }
                }
                Err(e) => {
                    self.hangup(TransferError::Io { source: e });
                    return;
                }
            }
        }
    }

    /// Spawn [`run`](Self::run) onto the current tokio runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<()>
    where
        C: Send + 'static,
    {
        tokio::spawn(self.run())
    }

    fn process(&mut self) -> Result<Step, TransferError> {
        if self.header_len == 0 {
            let Some(index) = substring_index(&self.recv_buf, b"\r\n\r\n") else {
                return Ok(Step::Continue);
            };
            let end = index + 4;

            let head = self.recv_buf.split_to(end).freeze();
            self.header_len = end;
            trace!(header_len = end, "header section complete");

            match self.events.on_headers(&head) {
                HeadersAction::Proceed(encoding) => self.encoding = encoding,
                HeadersAction::Stop => {
                    debug!("transfer stopped from headers callback");
                    return Ok(Step::Finished);
                }
            }
        }

        match self.encoding {
            TransferEncoding::Chunked => self.process_chunked(),
            TransferEncoding::Length(total) => self.process_length(total),
            TransferEncoding::Unknown => self.process_unknown(),
        }
    }

    fn process_chunked(&mut self) -> Result<Step, TransferError> {
        let collapsed = self.chunk.collapse(&mut self.recv_buf)?;
        let end = self.chunk.payload_end();

        if end > self.delivered_mark {
            let start = self.delivered_mark;
            self.delivered += (end - start) as u64;

            if self.events.on_chunk(&self.recv_buf[start..end]) == TransferFlow::End {
                debug!("transfer stopped from chunk callback");
                return Ok(Step::Finished);
            }

            if self.overwrite_chunks {
                self.recv_buf.advance(end);
                self.chunk.discard_payload(end);
            } else {
                self.delivered_mark = end;
            }
        }

        if collapsed.finished {
            self.finish();
            return Ok(Step::Finished);
        }
        Ok(Step::Continue)
    }

    fn process_length(&mut self, total: u64) -> Result<Step, TransferError> {
        let buffered = self.recv_buf.len() - self.delivered_mark;
        let wanted = usize::try_from(total - self.delivered).unwrap_or(usize::MAX);
        let take = buffered.min(wanted);

        if take > 0 {
            let start = self.delivered_mark;
            self.delivered += take as u64;

            if self.events.on_chunk(&self.recv_buf[start..start + take]) == TransferFlow::End {
                debug!("transfer stopped from chunk callback");
                return Ok(Step::Finished);
            }

            if self.overwrite_chunks {
                self.recv_buf.advance(start + take);
            } else {
                self.delivered_mark = start + take;
            }
        }

        if self.delivered >= total {
            self.finish();
            return Ok(Step::Finished);
        }
        Ok(Step::Continue)
    }

    fn process_unknown(&mut self) -> Result<Step, TransferError> {
        let start = self.delivered_mark;

        if self.recv_buf.len() > start {
            self.delivered += (self.recv_buf.len() - start) as u64;

            if self.events.on_chunk(&self.recv_buf[start..]) == TransferFlow::End {
                debug!("transfer stopped from chunk callback");
                return Ok(Step::Finished);
            }

            if self.overwrite_chunks {
                self.recv_buf.clear();
            } else {
                self.delivered_mark = self.recv_buf.len();
            }
        }

        // completion comes only from the peer closing the channel
        Ok(Step::Continue)
    }

    /// EOF or transport error. Connection close is how an EOF-framed body
    /// ends; anything else is reported through the error callback.
    fn hangup(&mut self, error: TransferError) {
        if self.header_len > 0 && self.encoding.is_unknown() {
            self.finish();
        } else {
            self.fail(error);
        }
    }

    fn fail(&mut self, error: TransferError) {
        let body_started =
            self.header_len > 0 && (self.delivered > 0 || !self.recv_buf.is_empty());
        error!(cause = %error, body_started, "read transfer failed");
        self.events.on_error(error, body_started);
    }

    fn finish(&mut self) {
        let body = if self.overwrite_chunks {
            Bytes::new()
        } else {
            match self.encoding {
                TransferEncoding::Chunked => {
                    let end = self.chunk.payload_end();
                    self.chunk.discard_payload(end);
                    self.recv_buf.split_to(end).freeze()
                }
                TransferEncoding::Length(total) => {
                    let end = usize::try_from(total)
                        .unwrap_or(self.recv_buf.len())
                        .min(self.recv_buf.len());
                    self.recv_buf.split_to(end).freeze()
                }
                TransferEncoding::Unknown => self.recv_buf.split().freeze(),
            }
        };

        debug!(body_len = body.len(), "read transfer complete");
        self.events.on_done(body);
    }
}
