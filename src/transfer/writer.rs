use bytes::{Buf, Bytes, BytesMut};
use futures::channel::mpsc;
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;
use tracing::{debug, error, trace};

use crate::codec::PayloadEncoder;
use crate::protocol::{PayloadItem, Produce, TransferEncoding, TransferError, WriteEvents};

use super::sigpipe::ignore_sigpipe;

enum WriterCommand {
    Cancel,
}

/// Control handle for a running [`WriteTransfer`].
///
/// Same deferred model as the reader side: a cancel issued from inside
/// one of the transfer's own callbacks takes effect once that callback
/// returns, and a cancel on a finished transfer is dropped.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::UnboundedSender<WriterCommand>,
}

impl WriteHandle {
    /// Tear the transfer down. No further callbacks fire.
    pub fn cancel(&self) {
        let _ = self.tx.unbounded_send(WriterCommand::Cancel);
    }

    /// True once the transfer has reached its terminal state.
    pub fn is_finished(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Event-driven writer for one HTTP/1.x message.
///
/// Transmits the header blob, then a body that is pre-supplied, polled
/// incrementally from the producer callback, or both, framed per the
/// transfer encoding. `on_headers_sent` fires once at least the header
/// prefix has been flushed; exactly one of `on_done` or `on_error` fires
/// last.
///
/// The channel is borrowed, not owned: pass `&mut stream` to keep the
/// connection afterwards. The transfer never closes it.
pub struct WriteTransfer<C> {
    channel: C,
    events: Box<dyn WriteEvents + Send>,
    commands: mpsc::UnboundedReceiver<WriterCommand>,
    commands_closed: bool,

    write_buf: BytesMut,
    encoder: PayloadEncoder,
    header_len: usize,
    headers_done: bool,
    /// Cumulative bytes the channel has accepted.
    flushed: u64,
    /// The producer has not yet returned [`Produce::End`].
    producing: bool,
    pending_error: Option<TransferError>,
}

impl<C> WriteTransfer<C>
where
    C: AsyncWrite + Unpin,
{
    /// Queue the header (and any pre-supplied body) and poll the producer
    /// once, exactly as the first writable pass will find them.
    pub fn start<E>(
        channel: C,
        header: &[u8],
        initial_body: Option<Bytes>,
        encoding: TransferEncoding,
        events: E,
    ) -> (Self, WriteHandle)
    where
        E: WriteEvents + Send + 'static,
    {
        ignore_sigpipe();

        let (tx, commands) = mpsc::unbounded();

        let mut transfer = Self {
            channel,
            events: Box::new(events),
            commands,
            commands_closed: false,
            write_buf: BytesMut::from(header),
            encoder: PayloadEncoder::for_encoding(encoding),
            header_len: header.len(),
            headers_done: false,
            flushed: 0,
            producing: true,
            pending_error: None,
        };

        if let Some(body) = initial_body {
            if !body.is_empty() {
                transfer.append_payload(PayloadItem::Chunk(body));
            }
        }

        match transfer.events.produce() {
            Produce::Data(bytes) => {
                if !bytes.is_empty() {
                    transfer.append_payload(PayloadItem::Chunk(bytes));
                }
            }
            Produce::Pending => {}
            Produce::End => {
                transfer.append_payload(PayloadItem::Eof);
                transfer.producing = false;
            }
        }

        (transfer, WriteHandle { tx })
    }

    /// Drive the transfer until its terminal callback (or cancellation).
    pub async fn run(mut self) {
        if let Some(error) = self.pending_error.take() {
            self.fail(error);
            return;
        }

        loop {
            while !self.write_buf.is_empty() {
                let written = tokio::select! {
                    biased;

                    command = self.commands.next(), if !self.commands_closed => {
                        match command {
                            Some(WriterCommand::Cancel) => {
                                debug!("write transfer cancelled");
                                return;
                            }
                            None => {
                                self.commands_closed = true;
                                continue;
                            }
                        }
                    }

                    written = self.channel.write(&self.write_buf) => written,
                };

                match written {
                    Ok(0) => {
                        self.fail(TransferError::WriteZero);
                        return;
                    }
                    Ok(n) => {
                        trace!(bytes = n, remaining = self.write_buf.len() - n, "channel writable");
                        self.flushed += n as u64;
                        if !self.headers_done && self.flushed >= self.header_len as u64 {
                            self.headers_done = true;
                            self.events.on_headers_sent();
                        }
                        self.write_buf.advance(n);
                    }
                    Err(e) => {
                        self.fail(TransferError::Io { source: e });
                        return;
                    }
                }
            }

            if let Err(e) = self.channel.flush().await {
                self.fail(TransferError::Io { source: e });
                return;
            }

            if self.producing {
                match self.events.produce() {
                    Produce::Data(bytes) if !bytes.is_empty() => {
                        self.append_payload(PayloadItem::Chunk(bytes));
                    }
                    Produce::Data(_) | Produce::Pending => {
                        if self.check_cancelled() {
                            debug!("write transfer cancelled");
                            return;
                        }
                        // nothing to send yet; re-poll after yielding
                        tokio::task::yield_now().await;
                    }
                    Produce::End => {
                        self.append_payload(PayloadItem::Eof);
                        self.producing = false;
                    }
                }

                if let Some(error) = self.pending_error.take() {
                    self.fail(error);
                    return;
                }
                continue;
            }

            debug!(flushed = self.flushed, "write transfer complete");
            self.events.on_done();
            return;
        }
    }

    /// Spawn [`run`](Self::run) onto the current tokio runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<()>
    where
        C: Send + 'static,
    {
        tokio::spawn(self.run())
    }

    fn append_payload(&mut self, item: PayloadItem) {
        if let Err(e) = self.encoder.encode(item, &mut self.write_buf) {
            self.pending_error = Some(TransferError::Io { source: e });
        }
    }

    fn fail(&mut self, error: TransferError) {
        error!(cause = %error, headers_sent = self.headers_done, "write transfer failed");
        self.events.on_error(error, self.headers_done);
    }

    fn check_cancelled(&mut self) -> bool {
        if self.commands_closed {
            return false;
        }
        match self.commands.try_next() {
            Ok(Some(WriterCommand::Cancel)) => true,
            Ok(None) => {
                self.commands_closed = true;
                false
            }
            Err(_) => false,
        }
    }
}
