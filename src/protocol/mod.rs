mod encoding;
mod error;
mod events;
mod message;

pub use encoding::TransferEncoding;
pub use error::TransferError;
pub use events::{HeadersAction, Produce, ReadEvents, TransferFlow, WriteEvents};
pub use message::PayloadItem;
