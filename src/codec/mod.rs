pub mod body;
mod buffer;
mod framing;

pub use body::{ChunkedEncoder, PayloadEncoder, RawEncoder};
pub use buffer::{decode_hex, remove_block, substring_index};
pub use framing::{request_framing, response_framing};
