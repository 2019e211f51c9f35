mod chunked_decoder;
mod chunked_encoder;
mod payload_encoder;

pub(crate) use chunked_decoder::ChunkedDecoder;
pub use chunked_encoder::ChunkedEncoder;
pub use payload_encoder::{PayloadEncoder, RawEncoder};
