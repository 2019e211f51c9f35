use bytes::Bytes;

/// One unit of outgoing body payload fed to a payload encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem {
    Chunk(Bytes),
    Eof,
}
