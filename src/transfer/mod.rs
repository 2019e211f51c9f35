mod reader;
mod sigpipe;
mod writer;

pub use reader::{ReadHandle, ReadTransfer};
pub use writer::{WriteHandle, WriteTransfer};
