mod manager;
mod stream;

pub use manager::{Chunk, ChunkManager};
pub use stream::{ByteStream, StreamError};
