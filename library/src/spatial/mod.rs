pub mod chunked_panel;

pub use chunked_panel::{ChunkInstance, ChunkPos, ChunkTag, ChunkedPanel};
