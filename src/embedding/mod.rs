//! Embedding vectors and the backends that produce them

mod embedder;
mod vector;

pub(crate) use embedder::fnv1a64;
pub use embedder::{embed_all, embed_one, CachingEmbedder, Embedder, EmbeddingError, HashingEmbedder};
#[cfg(feature = "embeddings")]
pub use embedder::FastEmbedEmbedder;
pub use vector::EmbeddingVector;
