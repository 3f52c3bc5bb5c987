//! Document readers, chunking and vector index backends.

pub mod document;
pub mod local_store;
pub mod qdrant_ops;
pub mod vector_store;

pub use local_store::LocalVectorStore;
pub use qdrant_ops::QdrantOps;
pub use vector_store::{Payload, ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError};
