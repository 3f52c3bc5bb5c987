//! Retrieval and answering over personal financial documents.

pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod error;
pub mod prompt;
pub mod types;
pub mod vault;

pub use bootstrap::AppContext;
pub use config::Config;
pub use engine::RagEngine;
pub use error::{ConfigError, RagError};
pub use types::{Answer, IndexStats, IngestReport, RetrievedChunk};
