//! HTTP executors behind the dispatch client

pub mod openai;

// Re-export for convenience
pub use openai::OpenAiState;
