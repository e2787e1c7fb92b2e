pub mod client;
pub mod types;

pub use client::{AzureOpenAiClient, CompletionClient, CompletionError};
pub use types::{Completion, Usage};
