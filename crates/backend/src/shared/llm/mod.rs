pub mod openai_provider;
pub mod translation;
pub mod types;

pub use types::*;
