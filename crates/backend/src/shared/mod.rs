pub mod amazon_sp_api;
pub mod config;
pub mod data;
pub mod documents;
pub mod errors;
pub mod format;
pub mod holidays;
pub mod llm;
pub mod messaging;
