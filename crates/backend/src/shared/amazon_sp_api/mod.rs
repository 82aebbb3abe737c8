//! Amazon Selling Partner API: LWA + SigV4 auth, reports, FBA inventory and
//! inbound shipments, financial events.

pub mod auth;
pub mod client;
pub mod credentials;
pub mod financial_events;
pub mod financial_parser;
pub mod rate_limiter;
pub mod types;

pub use client::SpApiClient;
pub use types::{Marketplace, SpApiError};
