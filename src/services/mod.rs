//! Service layer module
//!
//! Contains the rate limiter, wire transport, single-call client and batch dispatcher

pub mod client;
pub mod dispatcher;
pub mod rate_limiter;
pub mod transport;

pub use client::BotClient;
pub use dispatcher::Dispatcher;
pub use rate_limiter::RateLimiter;
pub use transport::{classify, ApiTransport, HttpTransport, RawResponse};
