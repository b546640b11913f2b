//! Data models module
//!
//! Defines call parameters, the Bot API response envelope, typed results and batch shapes

pub mod api;
pub mod batch;
pub mod telegram;

pub use api::{ApiResponse, CallParams, ChatId, ResponseParameters};
pub use batch::{BatchOptions, BatchReport, ItemResult, OutboundMessage};
pub use telegram::{Chat, Message, User};
