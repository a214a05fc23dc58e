//! Service API
//!
//! Line-framed JSON over a Unix Domain Socket: one request per connection,
//! one response back. The [`Service`] facade does the actual work and is
//! also usable directly, without the socket.

mod client;
pub mod listener;
mod messages;
mod service;

pub use client::ServiceClient;
pub use messages::{ApiRequest, ApiResponse};
pub use service::Service;
