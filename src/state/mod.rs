//! Persistence gateway
//!
//! A SQLite store owned by an actor task; the rest of the service talks to
//! it through the cloneable [`StateManager`] handle.

mod manager;
mod messages;
mod store;

pub use manager::StateManager;
pub use messages::{StateCommand, StateError, StateResponse};
pub use store::Store;
