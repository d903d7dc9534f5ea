//! l2dns HTTP API
//!
//! JSON endpoints for managing host entries and forward servers.

mod handlers;
pub mod server;

pub use handlers::{AddEntryRequest, AddServerRequest, RemoveEntryRequest};
pub use server::{route, run_api_server, serve};
