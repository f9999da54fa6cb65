//! API Layer Module
//!
//! HTTP server, routes, middleware and the error envelope.

pub mod body;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;

pub use body::{parse_body, BodyError};
pub use error::ApiError;
pub use middleware::{extract_client_ip, CorrelationId};
pub use server::{create_router, start_server, AppState, SharedAppState};
