//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /set`, `PUT /setnx` - Store a value (unconditionally / only if absent)
//! - `GET /get/:key`, `DELETE /del/:key`, `GET /exists/:key`
//! - `POST /incr/:key`, `POST /decr/:key` - Counter arithmetic
//! - `GET /ttl/:key` - Remaining lifetime in seconds
//! - `GET /stats`, `GET /health`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
