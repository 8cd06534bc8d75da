//! Request and Response models for the cache API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{validate_key, CounterRequest, SetRequest, MAX_KEY_LENGTH};
pub use responses::{
    CounterResponse, DeleteResponse, ErrorResponse, ExistsResponse, GetResponse, HealthResponse,
    SetNxResponse, SetResponse, StatsResponse, TtlResponse,
};
