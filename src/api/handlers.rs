//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint. Values travel as
//! arbitrary JSON and are stored through the typed cache extension.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::{Cache, CacheExt, MultiLevelCache};
use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, CounterRequest, CounterResponse, DeleteResponse, ExistsResponse, GetResponse,
    HealthResponse, SetNxResponse, SetRequest, SetResponse, StatsResponse, TtlResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The orchestrated cache; tiers synchronise internally
    pub cache: Arc<MultiLevelCache>,
    /// TTL applied when a set request carries none
    pub default_ttl: Duration,
}

impl AppState {
    /// Creates a new AppState around an orchestrator.
    pub fn new(cache: MultiLevelCache, default_ttl: Duration) -> Self {
        Self {
            cache: Arc::new(cache),
            default_ttl,
        }
    }

    fn ttl_for(&self, req: &SetRequest) -> Duration {
        req.ttl.map(Duration::from_secs).unwrap_or(self.default_ttl)
    }
}

// An empty body means a step of one; anything else must parse.
fn counter_step(body: &Bytes) -> Result<i64> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(1);
    }
    serde_json::from_slice::<CounterRequest>(body)
        .map(|req| req.step())
        .map_err(|e| CacheError::InvalidRequest(format!("invalid counter body: {}", e)))
}

fn check_key(key: &str) -> Result<()> {
    match validate_key(key) {
        Some(error_msg) => Err(CacheError::InvalidRequest(error_msg)),
        None => Ok(()),
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair in the cache with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = state.ttl_for(&req);
    state.cache.set(&req.key, &req.value, ttl).await?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for PUT /setnx
pub async fn set_nx_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetNxResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = state.ttl_for(&req);
    let created = state.cache.set_nx(&req.key, &req.value, ttl).await?;

    Ok(Json(SetNxResponse {
        key: req.key,
        created,
    }))
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    check_key(&key)?;
    let value: Value = state.cache.get(&key).await?;
    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /del/:key
///
/// Deleting a missing key still succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    check_key(&key)?;
    state.cache.delete(&key).await?;
    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /exists/:key
pub async fn exists_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ExistsResponse>> {
    check_key(&key)?;
    let exists = state.cache.exists(&key).await?;
    Ok(Json(ExistsResponse { key, exists }))
}

/// Handler for POST /incr/:key
///
/// The body is optional; an empty request increments by one.
pub async fn incr_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Json<CounterResponse>> {
    check_key(&key)?;
    let step = counter_step(&body)?;
    let value = state.cache.incr_by(&key, step).await?;
    Ok(Json(CounterResponse { key, value }))
}

/// Handler for POST /decr/:key
pub async fn decr_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Json<CounterResponse>> {
    check_key(&key)?;
    let step = counter_step(&body)?;
    let value = state.cache.decr_by(&key, step).await?;
    Ok(Json(CounterResponse { key, value }))
}

/// Handler for GET /ttl/:key
pub async fn ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<TtlResponse>> {
    check_key(&key)?;
    let ttl = state.cache.ttl(&key).await?;
    Ok(Json(TtlResponse {
        key,
        ttl: ttl.as_secs(),
    }))
}

/// Handler for GET /stats
///
/// Returns per-level hit counters and backfill totals.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
///
/// Pings every level; any failing tier turns the check into an error.
pub async fn health_handler(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    state.cache.ping().await?;
    Ok(Json(HealthResponse::healthy()))
}
