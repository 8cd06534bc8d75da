//! Background Tasks Module
//!
//! Contains background tasks owned by cache stores.
//!
//! # Tasks
//! - Expiry sweep: removes expired in-process entries at a configured interval

mod cleanup;

pub(crate) use cleanup::{spawn_sweeper, Sweeper};
