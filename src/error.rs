//! Error type shared by the fallible `ChainHashMap` operations.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MapError {
    /// Construction or an explicit resize asked for zero buckets.
    #[error("capacity must be at least 1")]
    InvalidCapacity,
    /// `at`, `at_mut`, `update` or `erase` was given a key that is not stored.
    #[error("key not found")]
    KeyNotFound,
}
