// src/services/online_counter.rs

//! # Online Counter
//!
//! Total number of open connections across all rooms.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::error;

use crate::models::{RelayError, RelayResult};

#[derive(Debug, Default)]
pub struct OnlineCounter {
    count: AtomicUsize,
}

impl OnlineCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the count after the increment.
    pub fn increment(&self) -> usize {
        self.count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Returns the count after the decrement.
    ///
    /// A decrement at zero means a connection was closed twice; the count is left
    /// untouched and the violation is logged and returned.
    pub fn decrement(&self) -> RelayResult<usize> {
        match self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(previous) => Ok(previous - 1),
            Err(_) => {
                error!("Online counter decrement at zero; duplicate close event?");
                Err(RelayError::CounterUnderflow)
            }
        }
    }

    pub fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}
