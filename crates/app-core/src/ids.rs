use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileId(pub u64);

static LAST_PROFILE_ID: AtomicU64 = AtomicU64::new(0);

impl ProfileId {
    /// Allocates a fresh id.
    ///
    /// Ids are time-based (so a new session never hands out an id seen in an
    /// earlier one) and strictly increasing within the process, so two calls
    /// inside the same clock tick still differ.
    pub fn generate() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;

        let mut prev = LAST_PROFILE_ID.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev.wrapping_add(1));
            match LAST_PROFILE_ID.compare_exchange_weak(
                prev,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return ProfileId(next),
                Err(actual) => prev = actual,
            }
        }
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
