//! Environment abstraction for deterministic testing.
//!
//! The store only needs wall-clock time (todo ids are derived from the
//! creation time). Production uses [`SystemEnv`]; tests use [`SimEnv`], whose
//! clock only moves when told to.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Source of wall-clock time.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Milliseconds since the Unix epoch.
    ///
    /// Not required to be monotonic; callers must tolerate repeated values.
    fn wall_clock_millis(&self) -> u64;
}

/// Production environment backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::disallowed_methods)]
    fn wall_clock_millis(&self) -> u64 {
        // A clock set before 1970 yields 0, which only affects id readability.
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64)
    }
}

/// Simulated environment with a manually driven clock.
///
/// Clones share the same clock.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    now_millis: Arc<AtomicU64>,
}

impl SimEnv {
    /// Create a simulated clock frozen at `start_millis`.
    pub fn new(start_millis: u64) -> Self {
        Self { now_millis: Arc::new(AtomicU64::new(start_millis)) }
    }

    /// Move the clock forward.
    pub fn advance(&self, millis: u64) {
        self.now_millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Environment for SimEnv {
    fn wall_clock_millis(&self) -> u64 {
        self.now_millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_env_reports_time_after_epoch() {
        // 2020-01-01T00:00:00Z
        assert!(SystemEnv::new().wall_clock_millis() > 1_577_836_800_000);
    }

    #[test]
    fn sim_env_only_moves_when_advanced() {
        let env = SimEnv::new(1_000);
        assert_eq!(env.wall_clock_millis(), 1_000);
        assert_eq!(env.wall_clock_millis(), 1_000);

        let shared = env.clone();
        shared.advance(5);
        assert_eq!(env.wall_clock_millis(), 1_005);
    }
}
