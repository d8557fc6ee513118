//! Host simulation time.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of the host's current simulation time (s).
pub trait TimeSource: Send + Sync {
    fn time(&self) -> f64;
}

/// Time value a host advances through a shared `Arc`.
///
/// Stored as the bit pattern of an `f64` so it can live in an atomic.
#[derive(Debug)]
pub struct HostClock {
    bits: AtomicU64,
}

impl HostClock {
    pub fn new(time: f64) -> Self {
        Self {
            bits: AtomicU64::new(time.to_bits()),
        }
    }

    pub fn set(&self, time: f64) {
        self.bits.store(time.to_bits(), Ordering::Release);
    }

    /// Advance by `dt` and return the new time.
    pub fn advance(&self, dt: f64) -> f64 {
        let time = self.time() + dt;
        self.set(time);
        time
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl TimeSource for HostClock {
    fn time(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn shared_clock_advances() {
        let clock = Arc::new(HostClock::new(1.0));
        let reader: Arc<dyn TimeSource> = clock.clone();
        assert_eq!(reader.time(), 1.0);
        clock.advance(0.25);
        assert_eq!(reader.time(), 1.25);
        clock.set(-3.0);
        assert_eq!(reader.time(), -3.0);
    }
}
