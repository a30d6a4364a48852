//! Time utilities for game simulation

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds (telemetry only, never
/// used for simulation decisions)
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 30; // 30 ticks per second
pub const SNAPSHOT_TPS: u32 = 10; // 10 snapshots per second
pub const TICK_DURATION_MICROS: u64 = 1_000_000 / SIMULATION_TPS as u64;

/// Maximum delta-time accepted per tick, in seconds. Longer stalls
/// (debugger pause, scheduler hiccup) are clamped to this to avoid
/// projectile tunnelling and integration blowup.
pub const MAX_TICK_DELTA: f32 = 0.1;

/// Nominal delta time for a fixed-rate tick (in seconds)
pub fn tick_delta() -> f32 {
    1.0 / SIMULATION_TPS as f32
}

/// Deterministic simulation clock, advanced only by explicit tick deltas.
///
/// All cooldowns and status-effect expiries in the simulation are absolute
/// timestamps in simulated milliseconds compared against this clock, so a
/// run is replayable from a seed and a sequence of deltas.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now_ms: f64,
}

impl SimClock {
    pub fn new() -> Self {
        Self { now_ms: 0.0 }
    }

    /// Advance the clock by a delta in seconds (already clamped by the caller)
    pub fn advance(&mut self, dt_secs: f32) {
        self.now_ms += dt_secs as f64 * 1000.0;
    }

    /// Current simulated time in milliseconds
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_advances_by_delta() {
        let mut clock = SimClock::new();
        assert_eq!(clock.now_ms(), 0.0);
        clock.advance(0.5);
        assert_eq!(clock.now_ms(), 500.0);
        clock.advance(tick_delta());
        // tick_delta is f32; allow for its precision when comparing in f64
        assert!((clock.now_ms() - (500.0 + 1000.0 / SIMULATION_TPS as f64)).abs() < 1e-3);
    }
}
