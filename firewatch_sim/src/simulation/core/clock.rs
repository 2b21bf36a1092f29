// firewatch_sim/src/simulation/core/clock.rs

use tokio::time::Instant;

/// Measures the wall-clock time between consecutive ticks.
#[derive(Debug, Clone)]
pub struct TickClock {
    last: Option<Instant>,
    fallback: f64,
}

impl TickClock {
    pub fn new(fallback: f64) -> Self {
        Self {
            last: None,
            fallback,
        }
    }

    /// Seconds since the previous call. The first call, and any call that
    /// measures no elapsed time, returns the fallback step instead.
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let dt = self
            .last
            .map(|last| now.duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.last = Some(now);
        if dt > 0.0 {
            dt
        } else {
            self.fallback
        }
    }
}
