//! Frame timing helpers for the simulation and render phases.

use std::time::Instant;
use tracing::debug;

/// A profiling scope that measures elapsed time using RAII.
///
/// The elapsed time is logged at `debug` level when the scope is dropped.
pub struct ProfilerScope {
    start: Instant,
    name: &'static str,
}

impl ProfilerScope {
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    /// Elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ProfilerScope {
    fn drop(&mut self) {
        debug!("{} took {:.3} ms", self.name, self.elapsed_ms());
    }
}

/// Rolling timing for the step and render phases of the frame loop.
#[derive(Debug, Clone, Default)]
pub struct FrameTimer {
    last_step_ms: f64,
    last_render_ms: f64,
    frames: u64,
    total_ms: f64,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the automaton step time of the current frame.
    pub fn record_step(&mut self, time_ms: f64) {
        self.last_step_ms = time_ms;
    }

    /// Record the render time and close the frame.
    pub fn record_render(&mut self, time_ms: f64) {
        self.last_render_ms = time_ms;
        self.frames += 1;
        self.total_ms += self.last_step_ms + time_ms;
    }

    pub fn last_step_ms(&self) -> f64 {
        self.last_step_ms
    }

    pub fn last_render_ms(&self) -> f64 {
        self.last_render_ms
    }

    /// Step plus render time of the last closed frame.
    pub fn last_frame_time_ms(&self) -> f64 {
        self.last_step_ms + self.last_render_ms
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Mean frame time over all closed frames, 0 before the first one.
    pub fn average_frame_time_ms(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.total_ms / self.frames as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_profiler_scope_measures_time() {
        let scope = ProfilerScope::new("test");
        thread::sleep(Duration::from_millis(10));
        let elapsed = scope.elapsed_ms();
        assert!(elapsed >= 10.0, "Expected at least 10ms, got {elapsed}");
    }

    #[test]
    fn test_frame_timer() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.last_frame_time_ms(), 0.0);
        assert_eq!(timer.average_frame_time_ms(), 0.0);

        timer.record_step(4.0);
        timer.record_render(12.0);
        assert_eq!(timer.last_frame_time_ms(), 16.0);

        timer.record_step(2.0);
        timer.record_render(6.0);
        assert_eq!(timer.frames(), 2);
        assert_eq!(timer.average_frame_time_ms(), 12.0);
    }
}
