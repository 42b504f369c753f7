//! Fixed-timestep scheduler.
//!
//! The [`Timer`] subsystem converts wall-clock time into a whole number of
//! fixed-rate game ticks per frame. All work happens on the engine thread
//! inside `update()`; there is no background thread. Elapsed time is folded
//! into a fractional accumulator measured in ticks, and the tick callback is
//! invoked once per whole tick consumed.

use std::cell::Cell;
use std::rc::Rc;

use anyhow::{Result, bail};
use instant::{Duration, Instant};

use crate::engine::{Flow, Subsystem};

/// Shareable handle onto the cumulative number of ticks fired since launch.
///
/// Cloneable and readable from game logic, e.g. to derive animation phases.
#[derive(Debug, Clone, Default)]
pub struct TickCount(Rc<Cell<u64>>);

impl TickCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u64 {
        self.0.get()
    }

    fn bump(&self) {
        self.0.set(self.0.get() + 1);
    }
}

/// The fixed-timestep scheduler subsystem.
///
/// Maintains the measured frames and updates per second and reports both
/// once per second through the logger.
pub struct Timer {
    /// The game tick callback. Invoked once per fixed-rate tick.
    tick: Box<dyn FnMut()>,
    target_ups: u32,
    /// Duration of one tick in nanoseconds, `1e9 / target_ups`. Computed in `init`.
    ns: f64,
    last_sample: Instant,
    /// Fractional tick accumulator.
    accumulator: f64,
    /// Start of the current 1-second report window.
    window_start: Instant,
    frames: u32,
    updates: u32,
    total_ticks: TickCount,
}

impl Timer {
    /// Create a timer firing the given callback `target_ups` times per second.
    pub fn new(target_ups: u32, tick: Box<dyn FnMut()>) -> Self {
        Self::with_tick_count(target_ups, tick, TickCount::new())
    }

    /// Create a timer reporting cumulative ticks through an existing handle.
    pub fn with_tick_count(target_ups: u32, tick: Box<dyn FnMut()>, count: TickCount) -> Self {
        Self {
            tick,
            target_ups,
            ns: 0.0,
            last_sample: Instant::now(),
            accumulator: 0.0,
            window_start: Instant::now(),
            frames: 0,
            updates: 0,
            total_ticks: count,
        }
    }

    /// Handle onto the cumulative tick counter.
    pub fn tick_count(&self) -> TickCount {
        self.total_ticks.clone()
    }

    /// Fold an elapsed wall-clock span into the accumulator and fire the
    /// tick callback once per whole tick consumed. The frame counter is
    /// bumped once per call regardless of how many ticks fired.
    fn accumulate(&mut self, elapsed: Duration) {
        self.accumulator += elapsed.as_nanos() as f64 / self.ns;
        while self.accumulator >= 1.0 {
            (self.tick)();
            self.updates += 1;
            self.total_ticks.bump();
            self.accumulator -= 1.0;
        }
        self.frames += 1;
    }
}

impl Subsystem for Timer {
    fn name(&self) -> &'static str {
        "Timer"
    }

    fn init(&mut self) -> Result<()> {
        if self.target_ups == 0 {
            bail!("target updates per second must be non-zero");
        }
        self.ns = 1_000_000_000.0 / self.target_ups as f64;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        log::info!("Target UPS: {}", self.target_ups);
        self.last_sample = Instant::now();
        self.window_start = Instant::now();
        Ok(())
    }

    /// Catch-up policy: a slow frame can fire multiple ticks in one call,
    /// and there is no cap, so a pathological stall causes an equally long
    /// burst of ticks rather than silently dropped time.
    fn update(&mut self) -> Result<Flow> {
        let now = Instant::now();
        let elapsed = now - self.last_sample;
        self.last_sample = now;
        self.accumulate(elapsed);

        if self.window_start.elapsed() >= Duration::from_millis(1_000) {
            log::info!("FPS: {}, UPS: {}", self.frames, self.updates);
            self.frames = 0;
            self.updates = 0;
            // Advance by exactly one window, not to "now", so report
            // boundaries do not drift over long runs.
            self.window_start += Duration::from_millis(1_000);
        }

        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_timer(target_ups: u32) -> (Timer, Rc<Cell<u32>>) {
        let fired = Rc::new(Cell::new(0u32));
        let handle = fired.clone();
        let mut timer = Timer::new(target_ups, Box::new(move || handle.set(handle.get() + 1)));
        timer.init().unwrap();
        (timer, fired)
    }

    #[test]
    fn no_tick_before_a_full_step_accumulates() {
        // 100 UPS, one tick per 10ms.
        let (mut timer, fired) = counting_timer(100);
        timer.accumulate(Duration::from_millis(5));
        assert_eq!(fired.get(), 0);
        timer.accumulate(Duration::from_millis(4));
        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn exact_elapsed_time_yields_exact_tick_count() {
        let (mut timer, fired) = counting_timer(100);
        // 100ms fed as 5ms halves: 10 ticks total, however distributed.
        for _ in 0..20 {
            timer.accumulate(Duration::from_millis(5));
        }
        assert_eq!(fired.get(), 10);
    }

    #[test]
    fn slow_frame_catches_up_in_one_call() {
        let (mut timer, fired) = counting_timer(100);
        timer.accumulate(Duration::from_millis(50));
        assert_eq!(fired.get(), 5);
    }

    #[test]
    fn distribution_does_not_change_the_total() {
        let (mut burst, burst_fired) = counting_timer(100);
        burst.accumulate(Duration::from_millis(120));

        let (mut steady, steady_fired) = counting_timer(100);
        for _ in 0..48 {
            steady.accumulate(Duration::from_micros(2_500));
        }

        assert_eq!(burst_fired.get(), 12);
        assert_eq!(steady_fired.get(), burst_fired.get());
    }

    #[test]
    fn tick_count_handle_tracks_cumulative_ticks() {
        let (mut timer, _) = counting_timer(100);
        let count = timer.tick_count();
        timer.accumulate(Duration::from_millis(30));
        timer.accumulate(Duration::from_millis(20));
        assert_eq!(count.get(), 5);
    }

    #[test]
    fn zero_ups_is_a_configuration_error() {
        let mut timer = Timer::new(0, Box::new(|| ()));
        assert!(timer.init().is_err());
    }
}
