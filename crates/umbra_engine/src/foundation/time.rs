//! Time management utilities
//!
//! - [`Timer`]: background one-shot and repeating schedules with cooperative cancellation
//! - [`Stopwatch`]: elapsed-time measurement
//! - [`FrameClock`]: per-frame delta/FPS bookkeeping for the main loop

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Timer scheduling errors
#[derive(Error, Debug)]
pub enum TimerError {
    /// The background thread could not be spawned
    #[error("Failed to spawn timer thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The scheduled callback panicked
    #[error("Timer task '{0}' panicked")]
    Panicked(String),
}

/// Shared cancellation flag for one scheduled task
///
/// Cancellation is cooperative: the task polls the flag before and after each
/// sleep, so a cancel may take up to one interval to be observed. A callback
/// that is already running is never interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Handle to a scheduled background task
///
/// Dropping the handle detaches the task; it keeps running until it finishes
/// or its token is cancelled.
#[derive(Debug)]
pub struct TimerHandle {
    name: String,
    token: CancellationToken,
    invocations: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl TimerHandle {
    /// Name of the background thread running this task
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cancel this task only
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether this task was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The task's cancellation token
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Number of completed callback invocations so far
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Acquire)
    }

    /// Whether the background thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the task to exit and return how many times the callback ran
    ///
    /// A repeating task only exits after it has been cancelled, so cancel it first.
    pub fn join(mut self) -> Result<u64, TimerError> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| TimerError::Panicked(self.name.clone()))?;
        }
        Ok(self.invocations())
    }
}

/// Background scheduler for deferred and periodic callbacks
///
/// Each call to [`Timer::schedule_once`] or [`Timer::schedule_repeating`]
/// spawns its own thread with its own [`CancellationToken`]; several schedules
/// on one timer never share cancellation state. [`Timer::cancel`] cancels
/// every task this timer has scheduled.
#[derive(Debug, Default)]
pub struct Timer {
    tasks: Vec<TrackedTask>,
    spawned: u64,
}

/// Bookkeeping for one task spawned by a [`Timer`]
#[derive(Debug)]
struct TrackedTask {
    token: CancellationToken,
    finished: Arc<AtomicBool>,
}

impl TrackedTask {
    fn is_live(&self) -> bool {
        !self.token.is_cancelled() && !self.finished.load(Ordering::Acquire)
    }
}

/// Marks a task finished when its thread exits, including by panic
struct FinishGuard(Arc<AtomicBool>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

impl Timer {
    /// Create a timer with no outstanding tasks
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` once after `delay`, unless cancelled first
    pub fn schedule_once<F>(&mut self, callback: F, delay: Duration) -> Result<TimerHandle, TimerError>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut callback = Some(callback);
        self.spawn_task("once", delay, false, move || {
            if let Some(callback) = callback.take() {
                callback();
            }
        })
    }

    /// Run `callback` every `interval` until cancelled
    pub fn schedule_repeating<F>(&mut self, callback: F, interval: Duration) -> Result<TimerHandle, TimerError>
    where
        F: FnMut() + Send + 'static,
    {
        self.spawn_task("repeating", interval, true, callback)
    }

    /// Cancel every task scheduled through this timer
    pub fn cancel(&mut self) {
        for task in self.tasks.drain(..) {
            task.token.cancel();
        }
        log::debug!("Timer cancelled all outstanding tasks");
    }

    /// Number of scheduled tasks that are neither cancelled nor finished
    pub fn outstanding(&self) -> usize {
        self.tasks.iter().filter(|task| task.is_live()).count()
    }

    fn spawn_task<F>(&mut self, kind: &str, period: Duration, repeat: bool, mut callback: F) -> Result<TimerHandle, TimerError>
    where
        F: FnMut() + Send + 'static,
    {
        self.spawned += 1;
        let name = format!("umbra-timer-{}-{}", kind, self.spawned);
        let token = CancellationToken::new();
        let invocations = Arc::new(AtomicU64::new(0));

        let finished = Arc::new(AtomicBool::new(false));

        let task_token = token.clone();
        let task_invocations = Arc::clone(&invocations);
        let guard = FinishGuard(Arc::clone(&finished));
        let thread = thread::Builder::new().name(name.clone()).spawn(move || {
            let _guard = guard;
            loop {
                if task_token.is_cancelled() {
                    break;
                }
                thread::sleep(period);
                if task_token.is_cancelled() {
                    break;
                }
                callback();
                task_invocations.fetch_add(1, Ordering::AcqRel);
                if !repeat {
                    break;
                }
            }
        })?;

        log::trace!("Scheduled {} ({:?})", name, period);
        self.tasks.retain(TrackedTask::is_live);
        self.tasks.push(TrackedTask {
            token: token.clone(),
            finished,
        });

        Ok(TimerHandle {
            name,
            token,
            invocations,
            thread: Some(thread),
        })
    }
}

/// Simple stopwatch for measuring elapsed time
#[derive(Debug)]
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch (no-op if already running)
    pub fn start(&mut self) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Reset the stopwatch to zero
    pub fn reset(&mut self) {
        self.start_time = None;
        self.elapsed = Duration::ZERO;
    }

    /// Restart the stopwatch (reset and start)
    pub fn restart(&mut self) {
        self.reset();
        self.start();
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        self.elapsed + self.start_time.map_or(Duration::ZERO, |start| start.elapsed())
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}

/// Frame timing for the main loop
#[derive(Debug)]
pub struct FrameClock {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a new frame clock
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance the clock (call once per frame)
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Seconds since the previous tick
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Seconds accumulated over all ticks
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Number of ticks so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average FPS since creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_cancelled_once_never_fires() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let mut timer = Timer::new();

        let handle = timer
            .schedule_once(move || flag.store(true, Ordering::SeqCst), Duration::from_millis(50))
            .expect("spawn timer");
        thread::sleep(Duration::from_millis(10));
        timer.cancel();

        assert_eq!(handle.join().expect("join"), 0);
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_once_fires_exactly_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut timer = Timer::new();

        let handle = timer
            .schedule_once(move || { counter.fetch_add(1, Ordering::SeqCst); }, Duration::from_millis(5))
            .expect("spawn timer");

        assert_eq!(handle.join().expect("join"), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_repeating_runs_within_tolerance_band() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut timer = Timer::new();

        let handle = timer
            .schedule_repeating(move || { counter.fetch_add(1, Ordering::SeqCst); }, Duration::from_millis(20))
            .expect("spawn timer");
        thread::sleep(Duration::from_millis(100));
        handle.cancel();
        let invocations = handle.join().expect("join");

        let observed = count.load(Ordering::SeqCst);
        assert_eq!(observed as u64, invocations);
        assert!((3..=6).contains(&observed), "ran {} times", observed);
    }

    #[test]
    fn test_schedules_have_independent_tokens() {
        let mut timer = Timer::new();
        let first = timer
            .schedule_repeating(|| {}, Duration::from_millis(5))
            .expect("spawn timer");
        let second = timer
            .schedule_repeating(|| {}, Duration::from_millis(5))
            .expect("spawn timer");
        assert_eq!(timer.outstanding(), 2);

        first.cancel();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(timer.outstanding(), 1);

        timer.cancel();
        assert!(second.is_cancelled());
        assert_eq!(timer.outstanding(), 0);
        first.join().expect("join first");
        second.join().expect("join second");
    }

    #[test]
    fn test_completed_once_tasks_are_not_outstanding() {
        let mut timer = Timer::new();
        for _ in 0..50 {
            let handle = timer
                .schedule_once(|| {}, Duration::from_millis(1))
                .expect("spawn timer");
            assert_eq!(handle.join().expect("join"), 1);
        }
        assert_eq!(timer.outstanding(), 0);
        // Finished tasks are pruned on the next schedule
        assert!(timer.tasks.len() <= 1);

        let pending = timer
            .schedule_once(|| {}, Duration::from_millis(200))
            .expect("spawn timer");
        assert_eq!(timer.outstanding(), 1);
        assert_eq!(timer.tasks.len(), 1);
        timer.cancel();
        assert_eq!(pending.join().expect("join"), 0);
    }

    #[test]
    fn test_panicking_callback_reports_error() {
        let mut timer = Timer::new();
        let handle = timer
            .schedule_once(|| panic!("boom"), Duration::from_millis(1))
            .expect("spawn timer");
        assert!(matches!(handle.join(), Err(TimerError::Panicked(_))));
    }

    #[test]
    fn test_stopwatch_accumulates_across_runs() {
        let mut stopwatch = Stopwatch::start_new();
        thread::sleep(Duration::from_millis(5));
        stopwatch.stop();
        let first = stopwatch.elapsed();
        assert!(first >= Duration::from_millis(5));
        assert!(!stopwatch.is_running());

        stopwatch.start();
        thread::sleep(Duration::from_millis(5));
        stopwatch.stop();
        assert!(stopwatch.elapsed() >= first + Duration::from_millis(5));

        stopwatch.reset();
        assert_eq!(stopwatch.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_frame_clock_counts_frames() {
        let mut clock = FrameClock::new();
        clock.tick();
        clock.tick();
        assert_eq!(clock.frame_count(), 2);
        assert!(clock.total_time() >= clock.delta_time());
    }
}
