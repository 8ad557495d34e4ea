//! Frame timing utilities
//!
//! [`FrameTimer`] measures delta and elapsed time. [`FramePacer`] decides
//! when the next frame is due at a fixed target rate. It takes the current
//! instant as an argument so callers (and tests) control the clock.

use std::time::{Duration, Instant};

use chrono::NaiveDateTime;

/// Format accepted by [`parse_timestamp`]
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Default target framerate
pub const DEFAULT_FRAMERATE: f64 = 60.0;

/// Timer for tracking frame timing
///
/// Provides delta time, elapsed time and frame counting.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    start_time: Instant,
    last_frame_time: Instant,
    delta_time: Duration,
    elapsed: Duration,
    frame_count: u64,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    /// Create a new frame timer, starting now
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        Self {
            start_time: now,
            last_frame_time: now,
            delta_time: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Call at the start of each frame; returns the delta time in seconds
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f32 {
        self.delta_time = now.saturating_duration_since(self.last_frame_time);
        self.elapsed = now.saturating_duration_since(self.start_time);
        self.last_frame_time = now;
        self.frame_count += 1;
        self.delta_time.as_secs_f32()
    }

    /// Delta time for the current frame in seconds
    #[inline]
    pub fn delta_time(&self) -> f32 {
        self.delta_time.as_secs_f32()
    }

    /// Total elapsed time since the timer was started, in seconds
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Current frame number (incremented by `tick()`)
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Instantaneous frames per second based on delta time
    #[inline]
    pub fn fps(&self) -> f32 {
        let dt = self.delta_time.as_secs_f32();
        if dt > 0.0 {
            1.0 / dt
        } else {
            0.0
        }
    }

    /// Average frames per second over the timer's lifetime
    #[inline]
    pub fn average_fps(&self) -> f32 {
        if self.elapsed.is_zero() {
            0.0
        } else {
            self.frame_count as f32 / self.elapsed.as_secs_f32()
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Fixed-interval frame pacer
///
/// A frame is due once `now` reaches the deadline. After a frame, the
/// deadline advances by one frame time. If the loop has fallen more than a
/// full frame behind, the deadline is re-anchored to `now + frametime`
/// instead of bursting frames to catch up.
#[derive(Debug, Clone)]
pub struct FramePacer {
    framerate: f64,
    frametime: Duration,
    deadline: Instant,
    missed: u64,
}

impl FramePacer {
    /// Create a pacer whose first frame is due immediately
    ///
    /// Non-positive or non-finite rates fall back to [`DEFAULT_FRAMERATE`].
    pub fn new(framerate: f64, now: Instant) -> Self {
        let framerate = sanitize_framerate(framerate);
        Self {
            framerate,
            frametime: Duration::from_secs_f64(1.0 / framerate),
            deadline: now,
            missed: 0,
        }
    }

    pub fn framerate(&self) -> f64 {
        self.framerate
    }

    pub fn frametime(&self) -> Duration {
        self.frametime
    }

    /// Instant at which the next frame is due
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Number of times the deadline had to be re-anchored
    pub fn missed_frames(&self) -> u64 {
        self.missed
    }

    /// Change the target rate; takes effect from the next deadline
    pub fn set_framerate(&mut self, framerate: f64) {
        let framerate = sanitize_framerate(framerate);
        if framerate != self.framerate {
            self.framerate = framerate;
            self.frametime = Duration::from_secs_f64(1.0 / framerate);
        }
    }

    #[inline]
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Time left until the next frame is due
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    /// Advance the deadline after a frame ran at `now`
    pub fn finish_frame(&mut self, now: Instant) {
        let next = self.deadline + self.frametime;
        if now > next {
            self.missed += 1;
            self.deadline = now + self.frametime;
        } else {
            self.deadline = next;
        }
    }

    /// Block until the next frame is due
    ///
    /// Sleeps for most of the remaining time and yields for the last stretch
    /// to stay close to the deadline.
    pub fn wait(&self) {
        const SPIN_MARGIN: Duration = Duration::from_millis(1);
        loop {
            let remaining = self.remaining(Instant::now());
            if remaining.is_zero() {
                return;
            }
            if remaining > SPIN_MARGIN {
                std::thread::sleep(remaining - SPIN_MARGIN);
            } else {
                std::thread::yield_now();
            }
        }
    }
}

fn sanitize_framerate(framerate: f64) -> f64 {
    if framerate.is_finite() && framerate > 0.0 {
        framerate
    } else {
        DEFAULT_FRAMERATE
    }
}

/// Sleep the current thread for the given number of microseconds
pub fn sleep_micros(micros: u64) {
    std::thread::sleep(Duration::from_micros(micros));
}

/// Parse a `YYYY-MM-DDTHH:MM:SS` timestamp into Unix seconds (UTC)
///
/// Returns 0 when the string does not match the format. Trailing content
/// such as a `Z` suffix is ignored.
pub fn parse_timestamp(timestamp: &str) -> i64 {
    let trimmed = timestamp.trim();
    let head = trimmed.get(..19).unwrap_or(trimmed);
    match NaiveDateTime::parse_from_str(head, TIMESTAMP_FORMAT) {
        Ok(dt) => dt.and_utc().timestamp(),
        Err(err) => {
            tracing::warn!("Failed to parse timestamp '{}': {}", timestamp, err);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timer() {
        let start = Instant::now();
        let mut timer = FrameTimer::starting_at(start);
        assert_eq!(timer.frame_count(), 0);

        let dt = timer.tick_at(start + Duration::from_millis(20));
        assert!((dt - 0.02).abs() < 1e-4);
        assert!((timer.fps() - 50.0).abs() < 0.1);

        timer.tick_at(start + Duration::from_millis(40));
        assert_eq!(timer.frame_count(), 2);
        assert!((timer.elapsed() - 0.04).abs() < 1e-4);
    }

    #[test]
    fn test_frame_timer_reset() {
        let mut timer = FrameTimer::new();
        timer.tick();
        timer.tick();
        assert_eq!(timer.frame_count(), 2);

        timer.reset();
        assert_eq!(timer.frame_count(), 0);
        assert_eq!(timer.delta_time(), 0.0);
    }

    #[test]
    fn test_pacer_first_frame_due_immediately() {
        let now = Instant::now();
        let pacer = FramePacer::new(60.0, now);
        assert!(pacer.is_due(now));
    }

    #[test]
    fn test_pacer_advances_by_frametime() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(100.0, start);
        let frametime = pacer.frametime();
        assert_eq!(frametime, Duration::from_millis(10));

        pacer.finish_frame(start + Duration::from_millis(2));
        assert_eq!(pacer.deadline(), start + frametime);
        assert!(!pacer.is_due(start + Duration::from_millis(5)));
        assert!(pacer.is_due(start + Duration::from_millis(10)));
        assert_eq!(pacer.missed_frames(), 0);
    }

    #[test]
    fn test_pacer_reanchors_when_behind() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(100.0, start);

        // 35ms late: more than one frame behind
        let late = start + Duration::from_millis(35);
        pacer.finish_frame(late);
        assert_eq!(pacer.deadline(), late + Duration::from_millis(10));
        assert_eq!(pacer.missed_frames(), 1);
        assert!(!pacer.is_due(late));
    }

    #[test]
    fn test_pacer_rate_change_and_sanitize() {
        let now = Instant::now();
        let mut pacer = FramePacer::new(0.0, now);
        assert_eq!(pacer.framerate(), DEFAULT_FRAMERATE);

        pacer.set_framerate(f64::NAN);
        assert_eq!(pacer.framerate(), DEFAULT_FRAMERATE);

        pacer.set_framerate(30.0);
        assert_eq!(pacer.framerate(), 30.0);
        assert!((pacer.frametime().as_secs_f64() - 1.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_pacer_remaining() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(100.0, start);
        pacer.finish_frame(start);
        assert_eq!(
            pacer.remaining(start + Duration::from_millis(4)),
            Duration::from_millis(6)
        );
        assert_eq!(
            pacer.remaining(start + Duration::from_millis(40)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1970-01-01T00:00:00"), 0);
        assert_eq!(parse_timestamp("2021-03-04T05:06:07Z"), 1_614_834_367);
        assert_eq!(parse_timestamp("not a date"), 0);
        assert_eq!(parse_timestamp(""), 0);
    }
}
