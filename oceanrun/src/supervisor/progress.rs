//! Progress classification for the model's stdout stream.
//!
//! Model logs are heterogeneous, so progress is recognized structurally:
//! a line counts as a progress report iff it splits into exactly nine
//! whitespace-separated fields and the first field parses as an integer
//! step counter. Everything else is noise and ignored.
//!
//! The parser is an explicit state machine (Initializing -> Running ->
//! Terminal) so that the progress contract is testable without spawning
//! a process. The caller supplies timestamps, which keeps ETA arithmetic
//! deterministic under test.

use std::time::{Duration, Instant};

/// Number of whitespace fields in a model progress line.
const PROGRESS_FIELD_COUNT: usize = 9;

/// Where the supervised run currently is, judging by its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No progress line seen yet.
    Initializing,
    /// At least one progress line seen.
    Running,
    /// The process has exited.
    Terminal,
}

/// An observation worth reporting to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// First recognizable output arrived but no progress line yet;
    /// emitted at most once.
    Initializing,
    /// A progress line was seen.
    Step {
        /// Steps completed since the baseline (first) progress line.
        completed: u64,
        /// Steps requested for the whole run.
        requested: u64,
        /// Wall time since the baseline progress line.
        elapsed: Duration,
        /// Estimated time to completion; `None` until a rate exists.
        eta: Option<Duration>,
    },
}

/// Extracts the step counter from a line iff it is a progress line.
pub fn parse_step(line: &str) -> Option<u64> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != PROGRESS_FIELD_COUNT {
        return None;
    }
    fields[0].parse().ok()
}

/// Streaming progress parser for one supervised run.
#[derive(Debug)]
pub struct ProgressParser {
    state: RunState,
    requested_steps: u64,
    baseline: Option<(u64, Instant)>,
    announced_init: bool,
}

impl ProgressParser {
    /// Creates a parser for a run of `requested_steps` time steps.
    pub fn new(requested_steps: u64) -> Self {
        Self {
            state: RunState::Initializing,
            requested_steps,
            baseline: None,
            announced_init: false,
        }
    }

    /// Current state of the run.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Feeds one stdout line, observed at `now`.
    ///
    /// Returns an event when the line changes what should be reported:
    /// the one-time initialization notice, or a progress update.
    pub fn observe(&mut self, line: &str, now: Instant) -> Option<ProgressEvent> {
        match parse_step(line) {
            Some(step) => {
                self.state = RunState::Running;
                let (baseline_step, started) = *self.baseline.get_or_insert((step, now));
                let completed = step.saturating_sub(baseline_step);
                let elapsed = now.duration_since(started);
                let eta = self.estimate_remaining(completed, elapsed);
                Some(ProgressEvent::Step {
                    completed,
                    requested: self.requested_steps,
                    elapsed,
                    eta,
                })
            }
            None if self.state == RunState::Initializing && !self.announced_init => {
                self.announced_init = true;
                Some(ProgressEvent::Initializing)
            }
            None => None,
        }
    }

    /// Marks the process as exited.
    pub fn finish(&mut self) {
        self.state = RunState::Terminal;
    }

    /// ETA = remaining steps x (elapsed wall time / elapsed steps).
    fn estimate_remaining(&self, completed: u64, elapsed: Duration) -> Option<Duration> {
        if completed == 0 {
            return None;
        }
        let remaining = self.requested_steps.saturating_sub(completed);
        let per_step = elapsed.as_secs_f64() / completed as f64;
        Some(Duration::from_secs_f64(per_step * remaining as f64))
    }
}
