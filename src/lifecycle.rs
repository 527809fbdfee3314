//! Lifecycle contract of a generated algorithm, as seen from the host
//!
//! The host framework constructs an algorithm, calls `initialize()` once,
//! `execute()` once per event of its shard, and `finalize()` once. This
//! module models that contract so a host adapter (or a test double) can be
//! driven through it with the transitions enforced.

use thiserror::Error;

/// Lifecycle state of one algorithm instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Constructed,
    Initialized,
    Executing,
    Finalized,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Constructed => "constructed",
            Phase::Initialized => "initialized",
            Phase::Executing => "executing",
            Phase::Finalized => "finalized",
        };
        f.write_str(s)
    }
}

/// Status returned by each phase method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Success,
    Failure,
    Recoverable,
}

impl StatusCode {
    pub fn is_success(self) -> bool {
        matches!(self, StatusCode::Success)
    }

    /// The framework constant this status corresponds to
    pub fn as_cpp(self) -> &'static str {
        match self {
            StatusCode::Success => "StatusCode::SUCCESS",
            StatusCode::Failure => "StatusCode::FAILURE",
            StatusCode::Recoverable => "StatusCode::RECOVERABLE",
        }
    }
}

/// Errors raised when the lifecycle contract is violated
#[derive(Debug, Error, PartialEq)]
pub enum LifecycleError {
    #[error("illegal lifecycle transition from {from} to {to}")]
    IllegalTransition { from: Phase, to: Phase },

    #[error("execute called after initialize returned {status:?}")]
    InitializeFailed { status: StatusCode },
}

/// Enforces the linear, one-directional phase order
#[derive(Debug, Clone)]
pub struct LifecycleTracker {
    phase: Phase,
    initialize_status: Option<StatusCode>,
    executions: u64,
}

impl Default for LifecycleTracker {
    fn default() -> Self {
        Self {
            phase: Phase::Constructed,
            initialize_status: None,
            executions: 0,
        }
    }
}

impl LifecycleTracker {
    /// A tracker for a freshly constructed instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of `execute()` calls entered so far
    pub fn executions(&self) -> u64 {
        self.executions
    }

    /// Move to `to`, if the contract allows it
    pub fn enter(&mut self, to: Phase) -> Result<(), LifecycleError> {
        use Phase::*;

        let legal = matches!(
            (self.phase, to),
            (Constructed, Initialized)
                | (Initialized, Executing)
                | (Executing, Executing)
                | (Initialized, Finalized)
                | (Executing, Finalized)
        );
        if !legal {
            return Err(LifecycleError::IllegalTransition {
                from: self.phase,
                to,
            });
        }

        if to == Executing {
            if let Some(status) = self.initialize_status.filter(|s| !s.is_success()) {
                return Err(LifecycleError::InitializeFailed { status });
            }
            self.executions += 1;
        }

        self.phase = to;
        Ok(())
    }

    /// Record what `initialize()` returned
    pub fn record_initialize(&mut self, status: StatusCode) {
        self.initialize_status = Some(status);
    }

    /// Whether `execute()` may still be called
    pub fn can_execute(&self) -> bool {
        matches!(self.phase, Phase::Initialized | Phase::Executing)
            && self.initialize_status.map_or(true, StatusCode::is_success)
    }
}

/// What to do with the rest of the shard after `execute()` fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContinuationPolicy {
    /// Keep feeding events; failures are only recorded
    #[default]
    Continue,
    /// Stop the shard at the first non-success status
    HaltOnFailure,
}

/// Whether `finalize()` runs when `initialize()` failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinalizePolicy {
    #[default]
    Always,
    SkipAfterFailedInitialize,
}

/// The phase methods of an algorithm instance
pub trait Algorithm {
    type Event;

    fn initialize(&mut self) -> StatusCode;
    fn execute(&mut self, event: &Self::Event) -> StatusCode;
    fn finalize(&mut self) -> StatusCode;
}

/// Statuses returned over one run, unmodified
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub initialize: StatusCode,
    /// One entry per `execute()` call, in event order
    pub executions: Vec<StatusCode>,
    /// `None` if `finalize()` was skipped
    pub finalize: Option<StatusCode>,
    /// The continuation policy stopped the shard early
    pub halted: bool,
}

impl RunReport {
    pub fn failed_executions(&self) -> usize {
        self.executions.iter().filter(|s| !s.is_success()).count()
    }
}

/// Drives one algorithm instance over one shard of events, sequentially
#[derive(Debug, Clone, Default)]
pub struct EventLoop {
    continuation: ContinuationPolicy,
    finalize: FinalizePolicy,
}

impl EventLoop {
    /// Create an event loop with default policies
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the continuation policy
    pub fn with_continuation(mut self, policy: ContinuationPolicy) -> Self {
        self.continuation = policy;
        self
    }

    /// Set the finalize policy
    pub fn with_finalize(mut self, policy: FinalizePolicy) -> Self {
        self.finalize = policy;
        self
    }

    /// Run the full lifecycle of `algorithm` over `events`
    pub fn run<A, I>(&self, algorithm: &mut A, events: I) -> Result<RunReport, LifecycleError>
    where
        A: Algorithm,
        I: IntoIterator<Item = A::Event>,
    {
        let mut tracker = LifecycleTracker::new();

        tracker.enter(Phase::Initialized)?;
        let initialize = algorithm.initialize();
        tracker.record_initialize(initialize);

        let mut report = RunReport {
            initialize,
            executions: Vec::new(),
            finalize: None,
            halted: false,
        };

        if !initialize.is_success() {
            tracing::warn!(status = ?initialize, "initialize failed, no events will be executed");
            if self.finalize == FinalizePolicy::Always {
                tracker.enter(Phase::Finalized)?;
                report.finalize = Some(algorithm.finalize());
            }
            return Ok(report);
        }

        for event in events {
            tracker.enter(Phase::Executing)?;
            let status = algorithm.execute(&event);
            report.executions.push(status);
            if !status.is_success() {
                tracing::debug!(
                    event = tracker.executions(),
                    status = ?status,
                    "execute returned non-success"
                );
                if self.continuation == ContinuationPolicy::HaltOnFailure {
                    tracing::warn!(event = tracker.executions(), "halting shard");
                    report.halted = true;
                    break;
                }
            }
        }

        tracker.enter(Phase::Finalized)?;
        report.finalize = Some(algorithm.finalize());
        tracing::debug!(
            executions = report.executions.len(),
            failed = report.failed_executions(),
            "run complete"
        );
        Ok(report)
    }
}
