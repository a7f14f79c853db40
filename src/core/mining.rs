// Mining control - everything a long-running nonce search needs to stop early
// and to report where it is without coupling the engine to any output.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default number of attempts between two progress reports
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100_000;

/// Why a search stopped without finding a proof
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// `MiningControl::cancel` was called
    Cancelled,
    /// The control's deadline passed
    TimedOut,
    /// Every `u64` nonce was tried
    Exhausted,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Cancelled => write!(f, "cancelled"),
            AbortReason::TimedOut => write!(f, "timed out"),
            AbortReason::Exhausted => write!(f, "nonce space exhausted"),
        }
    }
}

/// Result of anything that has to run a proof-of-work search.
///
/// An aborted search is neither a success nor an error: callers decide
/// whether to retry, give up or lower the difficulty.
#[derive(Debug, Clone, PartialEq)]
pub enum MiningOutcome<T> {
    Found(T),
    Aborted(AbortReason),
}

impl<T> MiningOutcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, MiningOutcome::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            MiningOutcome::Found(value) => Some(value),
            MiningOutcome::Aborted(_) => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> MiningOutcome<U> {
        match self {
            MiningOutcome::Found(value) => MiningOutcome::Found(f(value)),
            MiningOutcome::Aborted(reason) => MiningOutcome::Aborted(reason),
        }
    }
}

/// Cancellation handle shared between a search and whoever may stop it.
///
/// Clones share the same flag, so a clone handed to another thread can
/// cancel a search running here.
#[derive(Debug, Clone, Default)]
pub struct MiningControl {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl MiningControl {
    /// A control that only stops on an explicit `cancel`
    pub fn never() -> MiningControl {
        MiningControl::default()
    }

    /// A control that also stops once `timeout` has elapsed from now
    pub fn with_timeout(timeout: Duration) -> MiningControl {
        MiningControl {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Build from an optional timeout, as read from configuration
    pub fn from_timeout(timeout: Option<Duration>) -> MiningControl {
        match timeout {
            Some(timeout) => MiningControl::with_timeout(timeout),
            None => MiningControl::never(),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub(crate) fn deadline_passed(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    /// Checks both stop conditions, cancellation first
    pub fn abort_reason(&self) -> Option<AbortReason> {
        if self.is_cancelled() {
            Some(AbortReason::Cancelled)
        } else if self.deadline_passed() {
            Some(AbortReason::TimedOut)
        } else {
            None
        }
    }
}

/// Snapshot handed to a progress observer
#[derive(Debug, Clone, PartialEq)]
pub struct MiningProgress {
    pub attempts: u64,
    pub elapsed: Duration,
    pub last_hash: String,
}

impl fmt::Display for MiningProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Attempts: {} | Elapsed: {:.2}s | Hash: {}",
            self.attempts,
            self.elapsed.as_secs_f64(),
            self.last_hash
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_control_does_not_abort() {
        let control = MiningControl::never();
        assert_eq!(control.abort_reason(), None);
        assert!(control.deadline().is_none());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let control = MiningControl::never();
        let remote = control.clone();
        remote.cancel();
        assert!(control.is_cancelled());
        assert_eq!(control.abort_reason(), Some(AbortReason::Cancelled));
    }

    #[test]
    fn test_zero_timeout_reports_timed_out() {
        let control = MiningControl::with_timeout(Duration::ZERO);
        assert_eq!(control.abort_reason(), Some(AbortReason::TimedOut));
    }

    #[test]
    fn test_cancellation_wins_over_timeout() {
        let control = MiningControl::with_timeout(Duration::ZERO);
        control.cancel();
        assert_eq!(control.abort_reason(), Some(AbortReason::Cancelled));
    }

    #[test]
    fn test_outcome_helpers() {
        let found: MiningOutcome<u64> = MiningOutcome::Found(3);
        assert!(found.is_found());
        assert_eq!(found.clone().map(|n| n * 2), MiningOutcome::Found(6));
        assert_eq!(found.found(), Some(3));

        let aborted: MiningOutcome<u64> = MiningOutcome::Aborted(AbortReason::TimedOut);
        assert!(!aborted.is_found());
        assert_eq!(aborted.found(), None);
    }
}
