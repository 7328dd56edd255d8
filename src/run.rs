//! Run termination shared by every engine.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why an engine stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerminationReason {
    /// The generation, iteration or temperature budget was used up.
    MaxIterations,
    /// The best schedule stopped improving.
    Converged,
    /// The cancellation flag was raised.
    Cancelled,
    /// The wall-clock limit expired.
    TimedOut,
}

impl TerminationReason {
    /// Returns `true` if the run was cut short from outside the search.
    pub fn is_interrupted(self) -> bool {
        matches!(self, TerminationReason::Cancelled | TerminationReason::TimedOut)
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TerminationReason::MaxIterations => "max_iterations",
            TerminationReason::Converged => "converged",
            TerminationReason::Cancelled => "cancelled",
            TerminationReason::TimedOut => "timed_out",
        })
    }
}

/// Cooperative cancellation and deadline, polled at iteration boundaries.
#[derive(Debug, Clone)]
pub(crate) struct RunControl {
    cancel: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

impl RunControl {
    pub(crate) fn new(cancel: Option<Arc<AtomicBool>>, time_limit_ms: Option<u64>) -> Self {
        Self {
            cancel,
            deadline: time_limit_ms.map(|ms| Instant::now() + Duration::from_millis(ms)),
        }
    }

    /// Returns the interruption reason, if the run must stop now.
    pub(crate) fn check(&self) -> Option<TerminationReason> {
        if let Some(ref flag) = self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Some(TerminationReason::Cancelled);
            }
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(TerminationReason::TimedOut),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_limits_never_stops() {
        assert_eq!(RunControl::new(None, None).check(), None);
    }

    #[test]
    fn test_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let control = RunControl::new(Some(flag.clone()), None);
        assert_eq!(control.check(), None);
        flag.store(true, Ordering::Relaxed);
        assert_eq!(control.check(), Some(TerminationReason::Cancelled));
    }

    #[test]
    fn test_expired_deadline() {
        let control = RunControl::new(None, Some(1));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(control.check(), Some(TerminationReason::TimedOut));
    }

    #[test]
    fn test_interrupted() {
        assert!(TerminationReason::Cancelled.is_interrupted());
        assert!(TerminationReason::TimedOut.is_interrupted());
        assert!(!TerminationReason::Converged.is_interrupted());
    }
}
