//! Escalating failed-attempt lockout.
//!
//! `Normal` until the attempt threshold is hit, then a first timed lockout;
//! once the first lockout has been consumed, every further failure arms the
//! longer second-phase lockout. Success resets everything.
//!
//! Time is passed in as epoch milliseconds rather than read from a clock,
//! so the policy is testable and the caller controls the time source.

use std::time::Duration;

/// Thresholds and durations for the lockout machine. Policy constants are
/// owned by the embedding app; these are defaults, not fixed values.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    /// Failed attempts tolerated before the first lockout.
    pub max_attempts: i32,
    /// Duration of the first lockout.
    pub first_lockout: Duration,
    /// Duration of every lockout after the first.
    pub second_lockout: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            first_lockout: Duration::from_secs(30),
            second_lockout: Duration::from_secs(300),
        }
    }
}

/// Observable gate state at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutState {
    /// Attempts are accepted.
    Normal,
    /// First timed lockout is active.
    FirstLockout {
        /// When the lockout expires, epoch milliseconds.
        until_millis: i64,
    },
    /// Second-phase (longer) lockout is active.
    SecondLockout {
        /// When the lockout expires, epoch milliseconds.
        until_millis: i64,
    },
}

/// The persisted counters behind the state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockoutCounters {
    /// Consecutive failed attempts since the last success.
    pub failed_attempts: i32,
    /// Active lockout deadline, epoch milliseconds; 0 when none was set.
    pub deadline_millis: i64,
    /// Whether the first lockout has been consumed.
    pub second_phase: bool,
}

impl LockoutCounters {
    /// Derives the gate state at `now_millis`.
    #[must_use]
    pub fn state(&self, policy: &LockoutPolicy, now_millis: i64) -> LockoutState {
        if now_millis >= self.deadline_millis {
            return LockoutState::Normal;
        }
        if self.failed_attempts > policy.max_attempts {
            LockoutState::SecondLockout {
                until_millis: self.deadline_millis,
            }
        } else {
            LockoutState::FirstLockout {
                until_millis: self.deadline_millis,
            }
        }
    }

    /// Records a failed attempt and returns the resulting state.
    pub fn record_failure(&mut self, policy: &LockoutPolicy, now_millis: i64) -> LockoutState {
        self.failed_attempts = self.failed_attempts.saturating_add(1);
        if self.second_phase {
            if now_millis >= self.deadline_millis {
                self.deadline_millis = now_millis.saturating_add(millis(policy.second_lockout));
            }
        } else if self.failed_attempts >= policy.max_attempts {
            self.deadline_millis = now_millis.saturating_add(millis(policy.first_lockout));
            self.second_phase = true;
        }
        self.state(policy, now_millis)
    }

    /// Records a successful attempt: counters reset to zero, lockout
    /// cleared.
    pub fn record_success(&mut self) {
        *self = Self::default();
    }
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> LockoutPolicy {
        LockoutPolicy {
            max_attempts: 3,
            first_lockout: Duration::from_millis(1_000),
            second_lockout: Duration::from_millis(10_000),
        }
    }

    #[test]
    fn test_stays_normal_below_threshold() {
        let policy = policy();
        let mut counters = LockoutCounters::default();
        assert_eq!(counters.record_failure(&policy, 0), LockoutState::Normal);
        assert_eq!(counters.record_failure(&policy, 1), LockoutState::Normal);
        assert_eq!(counters.failed_attempts, 2);
    }

    #[test]
    fn test_threshold_sets_first_lockout() {
        let policy = policy();
        let mut counters = LockoutCounters::default();
        counters.record_failure(&policy, 0);
        counters.record_failure(&policy, 0);
        let state = counters.record_failure(&policy, 100);
        assert_eq!(state, LockoutState::FirstLockout { until_millis: 1_100 });
        assert!(counters.second_phase);
    }

    #[test]
    fn test_failure_after_first_lockout_escalates() {
        let policy = policy();
        let mut counters = LockoutCounters::default();
        for _ in 0..3 {
            counters.record_failure(&policy, 0);
        }
        // Past the first deadline, the next failure arms the longer phase.
        let state = counters.record_failure(&policy, 2_000);
        assert_eq!(
            state,
            LockoutState::SecondLockout {
                until_millis: 12_000
            }
        );
    }

    #[test]
    fn test_second_phase_rearms_on_each_expired_failure() {
        let policy = policy();
        let mut counters = LockoutCounters::default();
        for _ in 0..3 {
            counters.record_failure(&policy, 0);
        }
        counters.record_failure(&policy, 2_000);
        let state = counters.record_failure(&policy, 20_000);
        assert_eq!(
            state,
            LockoutState::SecondLockout {
                until_millis: 30_000
            }
        );
    }

    #[test]
    fn test_success_resets_everything() {
        let policy = policy();
        let mut counters = LockoutCounters::default();
        for _ in 0..4 {
            counters.record_failure(&policy, 0);
        }
        counters.record_success();
        assert_eq!(counters, LockoutCounters::default());
        assert_eq!(counters.state(&policy, 0), LockoutState::Normal);
    }

    #[test]
    fn test_deadline_holds_during_active_lockout() {
        let policy = policy();
        let mut counters = LockoutCounters::default();
        for _ in 0..3 {
            counters.record_failure(&policy, 0);
        }
        let before = counters.deadline_millis;
        // A failure recorded while still locked must not extend the window.
        counters.record_failure(&policy, 500);
        assert_eq!(counters.deadline_millis, before);
    }
}
