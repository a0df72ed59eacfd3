use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{RateLimitPolicy, RateLimitResult};

/// Lifecycle state of a record relative to a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Counting within the current window
    Active,
    /// Past `reset_time`; the next check starts a fresh window
    Expired,
    /// Past `expires_at`; equivalent to no record at all
    Evicted,
}

/// Per-(limit type, identifier) counter owned by the in-memory store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    count: u32,
    reset_time: DateTime<Utc>,
    violations: u32,
    expires_at: DateTime<Utc>,
}

impl RateLimitRecord {
    /// How long a record outlives its window before it may be evicted
    pub const GRACE_PERIOD: TimeDelta = TimeDelta::minutes(5);
    /// Denials needed before every further denial doubles the window
    pub const PENALTY_THRESHOLD: u32 = 3;

    /// Create a fresh record with an empty window starting at `now`
    pub fn new(now: DateTime<Utc>, policy: &RateLimitPolicy) -> Self {
        Self::fresh(now, policy, 0)
    }

    fn fresh(now: DateTime<Utc>, policy: &RateLimitPolicy, violations: u32) -> Self {
        let reset_time = saturating_add(now, policy.window_delta());
        Self {
            count: 0,
            reset_time,
            violations,
            expires_at: saturating_add(reset_time, Self::GRACE_PERIOD),
        }
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> RecordState {
        if now > self.expires_at {
            RecordState::Evicted
        } else if now > self.reset_time {
            RecordState::Expired
        } else {
            RecordState::Active
        }
    }

    /// Gate one request: admit while `count < max`, otherwise record a violation.
    ///
    /// Evicted records restart from scratch, expired ones open a new window but
    /// keep their violation history. Once `violations` reaches the penalty
    /// threshold, each denial pushes the reset out to twice the window.
    pub fn check(&mut self, now: DateTime<Utc>, policy: &RateLimitPolicy) -> RateLimitResult {
        match self.state_at(now) {
            RecordState::Evicted => *self = Self::fresh(now, policy, 0),
            RecordState::Expired => *self = Self::fresh(now, policy, self.violations),
            RecordState::Active => {}
        }

        if self.count >= policy.max() {
            self.violations = self.violations.saturating_add(1);
            if self.violations >= Self::PENALTY_THRESHOLD {
                let penalty = policy
                    .window_delta()
                    .checked_mul(2)
                    .unwrap_or(TimeDelta::MAX);
                self.reset_time = saturating_add(now, penalty);
                self.expires_at = saturating_add(self.reset_time, Self::GRACE_PERIOD);
            }
            return RateLimitResult::denied(policy.max(), self.reset_time);
        }

        self.count += 1;
        RateLimitResult::allowed(policy.max(), self.count, self.reset_time)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn reset_time(&self) -> DateTime<Utc> {
        self.reset_time
    }

    pub fn violations(&self) -> u32 {
        self.violations
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_penalized(&self) -> bool {
        self.violations >= Self::PENALTY_THRESHOLD
    }
}

/// Clamp at the latest representable instant instead of overflowing
fn saturating_add(at: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    at.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}
