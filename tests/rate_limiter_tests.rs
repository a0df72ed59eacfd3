//! Rate limiter behaviour over simulated time
//!
//! A manual clock drives window expiry, penalties and eviction so every
//! scenario is deterministic.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use submission_guard::{
    infrastructure::{ManualClock, MemoryRateLimitBackend},
    ports::{Clock, RateLimitBackend, RateLimitError},
    value_objects::{RateLimitPolicies, RateLimitPolicy},
    Environment, LimitType, RateLimitResult, RateLimiter,
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

fn setup(environment: Environment) -> (Arc<ManualClock>, MemoryRateLimitBackend, RateLimiter) {
    let clock = Arc::new(ManualClock::new(start()));
    let backend = MemoryRateLimitBackend::new(RateLimitPolicies::default(), clock.clone());
    let limiter = RateLimiter::local(Arc::new(backend.clone()), environment);
    (clock, backend, limiter)
}

/// Backend that is always down, like an unreachable distributed store
struct UnreachableBackend;

#[async_trait]
impl RateLimitBackend for UnreachableBackend {
    fn name(&self) -> &'static str {
        "distributed"
    }

    async fn check(
        &self,
        _identifier: &str,
        _limit_type: LimitType,
    ) -> Result<RateLimitResult, RateLimitError> {
        Err(RateLimitError::Unavailable("connection refused".to_string()))
    }

    async fn clear(
        &self,
        _identifier: &str,
        _limit_type: Option<LimitType>,
    ) -> Result<(), RateLimitError> {
        Err(RateLimitError::Unavailable("connection refused".to_string()))
    }

    async fn clear_all(&self) -> Result<(), RateLimitError> {
        Err(RateLimitError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_default_form_limit_counts_down_then_denies() {
    let (_clock, _backend, limiter) = setup(Environment::Development);

    for expected_remaining in (0..15).rev() {
        let result = limiter
            .check_limit("client-X", LimitType::FormSubmission)
            .await;
        assert!(result.success);
        assert_eq!(result.limit, 15);
        assert_eq!(result.remaining, expected_remaining);
    }

    let result = limiter
        .check_limit("client-X", LimitType::FormSubmission)
        .await;
    assert!(!result.success);
    assert_eq!(result.remaining, 0);
}

#[tokio::test]
async fn test_identifiers_do_not_share_counters() {
    let (_clock, _backend, limiter) = setup(Environment::Development);

    for _ in 0..3 {
        limiter.check_limit("client-A", LimitType::Strict).await;
    }
    assert!(!limiter.check_limit("client-A", LimitType::Strict).await.success);

    let other = limiter.check_limit("client-B", LimitType::Strict).await;
    assert!(other.success);
    assert_eq!(other.remaining, 1);

    // Same client, different limit type
    assert!(
        limiter
            .check_limit("client-A", LimitType::FormSubmission)
            .await
            .success
    );
}

#[tokio::test]
async fn test_strict_window_reopens_after_reset() {
    let (clock, _backend, limiter) = setup(Environment::Development);

    assert!(limiter.check_limit("ip_1", LimitType::Strict).await.success);
    assert!(limiter.check_limit("ip_1", LimitType::Strict).await.success);
    let denied = limiter.check_limit("ip_1", LimitType::Strict).await;
    assert!(!denied.success);
    assert_eq!(denied.reset, start() + TimeDelta::seconds(60));
    assert_eq!(denied.retry_after_secs(clock.now()), 60);

    clock.advance(TimeDelta::seconds(61));
    let result = limiter.check_limit("ip_1", LimitType::Strict).await;
    assert!(result.success);
    assert_eq!(result.remaining, 1);
}

#[tokio::test]
async fn test_repeat_offender_gets_double_window() {
    let (clock, backend, limiter) = setup(Environment::Development);

    limiter.check_limit("ip_2", LimitType::Strict).await;
    limiter.check_limit("ip_2", LimitType::Strict).await;

    // First two denials keep the normal window
    for _ in 0..2 {
        let denied = limiter.check_limit("ip_2", LimitType::Strict).await;
        assert!(!denied.success);
        assert_eq!(denied.reset, start() + TimeDelta::seconds(60));
    }

    clock.advance(TimeDelta::seconds(10));
    let penalized = limiter.check_limit("ip_2", LimitType::Strict).await;
    assert!(!penalized.success);
    assert_eq!(penalized.reset, clock.now() + TimeDelta::seconds(120));

    let record = backend.record("ip_2", LimitType::Strict).unwrap();
    assert_eq!(record.violations(), 3);
    assert!(record.is_penalized());

    // The original window end no longer frees the client
    clock.advance(TimeDelta::seconds(55));
    assert!(!limiter.check_limit("ip_2", LimitType::Strict).await.success);
}

#[tokio::test]
async fn test_violations_survive_window_reset() {
    let (clock, backend, limiter) = setup(Environment::Development);

    for _ in 0..5 {
        limiter.check_limit("ip_3", LimitType::Strict).await;
    }
    let penalized_until = backend.record("ip_3", LimitType::Strict).unwrap().reset_time();

    clock.set(penalized_until + TimeDelta::seconds(1));
    assert!(limiter.check_limit("ip_3", LimitType::Strict).await.success);
    assert!(limiter.check_limit("ip_3", LimitType::Strict).await.success);

    // Still a repeat offender, so the very next denial is penalized again
    let denied = limiter.check_limit("ip_3", LimitType::Strict).await;
    assert!(!denied.success);
    assert_eq!(denied.reset, clock.now() + TimeDelta::seconds(120));
}

#[tokio::test]
async fn test_evicted_record_starts_fresh_without_sweep() {
    let (clock, backend, limiter) = setup(Environment::Development);

    for _ in 0..5 {
        limiter.check_limit("ip_4", LimitType::Strict).await;
    }
    let expires_at = backend.record("ip_4", LimitType::Strict).unwrap().expires_at();

    clock.set(expires_at + TimeDelta::seconds(1));
    let result = limiter.check_limit("ip_4", LimitType::Strict).await;
    assert!(result.success);
    assert_eq!(result.remaining, 1);

    let record = backend.record("ip_4", LimitType::Strict).unwrap();
    assert_eq!(record.count(), 1);
    assert_eq!(record.violations(), 0);
}

#[tokio::test]
async fn test_purge_drops_only_evicted_records() {
    let (clock, backend, limiter) = setup(Environment::Development);

    limiter.check_limit("old", LimitType::FormSubmission).await;
    clock.advance(TimeDelta::minutes(6));
    limiter.check_limit("fresh", LimitType::FormSubmission).await;
    clock.advance(TimeDelta::seconds(5));

    assert_eq!(backend.len(), 2);
    assert_eq!(backend.purge_expired(), 1);
    assert!(backend.record("old", LimitType::FormSubmission).is_none());
    assert!(backend.record("fresh", LimitType::FormSubmission).is_some());
}

#[tokio::test]
async fn test_custom_policy_applies() {
    let clock = Arc::new(ManualClock::new(start()));
    let policy = RateLimitPolicy::new(5, Duration::from_secs(10)).unwrap();
    let backend = MemoryRateLimitBackend::new(
        RateLimitPolicies::new().with_policy(LimitType::AdminAction, policy),
        clock,
    );
    let limiter = RateLimiter::local(Arc::new(backend), Environment::Test);

    for _ in 0..5 {
        assert!(limiter.check_limit("admin", LimitType::AdminAction).await.success);
    }
    let denied = limiter.check_limit("admin", LimitType::AdminAction).await;
    assert!(!denied.success);
    assert_eq!(denied.limit, 5);
}

#[tokio::test]
async fn test_unknown_limit_name_uses_form_policy() {
    let (_clock, _backend, limiter) = setup(Environment::Development);
    let result = limiter.check_limit_named("ip_5", "bogus").await;
    assert!(result.success);
    assert_eq!(result.limit, 15);
}

#[tokio::test]
async fn test_unreachable_primary_falls_back_to_memory() {
    let (_clock, backend, limiter) = setup(Environment::Development);
    let limiter = limiter.with_primary(Arc::new(UnreachableBackend));
    assert_eq!(limiter.active_backend(), "distributed");

    assert!(limiter.check_limit("ip_6", LimitType::Strict).await.success);
    assert!(limiter.check_limit("ip_6", LimitType::Strict).await.success);
    assert!(!limiter.check_limit("ip_6", LimitType::Strict).await.success);
    assert_eq!(backend.record("ip_6", LimitType::Strict).unwrap().count(), 2);

    // Clearing tolerates the primary being down
    limiter.clear_limit("ip_6", None).await.unwrap();
    assert!(limiter.check_limit("ip_6", LimitType::Strict).await.success);
}

#[tokio::test]
async fn test_unreachable_backends_fail_open() {
    let limiter = RateLimiter::local(Arc::new(UnreachableBackend), Environment::Development);
    let result = limiter.check_limit("ip_7", LimitType::Strict).await;
    assert!(result.success);
    assert_eq!(result.limit, 2);
    assert_eq!(result.remaining, 2);

    let custom = RateLimitPolicy::new(9, Duration::from_secs(10)).unwrap();
    let limiter = limiter.with_policies(RateLimitPolicies::new().with_policy(LimitType::Strict, custom));
    let result = limiter.check_limit("ip_7", LimitType::Strict).await;
    assert_eq!(result.limit, 9);
    assert_eq!(result.remaining, 9);
}

#[tokio::test]
async fn test_reset_refused_in_production() {
    let (_clock, _backend, limiter) = setup(Environment::Production);

    assert_eq!(
        limiter.clear_limit("ip_8", Some(LimitType::Strict)).await,
        Err(RateLimitError::Forbidden(Environment::Production))
    );
    assert_eq!(
        limiter.clear_all_limits().await,
        Err(RateLimitError::Forbidden(Environment::Production))
    );
}

#[tokio::test]
async fn test_reset_allowed_outside_production() {
    let (_clock, backend, limiter) = setup(Environment::Test);

    for _ in 0..3 {
        limiter.check_limit("ip_9", LimitType::Strict).await;
    }
    limiter.check_limit("ip_10", LimitType::Strict).await;
    assert!(!limiter.check_limit("ip_9", LimitType::Strict).await.success);

    limiter
        .clear_limit("ip_9", Some(LimitType::Strict))
        .await
        .unwrap();
    assert!(limiter.check_limit("ip_9", LimitType::Strict).await.success);

    limiter.clear_all_limits().await.unwrap();
    assert!(backend.is_empty());
}
