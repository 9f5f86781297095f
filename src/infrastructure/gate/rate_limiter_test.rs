use std::time::Duration;
use std::time::Instant;

use chrono::Utc;

use super::RateLimiter;
use crate::domain::models::GenerationError;

#[test]
fn it_allows_requests_within_the_limit() {
    let limiter = RateLimiter::new(3, Duration::from_secs(60));
    let now = Instant::now();

    let first = limiter.check_at("10.0.0.1", now).unwrap();
    assert_eq!(first.limit, 3);
    assert_eq!(first.remaining, 2);

    let second = limiter.check_at("10.0.0.1", now).unwrap();
    assert_eq!(second.remaining, 1);

    let third = limiter.check_at("10.0.0.1", now).unwrap();
    assert_eq!(third.remaining, 0);
}

#[test]
fn it_rejects_requests_over_the_limit() {
    let limiter = RateLimiter::new(2, Duration::from_secs(60));
    let now = Instant::now();

    assert!(limiter.check_at("10.0.0.1", now).is_ok());
    assert!(limiter.check_at("10.0.0.1", now).is_ok());

    let rejected = limiter.check_at("10.0.0.1", now).unwrap_err();
    assert_eq!(rejected.remaining, 0);
    assert!(rejected.reset >= Utc::now().timestamp() + 59);

    let err = GenerationError::from(rejected);
    assert!(err.is_rate_limited());
}

#[test]
fn it_slides_the_window() {
    let limiter = RateLimiter::new(2, Duration::from_secs(60));
    let start = Instant::now();

    assert!(limiter.check_at("10.0.0.1", start).is_ok());
    assert!(limiter
        .check_at("10.0.0.1", start + Duration::from_secs(30))
        .is_ok());
    assert!(limiter
        .check_at("10.0.0.1", start + Duration::from_secs(45))
        .is_err());

    let later = limiter
        .check_at("10.0.0.1", start + Duration::from_secs(61))
        .unwrap();
    assert_eq!(later.remaining, 0);
}

#[test]
fn it_keys_limits_per_caller() {
    let limiter = RateLimiter::new(1, Duration::from_secs(60));
    let now = Instant::now();

    assert!(limiter.check_at("10.0.0.1", now).is_ok());
    assert!(limiter.check_at("10.0.0.1", now).is_err());
    assert!(limiter.check_at("10.0.0.2", now).is_ok());
}

#[test]
fn it_forgets_callers_once_their_window_expires() {
    let limiter = RateLimiter::new(5, Duration::from_secs(1));
    let start = Instant::now();

    for idx in 0..1000 {
        assert!(limiter.check_at(&format!("10.0.{}.{}", idx / 256, idx % 256), start).is_ok());
    }
    assert_eq!(limiter.requests.len(), 1000);

    assert!(limiter
        .check_at("10.9.9.9", start + Duration::from_secs(3600))
        .is_ok());
    assert_eq!(limiter.requests.len(), 1);
}

#[test]
fn it_keeps_callers_still_inside_the_window() {
    let limiter = RateLimiter::new(1, Duration::from_secs(60));
    let start = Instant::now();

    assert!(limiter.check_at("10.0.0.1", start).is_ok());
    assert!(limiter
        .check_at("10.0.0.2", start + Duration::from_secs(30))
        .is_ok());
    assert!(limiter
        .check_at("10.0.0.3", start + Duration::from_secs(75))
        .is_ok());

    assert_eq!(limiter.requests.len(), 2);
    assert!(limiter
        .check_at("10.0.0.2", start + Duration::from_secs(76))
        .is_err());
}
