//! Tests for cache policy configuration.

use std::time::Duration;

use flightbox::CachePolicy;
use flightbox::policy::DEFAULT_TTL;

#[test]
fn test_default_policy_uses_five_minutes() {
    assert_eq!(DEFAULT_TTL, Duration::from_secs(300));
    assert_eq!(CachePolicy::default().default_ttl, Some(DEFAULT_TTL));
}

#[test]
fn test_explicit_ttl_wins_over_default() {
    let policy = CachePolicy::default();
    assert_eq!(
        policy.resolve_ttl(Some(Duration::from_secs(1))),
        Some(Duration::from_secs(1))
    );
    assert_eq!(policy.resolve_ttl(None), Some(DEFAULT_TTL));
    assert_eq!(CachePolicy::never_expire().resolve_ttl(None), None);
}

#[test]
fn test_policy_from_yaml() {
    let policy: CachePolicy = serde_saphyr::from_str("default_ttl: 10m").unwrap();
    assert_eq!(policy.default_ttl, Some(Duration::from_secs(600)));
}

#[test]
fn test_policy_null_ttl_never_expires() {
    let policy: CachePolicy = serde_json::from_str(r#"{"default_ttl": null}"#).unwrap();
    assert_eq!(policy, CachePolicy::never_expire());
}
