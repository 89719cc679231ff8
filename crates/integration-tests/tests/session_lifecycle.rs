//! Integration tests for login, logout and background token refresh.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use glt_client::storage::keys;
use glt_integration_tests::{Harness, PASSWORD, REFRESH_INTERVAL};

// =============================================================================
// Login / logout
// =============================================================================

#[tokio::test]
async fn test_authenticated_after_login_and_not_after_logout() {
    let harness = Harness::new();
    harness.backend.fail_blacklist();

    harness
        .session
        .login("ada@example.org", PASSWORD)
        .await
        .unwrap();
    assert!(harness.session.is_authenticated());

    harness.session.logout().await;
    assert!(!harness.session.is_authenticated());
    assert_eq!(harness.backend.blacklist_count(), 1);
    assert!(harness.storage.get(keys::TOKENS).unwrap().is_none());
}

#[tokio::test]
async fn test_wrong_password_keeps_server_message() {
    let harness = Harness::new();
    let err = harness
        .session
        .login("ada@example.org", "nope")
        .await
        .unwrap_err();

    assert!(err.is_auth_failure());
    assert_eq!(
        err.user_message(),
        "No active account found with the given credentials"
    );
    assert!(!harness.session.is_authenticated());
    assert!(!harness.session.is_refreshing());
}

#[tokio::test]
async fn test_logout_when_logged_out_skips_blacklist() {
    let harness = Harness::new();
    harness.session.logout().await;
    assert_eq!(harness.backend.blacklist_count(), 0);
}

// =============================================================================
// Refresh
// =============================================================================

#[tokio::test]
async fn test_invalid_refresh_token_forces_logout() {
    let harness = Harness::logged_in().await;
    harness.backend.reject_refresh();

    assert!(harness.session.refresh().await.is_err());
    assert!(!harness.session.is_authenticated());
    assert!(harness.tokens.refresh_token().is_none());
}

#[tokio::test]
async fn test_manual_refresh_rotates_access_only() {
    let harness = Harness::logged_in().await;
    let refresh_before = harness.tokens.refresh_token();

    harness.session.refresh().await.unwrap();

    assert_eq!(harness.session.access_token().unwrap(), "access-1");
    assert_eq!(harness.tokens.refresh_token(), refresh_before);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_runs_once_per_interval() {
    let harness = Harness::logged_in().await;
    assert_eq!(harness.backend.refresh_count(), 0);

    // Check one second after each tick
    tokio::time::sleep(Duration::from_secs(1)).await;
    for expected in 1..=3 {
        tokio::time::sleep(REFRESH_INTERVAL).await;
        assert_eq!(harness.backend.refresh_count(), expected);
    }
    assert_eq!(harness.session.access_token().unwrap(), "access-3");
}

#[tokio::test(start_paused = true)]
async fn test_refresh_stops_after_logout() {
    let harness = Harness::logged_in().await;
    tokio::time::sleep(REFRESH_INTERVAL + Duration::from_secs(1)).await;
    assert_eq!(harness.backend.refresh_count(), 1);

    harness.session.logout().await;
    assert!(!harness.session.is_refreshing());

    tokio::time::sleep(REFRESH_INTERVAL * 4).await;
    assert_eq!(harness.backend.refresh_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_background_refresh_failure_logs_out() {
    let harness = Harness::logged_in().await;
    harness.backend.reject_refresh();

    tokio::time::sleep(REFRESH_INTERVAL + Duration::from_secs(1)).await;

    assert!(!harness.session.is_authenticated());
    assert!(!harness.session.is_refreshing());
}

#[tokio::test(start_paused = true)]
async fn test_relogin_restarts_refresh_schedule() {
    let harness = Harness::logged_in().await;
    harness.session.logout().await;

    tokio::time::sleep(REFRESH_INTERVAL / 2).await;
    harness
        .session
        .login("ada@example.org", PASSWORD)
        .await
        .unwrap();

    // The first tick is one full interval after the second login
    tokio::time::sleep(REFRESH_INTERVAL - Duration::from_secs(1)).await;
    assert_eq!(harness.backend.refresh_count(), 0);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(harness.backend.refresh_count(), 1);
    assert_eq!(harness.backend.login_count(), 2);
}
