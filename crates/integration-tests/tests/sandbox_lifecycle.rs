//! Integration tests for sandbox actions and status polling.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use glt_client::ClientError;
use glt_client::api::SandboxAction;
use glt_core::SandboxStatus;
use glt_integration_tests::Harness;

const POLL: Duration = Duration::from_secs(2);

#[tokio::test(start_paused = true)]
async fn test_create_then_wait_until_running() {
    let harness = Harness::logged_in().await;
    harness.backend.set_boot_polls(3);

    let created = harness.sandbox.create().await.unwrap();
    assert_eq!(created.status, SandboxStatus::Paused);

    let running = harness
        .sandbox
        .wait_for_status(SandboxStatus::Running, POLL, 10)
        .await
        .unwrap();
    assert!(running.is_running());
    assert!(running.urls.code_server.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_wait_gives_up_after_max_polls() {
    let harness = Harness::logged_in().await;
    harness.backend.set_boot_polls(50);
    harness.sandbox.create().await.unwrap();

    let err = harness
        .sandbox
        .wait_for_status(SandboxStatus::Running, POLL, 5)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::SandboxTimeout { polls: 5, .. }));
}

#[tokio::test]
async fn test_status_without_sandbox_surfaces_server_message() {
    let harness = Harness::logged_in().await;
    let err = harness.sandbox.status().await.unwrap_err();
    assert_eq!(err.user_message(), "No sandbox found for this user");
}

#[tokio::test]
async fn test_pause_resume_delete() {
    let harness = Harness::logged_in().await;
    harness.sandbox.create().await.unwrap();

    assert_eq!(
        harness.sandbox.pause().await.unwrap().status,
        SandboxStatus::Paused
    );
    assert_eq!(
        harness.sandbox.status().await.unwrap().status,
        SandboxStatus::Paused
    );

    harness.sandbox.resume().await.unwrap();
    assert!(harness.sandbox.status().await.unwrap().is_running());

    let deleted = harness.sandbox.delete().await.unwrap();
    assert_eq!(deleted.status, SandboxStatus::Deleted);

    assert_eq!(
        harness.backend.sandbox_actions(),
        [
            SandboxAction::Create,
            SandboxAction::Pause,
            SandboxAction::Resume,
            SandboxAction::Delete
        ]
    );
}
