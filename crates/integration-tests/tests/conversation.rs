//! Integration tests for the chat send flow.
//!
//! These tests verify ordering, the typing indicator, fallback replies and
//! how reply payloads reach the catalog and badge queue.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use glt_client::services::FALLBACK_REPLY;
use glt_client::ClientError;
use glt_core::{ProductId, Sender};
use glt_integration_tests::{Harness, badge, product, reply_from_json};

// =============================================================================
// Send flow
// =============================================================================

#[tokio::test]
async fn test_user_message_is_logged_before_reply_arrives() {
    let harness = Harness::logged_in().await;
    let gate = harness.backend.hold_replies();

    let chat = harness.chat.clone();
    let pending = tokio::spawn(async move { chat.send_message("what kits do you have?").await });

    while harness.backend.chat_messages().is_empty() {
        tokio::task::yield_now().await;
    }

    let log = harness.chat.messages();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].sender, Sender::User);
    assert_eq!(log[0].text, "what kits do you have?");
    assert!(harness.chat.is_typing());

    gate.notify_one();
    pending.await.unwrap().unwrap();

    assert_eq!(harness.chat.len(), 2);
    assert!(!harness.chat.is_typing());
}

#[tokio::test]
async fn test_blank_message_sends_nothing() {
    let harness = Harness::logged_in().await;
    let err = harness.chat.send_message("  \t ").await.unwrap_err();

    assert!(matches!(err, ClientError::EmptyMessage));
    assert!(harness.chat.is_empty());
    assert!(harness.backend.chat_messages().is_empty());
}

#[tokio::test]
async fn test_rejected_call_appends_one_fallback() {
    let harness = Harness::logged_in().await;
    harness.backend.script_failure(Duration::ZERO);

    let reply = harness.chat.send_message("hello").await.unwrap();

    let log = harness.chat.messages();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].text, FALLBACK_REPLY);
    assert_eq!(log[1].sender, Sender::Assistant);
    assert_eq!(reply.in_reply_to, Some(log[0].id));
    assert!(!harness.chat.is_typing());
}

#[tokio::test]
async fn test_logged_out_send_falls_back() {
    let harness = Harness::new();
    let reply = harness.chat.send_message("hello").await.unwrap();

    assert_eq!(reply.text, FALLBACK_REPLY);
    assert!(harness.backend.chat_messages().is_empty());
}

// =============================================================================
// Ordering
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_replies_follow_send_order() {
    let harness = Harness::logged_in().await;
    harness.backend.script_reply(
        reply_from_json(r#"{"response": "first"}"#),
        Duration::from_secs(5),
    );
    harness.backend.script_reply(
        reply_from_json(r#"{"response": "second"}"#),
        Duration::from_millis(10),
    );

    let (a, b) = tokio::join!(
        harness.chat.send_message("one"),
        harness.chat.send_message("two"),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let texts: Vec<String> = harness.chat.messages().into_iter().map(|m| m.text).collect();
    assert_eq!(texts, ["one", "two", "first", "second"]);

    let log = harness.chat.messages();
    assert_eq!(a.in_reply_to, Some(log[0].id));
    assert_eq!(b.in_reply_to, Some(log[1].id));
}

#[tokio::test(start_paused = true)]
async fn test_failure_does_not_reorder_later_replies() {
    let harness = Harness::logged_in().await;
    harness.backend.script_failure(Duration::from_secs(1));
    harness.backend.script_reply(
        reply_from_json(r#"{"response": "ok"}"#),
        Duration::ZERO,
    );

    let (a, b) = tokio::join!(
        harness.chat.send_message("one"),
        harness.chat.send_message("two"),
    );

    assert_eq!(a.unwrap().text, FALLBACK_REPLY);
    assert_eq!(b.unwrap().text, "ok");
    assert_eq!(harness.backend.chat_messages(), ["one", "two"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_sends_pair_replies_in_log_order() {
    let harness = Harness::logged_in().await;

    let tasks: Vec<_> = (0..16)
        .map(|n| {
            let chat = harness.chat.clone();
            tokio::spawn(async move { chat.send_message(&format!("m{n}")).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let log = harness.chat.messages();
    assert_eq!(log.len(), 32);
    let (users, replies): (Vec<_>, Vec<_>) =
        log.iter().partition(|m| m.sender == Sender::User);

    let asked: Vec<_> = users.iter().map(|m| Some(m.id)).collect();
    let answered: Vec<_> = replies.iter().map(|m| m.in_reply_to).collect();
    assert_eq!(answered, asked);

    let sent: Vec<String> = users.iter().map(|m| m.text.clone()).collect();
    assert_eq!(harness.backend.chat_messages(), sent);
    for (user, reply) in users.iter().zip(&replies) {
        assert_eq!(reply.text, format!("echo: {}", user.text));
    }
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_send_is_still_answered() {
    let harness = Harness::logged_in().await;
    let gate = harness.backend.hold_replies();

    let chat = harness.chat.clone();
    let first = tokio::spawn(async move { chat.send_message("one").await });
    while harness.backend.chat_messages().is_empty() {
        tokio::task::yield_now().await;
    }

    let second =
        tokio::time::timeout(Duration::from_millis(20), harness.chat.send_message("two")).await;
    assert!(second.is_err());

    while harness.chat.len() < 4 {
        gate.notify_one();
        tokio::task::yield_now().await;
    }
    first.await.unwrap().unwrap();

    let texts: Vec<String> = harness.chat.messages().into_iter().map(|m| m.text).collect();
    assert_eq!(texts, ["one", "two", "echo: one", "echo: two"]);
}

// =============================================================================
// Payloads
// =============================================================================

#[tokio::test]
async fn test_later_product_payload_wins_in_catalog() {
    let harness = Harness::logged_in().await;
    let mut first = reply_from_json(r#"{"response": "kits"}"#);
    first.products = vec![product(1, "Robot Kit", 7900), product(2, "Breadboard", 899)];
    let mut second = reply_from_json(r#"{"response": "on sale"}"#);
    second.products = vec![product(1, "Robot Kit (sale)", 5900)];

    harness.backend.script_reply(first, Duration::ZERO);
    harness.backend.script_reply(second, Duration::ZERO);
    harness.chat.send_message("kits?").await.unwrap();
    harness.chat.send_message("any deals?").await.unwrap();

    let kit = harness.catalog.get(ProductId::new(1)).unwrap();
    assert_eq!(kit.title, "Robot Kit (sale)");
    assert_eq!(harness.catalog.len(), 2);
}

#[tokio::test]
async fn test_suggestions_keep_wire_order() {
    let harness = Harness::logged_in().await;
    harness.backend.script_reply(
        reply_from_json(
            r#"{"response": "Pick one",
                "suggestions": {"Zebra": "z", "Apple": "a", "Mango": "m"}}"#,
        ),
        Duration::ZERO,
    );

    let reply = harness.chat.send_message("help").await.unwrap();
    let labels: Vec<&str> = reply.suggestions.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, ["Zebra", "Apple", "Mango"]);
}

#[tokio::test]
async fn test_every_badge_is_announced_exactly_once() {
    let harness = Harness::logged_in().await;
    let mut first = reply_from_json(r#"{"response": "nice"}"#);
    first.badges_earned = vec![badge("Curious Mind"), badge("First Chat")];
    let mut second = reply_from_json(r#"{"response": "great"}"#);
    second.badges_earned = vec![badge("Window Shopper")];

    harness.backend.script_reply(first, Duration::ZERO);
    harness.backend.script_reply(second, Duration::ZERO);
    harness.chat.send_message("hi").await.unwrap();
    harness.chat.send_message("show me things").await.unwrap();

    let names: Vec<String> = harness
        .chat
        .take_badge_notifications()
        .into_iter()
        .map(|b| b.name)
        .collect();
    assert_eq!(names, ["Curious Mind", "First Chat", "Window Shopper"]);
    assert!(harness.chat.take_badge_notifications().is_empty());
}
