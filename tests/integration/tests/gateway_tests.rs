//! Gateway integration tests
//!
//! Every test runs real WebSocket clients against in-process gateways; no
//! external services are needed.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::sync::Arc;
use std::time::Duration;

use huddle_core::{IdentityId, NewNotification, RoomId};
use integration_tests::{eventually, test_config, Cluster, TestServer, World};
use reqwest::StatusCode;
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

const ROOM: &str = "community:42";
const ROOM_ID: RoomId = RoomId::community(42);

/// Alice (1) and Bob (2) are members of `community:42`; Mallory (9) is not
fn world() -> Arc<World> {
    let world = World::new();
    world.add_identity(1, "alice");
    world.add_identity(2, "bob");
    world.add_identity(9, "mallory");
    world.add_room(ROOM_ID, &[1, 2]);
    world
}

// ============================================================================
// HTTP Endpoints
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start(&world()).await.unwrap();
    let response = server.get("/health").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_stats_counts_sessions() {
    let server = TestServer::start(&world()).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();
    alice.join(ROOM).await.unwrap();

    let stats: serde_json::Value = server.get("/stats").await.unwrap().json().await.unwrap();
    assert_eq!(stats["sessions"], 1);
    assert_eq!(stats["identities"], 1);
    assert_eq!(stats["rooms"], 1);
}

// ============================================================================
// Handshake
// ============================================================================

#[tokio::test]
async fn test_ready_carries_identity() {
    let server = TestServer::start(&world()).await.unwrap();
    let alice = server.connect(1).await.unwrap();

    assert!(!alice.session_id.is_empty());
    assert_eq!(alice.ready["identity"]["id"], "1");
    assert_eq!(alice.ready["identity"]["username"], "alice");
}

#[tokio::test]
async fn test_query_token_is_accepted() {
    let server = TestServer::start(&world()).await.unwrap();
    let bob = server.connect_with_query(2).await.unwrap();
    assert_eq!(bob.ready["identity"]["username"], "bob");
}

#[tokio::test]
async fn test_reconnect_gets_new_session() {
    let server = TestServer::start(&world()).await.unwrap();
    let first = server.connect(1).await.unwrap();
    let first_id = first.session_id.clone();
    first.close().await.unwrap();

    let second = server.connect(1).await.unwrap();
    assert_ne!(second.session_id, first_id);
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let server = TestServer::start(&world()).await.unwrap();
    let result = server.try_connect(None).await.unwrap();
    assert_eq!(result.err(), Some(401));
    assert_eq!(server.state.registry().session_count(), 0);
}

#[tokio::test]
async fn test_malformed_token_is_rejected() {
    let server = TestServer::start(&world()).await.unwrap();
    let result = server.try_connect(Some("not-a-jwt")).await.unwrap();
    assert_eq!(result.err(), Some(401));
}

#[tokio::test]
async fn test_unknown_identity_is_rejected() {
    let server = TestServer::start(&world()).await.unwrap();
    let token = integration_tests::token_for(404);
    let result = server.try_connect(Some(&token)).await.unwrap();
    assert_eq!(result.err(), Some(401));
    assert_eq!(server.state.registry().session_count(), 0);
}

// ============================================================================
// Rooms and Presence
// ============================================================================

#[tokio::test]
async fn test_join_announces_presence() {
    let server = TestServer::start(&world()).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();
    let mut bob = server.connect(2).await.unwrap();

    let joined = alice.join(ROOM).await.unwrap();
    assert_eq!(joined["room_id"], ROOM);
    assert_eq!(joined["online_count"], 1);

    let joined = bob.join(ROOM).await.unwrap();
    assert_eq!(joined["online_count"], 2);

    let online = alice.next_event("user_online").await.unwrap();
    assert_eq!(online["identity"]["username"], "bob");
}

#[tokio::test]
async fn test_join_is_idempotent() {
    let server = TestServer::start(&world()).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();
    let mut bob = server.connect(2).await.unwrap();
    alice.join(ROOM).await.unwrap();
    bob.join(ROOM).await.unwrap();
    alice.next_event("user_online").await.unwrap();

    bob.join(ROOM).await.unwrap();

    let frames = alice.collect_for(Duration::from_millis(300)).await;
    assert!(frames.iter().all(|(event, _)| event != "user_online"));
    assert_eq!(
        server.state.presence().query(&ROOM_ID).await,
        Some(vec![IdentityId::new(1), IdentityId::new(2)])
    );
}

#[tokio::test]
async fn test_non_member_join_is_denied() {
    let server = TestServer::start(&world()).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();
    alice.join(ROOM).await.unwrap();
    let mut mallory = server.connect(9).await.unwrap();

    mallory.send_event("join_room", json!({ "room_id": ROOM })).await.unwrap();

    let error = mallory.next_event("error").await.unwrap();
    assert_eq!(error["code"], "FORBIDDEN");
    assert_eq!(error["event"], "join_room");

    let frames = alice.collect_for(Duration::from_millis(300)).await;
    assert!(frames.is_empty());
    assert_eq!(
        server.state.presence().query(&ROOM_ID).await,
        Some(vec![IdentityId::new(1)])
    );
}

#[tokio::test]
async fn test_unknown_room_is_not_found() {
    let server = TestServer::start(&world()).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();

    alice.send_event("join_room", json!({ "room_id": "project:77" })).await.unwrap();

    let error = alice.next_event("error").await.unwrap();
    assert_eq!(error["code"], "NOT_FOUND");
    assert_eq!(error["room_id"], "project:77");
}

#[tokio::test]
async fn test_leave_announces_offline() {
    let server = TestServer::start(&world()).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();
    let mut bob = server.connect(2).await.unwrap();
    alice.join(ROOM).await.unwrap();
    bob.join(ROOM).await.unwrap();

    bob.send_event("leave_room", json!({ "room_id": ROOM })).await.unwrap();
    bob.next_event("left_room").await.unwrap();

    let offline = alice.next_event("user_offline").await.unwrap();
    assert_eq!(offline["identity_id"], "2");
}

#[tokio::test]
async fn test_disconnect_cleans_up() {
    let server = TestServer::start(&world()).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();
    let mut bob = server.connect(2).await.unwrap();
    alice.join(ROOM).await.unwrap();
    bob.join(ROOM).await.unwrap();

    bob.close().await.unwrap();

    let offline = alice.next_event("user_offline").await.unwrap();
    assert_eq!(offline["identity_id"], "2");

    let state = server.state.clone();
    assert!(eventually(|| {
        let state = state.clone();
        async move { state.registry().session_count() == 1 }
    })
    .await);
    assert_eq!(
        server.state.presence().query(&ROOM_ID).await,
        Some(vec![IdentityId::new(1)])
    );
}

#[tokio::test]
async fn test_get_online_users() {
    let server = TestServer::start(&world()).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();
    let mut bob = server.connect(2).await.unwrap();
    alice.join(ROOM).await.unwrap();
    bob.join(ROOM).await.unwrap();

    alice
        .send_event("get_online_users", json!({ "room_id": ROOM }))
        .await
        .unwrap();

    let online = alice.next_event("online_users").await.unwrap();
    assert_eq!(online["identity_ids"], json!(["1", "2"]));
}

// ============================================================================
// Messages
// ============================================================================

#[tokio::test]
async fn test_message_carries_durable_id() {
    let world = world();
    let server = TestServer::start(&world).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();
    let mut bob = server.connect(2).await.unwrap();
    alice.join(ROOM).await.unwrap();
    bob.join(ROOM).await.unwrap();

    alice
        .send_event("send_message", json!({ "room_id": ROOM, "body": "hello bob" }))
        .await
        .unwrap();

    let received = bob.next_event("new_message").await.unwrap();
    assert!(received["message"]["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(received["message"]["body"], "hello bob");
    assert_eq!(received["message"]["room_id"], ROOM);
    assert_eq!(world.messages_written(), 1);

    let echoed = alice.next_event("new_message").await.unwrap();
    assert_eq!(echoed["message"]["id"], received["message"]["id"]);
}

#[tokio::test]
async fn test_failed_write_is_not_broadcast() {
    let world = world();
    let server = TestServer::start(&world).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();
    let mut bob = server.connect(2).await.unwrap();
    alice.join(ROOM).await.unwrap();
    bob.join(ROOM).await.unwrap();
    alice.next_event("user_online").await.unwrap();
    world.set_fail_writes(true);

    alice
        .send_event("send_message", json!({ "room_id": ROOM, "body": "lost" }))
        .await
        .unwrap();

    let error = alice.next_event("error").await.unwrap();
    assert_eq!(error["code"], "UNAVAILABLE");
    assert_eq!(error["event"], "send_message");

    let frames = bob.collect_for(Duration::from_millis(300)).await;
    assert!(frames.iter().all(|(event, _)| event != "new_message"));
}

#[tokio::test]
async fn test_binary_frame_reports_error() {
    let server = TestServer::start(&world()).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();

    alice.send_raw(Message::Binary(vec![1, 2, 3])).await.unwrap();

    let error = alice.next_event("error").await.unwrap();
    assert_eq!(error["code"], "INVALID_PAYLOAD");
    // The connection survives
    alice.join(ROOM).await.unwrap();
}

// ============================================================================
// Typing
// ============================================================================

#[tokio::test]
async fn test_typing_cleared_after_disconnect() {
    let server = TestServer::start(&world()).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();
    let mut bob = server.connect(2).await.unwrap();
    alice.join(ROOM).await.unwrap();
    bob.join(ROOM).await.unwrap();

    alice.send_event("typing_start", json!({ "room_id": ROOM })).await.unwrap();
    let typing = bob.next_event("user_typing").await.unwrap();
    assert_eq!(typing["identity"]["id"], "1");
    assert_eq!(
        server.state.typing().query(&ROOM_ID).await,
        Some(vec![IdentityId::new(1)])
    );

    alice.close().await.unwrap();

    bob.next_event("user_offline").await.unwrap();
    assert_eq!(server.state.typing().query(&ROOM_ID).await, Some(vec![]));
}

#[tokio::test]
async fn test_typing_expires_without_stop() {
    let mut config = test_config();
    config.typing_ttl_secs = 1;
    let server = TestServer::start_with_config(&world(), config).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();
    let mut bob = server.connect(2).await.unwrap();
    alice.join(ROOM).await.unwrap();
    bob.join(ROOM).await.unwrap();

    alice.send_event("typing_start", json!({ "room_id": ROOM })).await.unwrap();
    bob.next_event("user_typing").await.unwrap();

    let stopped = bob.next_event("user_stopped_typing").await.unwrap();
    assert_eq!(stopped["identity_id"], "1");
    assert_eq!(server.state.typing().query(&ROOM_ID).await, Some(vec![]));
}

#[tokio::test]
async fn test_typing_is_not_echoed() {
    let server = TestServer::start(&world()).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();
    let mut bob = server.connect(2).await.unwrap();
    alice.join(ROOM).await.unwrap();
    bob.join(ROOM).await.unwrap();
    alice.next_event("user_online").await.unwrap();

    alice.send_event("typing_start", json!({ "room_id": ROOM })).await.unwrap();
    bob.next_event("user_typing").await.unwrap();

    let frames = alice.collect_for(Duration::from_millis(300)).await;
    assert!(frames.iter().all(|(event, _)| event != "user_typing"));
}

#[tokio::test]
async fn test_joiner_sees_current_typists() {
    let server = TestServer::start(&world()).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();
    alice.join(ROOM).await.unwrap();
    alice.send_event("typing_start", json!({ "room_id": ROOM })).await.unwrap();

    let mut bob = server.connect(2).await.unwrap();
    // Let alice's typing_start land first
    assert!(eventually(|| {
        let state = server.state.clone();
        async move { state.typing().query(&ROOM_ID).await == Some(vec![IdentityId::new(1)]) }
    })
    .await);
    bob.send_event("join_room", json!({ "room_id": ROOM })).await.unwrap();

    let current = bob.next_event("current_typing_users").await.unwrap();
    assert_eq!(current["identity_ids"], json!(["1"]));
}

// ============================================================================
// Notifications and Status
// ============================================================================

#[tokio::test]
async fn test_notifications_reach_every_device() {
    let world = world();
    let server = TestServer::start(&world).await.unwrap();
    let mut phone = server.connect(1).await.unwrap();
    let mut laptop = server.connect(1).await.unwrap();
    for client in [&mut phone, &mut laptop] {
        client.send_event("subscribe_notifications", json!({})).await.unwrap();
        client.next_event("joined_room").await.unwrap();
    }

    server
        .state
        .dispatcher()
        .notify(
            IdentityId::new(1),
            NewNotification {
                title: "Badge".to_string(),
                body: "You earned a badge".to_string(),
                kind: "badge_awarded".to_string(),
                data: json!({ "badge": "first_post" }),
            },
        )
        .await
        .unwrap();

    for client in [&mut phone, &mut laptop] {
        let pushed = client.next_event("new_notification").await.unwrap();
        assert_eq!(pushed["notification"]["title"], "Badge");
    }
    assert_eq!(world.notifications_written(), 1);
}

#[tokio::test]
async fn test_foreign_notification_channel_is_denied() {
    let server = TestServer::start(&world()).await.unwrap();
    let mut mallory = server.connect(9).await.unwrap();

    mallory
        .send_event("join_room", json!({ "room_id": "notifications:1" }))
        .await
        .unwrap();

    let error = mallory.next_event("error").await.unwrap();
    assert_eq!(error["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_status_update_reaches_room() {
    let server = TestServer::start(&world()).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();
    let mut bob = server.connect(2).await.unwrap();
    alice.join(ROOM).await.unwrap();
    bob.join(ROOM).await.unwrap();

    alice.send_event("update_status", json!({ "status": "busy" })).await.unwrap();

    let update = bob.next_event("status_update").await.unwrap();
    assert_eq!(update["identity_id"], "1");
    assert_eq!(update["status"], "busy");
}

// ============================================================================
// Connection Lifecycle
// ============================================================================

#[tokio::test]
async fn test_logout_closes_with_code() {
    let server = TestServer::start(&world()).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();
    alice.join(ROOM).await.unwrap();

    alice.send_event("logout", json!({})).await.unwrap();

    assert_eq!(alice.next_close().await.unwrap(), Some(4000));
    assert_eq!(server.state.registry().session_count(), 0);
    assert_eq!(server.state.presence().query(&ROOM_ID).await, Some(vec![]));
}

#[tokio::test]
async fn test_idle_session_times_out() {
    let mut config = test_config();
    config.idle_timeout_secs = 1;
    config.ping_interval_secs = 60;
    let server = TestServer::start_with_config(&world(), config).await.unwrap();
    let mut alice = server.connect(1).await.unwrap();

    assert_eq!(alice.next_close().await.unwrap(), Some(4009));
    assert_eq!(server.state.registry().session_count(), 0);
}

// ============================================================================
// Multiple Gateway Processes
// ============================================================================

#[tokio::test]
async fn test_events_cross_processes() {
    let cluster = Cluster::new(world());
    let east = cluster.spawn(test_config()).await.unwrap();
    let west = cluster.spawn(test_config()).await.unwrap();

    let mut alice = east.connect(1).await.unwrap();
    let mut bob = west.connect(2).await.unwrap();
    alice.join(ROOM).await.unwrap();
    let joined = bob.join(ROOM).await.unwrap();
    assert_eq!(joined["online_count"], 2);

    let online = alice.next_event("user_online").await.unwrap();
    assert_eq!(online["identity"]["username"], "bob");

    alice
        .send_event("send_message", json!({ "room_id": ROOM, "body": "across" }))
        .await
        .unwrap();
    let received = bob.next_event("new_message").await.unwrap();
    assert_eq!(received["message"]["body"], "across");
}

#[tokio::test]
async fn test_presence_spans_processes() {
    let cluster = Cluster::new(world());
    let east = cluster.spawn(test_config()).await.unwrap();
    let west = cluster.spawn(test_config()).await.unwrap();

    let mut alice_east = east.connect(1).await.unwrap();
    let mut alice_west = west.connect(1).await.unwrap();
    let mut bob = west.connect(2).await.unwrap();
    bob.join(ROOM).await.unwrap();
    alice_east.join(ROOM).await.unwrap();
    alice_west.join(ROOM).await.unwrap();
    bob.next_event("user_online").await.unwrap();

    alice_east.close().await.unwrap();

    // Alice is still connected through the other process
    let frames = bob.collect_for(Duration::from_millis(500)).await;
    assert!(frames.iter().all(|(event, _)| event != "user_offline"));
    assert_eq!(
        west.state.presence().query(&ROOM_ID).await,
        Some(vec![IdentityId::new(1), IdentityId::new(2)])
    );

    alice_west.close().await.unwrap();
    let offline = bob.next_event("user_offline").await.unwrap();
    assert_eq!(offline["identity_id"], "1");
}
