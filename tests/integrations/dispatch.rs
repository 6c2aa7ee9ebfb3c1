//! Integration tests for the dispatch orchestrator: fan-out, failure
//! isolation, and the skip semantics for unregistered channels.

use notifyd::channels::email::EmailChannel;
use notifyd::channels::realtime::{NotificationHub, WebSocketChannel};
use notifyd::config::{ChannelToggle, Config};
use notifyd::core::{
    ChannelKind, DeliveryStatus, EmailEndpoint, TargetEndpoints, WebSocketEndpoint,
};
use notifyd::dispatch::{CommandTarget, SendNotificationCommand};
use notifyd::{ChannelRegistry, Dispatcher};
use std::sync::Arc;

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::{command, FakeMailer, MockChannel};

fn dispatcher_with(channels: Vec<Arc<MockChannel>>) -> Dispatcher {
    let mut registry = ChannelRegistry::new();
    for channel in channels {
        registry.register(channel);
    }
    Dispatcher::new(Arc::new(registry))
}

#[tokio::test]
async fn one_channel_failure_does_not_stop_the_others() {
    let email = Arc::new(MockChannel::failing(ChannelKind::Email, "relay down"));
    let websocket = Arc::new(MockChannel::delivering(ChannelKind::WebSocket));
    let dispatcher = dispatcher_with(vec![email.clone(), websocket.clone()]);

    let outcomes = dispatcher
        .dispatch(command("u1", vec![ChannelKind::Email, ChannelKind::WebSocket]))
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].status, DeliveryStatus::Failed);
    assert!(outcomes[0].error.as_deref().unwrap().contains("relay down"));
    assert_eq!(outcomes[1].status, DeliveryStatus::Delivered);
    assert_eq!(email.attempt_count(), 1);
    assert_eq!(websocket.attempt_count(), 1);
}

#[tokio::test]
async fn every_requested_kind_is_attempted_including_duplicates() {
    let websocket = Arc::new(MockChannel::delivering(ChannelKind::WebSocket));
    let dispatcher = dispatcher_with(vec![websocket.clone()]);

    let outcomes = dispatcher
        .dispatch(command(
            "u1",
            vec![
                ChannelKind::WebSocket,
                ChannelKind::WebSocket,
                ChannelKind::WebSocket,
            ],
        ))
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(websocket.attempt_count(), 3);
    // All attempts belong to the same notification.
    let attempts = websocket.attempts.lock().unwrap();
    assert!(attempts.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn unregistered_kind_is_skipped_without_affecting_others() {
    let websocket = Arc::new(MockChannel::delivering(ChannelKind::WebSocket));
    let dispatcher = dispatcher_with(vec![websocket.clone()]);

    let outcomes = dispatcher
        .dispatch(command("u1", vec![ChannelKind::Sms, ChannelKind::WebSocket]))
        .await
        .unwrap();

    assert_eq!(outcomes[0].channel, ChannelKind::Sms);
    assert_eq!(outcomes[0].status, DeliveryStatus::Skipped);
    assert_eq!(outcomes[1].status, DeliveryStatus::Delivered);
    assert_eq!(websocket.attempt_count(), 1);
}

#[tokio::test]
async fn disabled_channel_reports_skipped() {
    let email = Arc::new(MockChannel::disabled(ChannelKind::Email));
    let dispatcher = dispatcher_with(vec![email.clone()]);

    let outcomes = dispatcher
        .dispatch(command("u1", vec![ChannelKind::Email]))
        .await
        .unwrap();

    assert_eq!(outcomes[0].status, DeliveryStatus::Skipped);
    assert_eq!(email.attempt_count(), 1);
}

#[tokio::test]
async fn channel_reporting_failure_is_recorded_as_failed() {
    let email = Arc::new(MockChannel::reporting_failure(ChannelKind::Email));
    let dispatcher = dispatcher_with(vec![email.clone()]);

    let outcomes = dispatcher
        .dispatch(command("u1", vec![ChannelKind::Email]))
        .await
        .unwrap();

    assert_eq!(outcomes[0].status, DeliveryStatus::Failed);
    assert!(outcomes[0].error.is_some());
    assert!(outcomes[0].sent_at.is_none());
    assert_eq!(email.attempt_count(), 1);
}

#[tokio::test]
async fn empty_user_id_fails_before_any_attempt() {
    let websocket = Arc::new(MockChannel::delivering(ChannelKind::WebSocket));
    let dispatcher = dispatcher_with(vec![websocket.clone()]);

    let result = dispatcher
        .dispatch(command("", vec![ChannelKind::WebSocket]))
        .await;

    assert!(result.is_err());
    assert_eq!(websocket.attempt_count(), 0);
}

#[test]
fn unrecognized_channel_kind_is_rejected_at_decode() {
    let body = r#"{
        "title": "Hi",
        "message": "Hello",
        "channels": ["Email", "Pigeon"],
        "target": { "userId": "u1" }
    }"#;
    assert!(serde_json::from_str::<SendNotificationCommand>(body).is_err());
}

/// The end-to-end scenario from the design notes: a blank email address
/// fails the email attempt while the realtime attempt still delivers to
/// the default per-user group.
#[tokio::test]
async fn blank_email_fails_while_realtime_delivers() {
    let config = Config::default();
    let hub = Arc::new(NotificationHub::new());
    let mailer = Arc::new(FakeMailer::default());

    let mut email_config = config.channels.email.clone();
    email_config.enabled = true;

    let mut registry = ChannelRegistry::new();
    registry.register(Arc::new(WebSocketChannel::new(
        ChannelToggle { enabled: true },
        hub.clone(),
    )));
    registry.register(Arc::new(EmailChannel::new(email_config, mailer.clone())));
    let dispatcher = Dispatcher::new(Arc::new(registry));

    let mut rx = hub.subscribe("user-u1");

    let command = SendNotificationCommand {
        title: "Hi".to_string(),
        message: "Hello".to_string(),
        channels: vec![ChannelKind::Email, ChannelKind::WebSocket],
        target: CommandTarget {
            user_id: "u1".to_string(),
            endpoints: TargetEndpoints {
                email: Some(EmailEndpoint { to: String::new() }),
                web_socket: Some(WebSocketEndpoint { group: None }),
            },
            data: None,
        },
    };

    let outcomes = dispatcher.dispatch(command).await.unwrap();

    assert_eq!(outcomes[0].channel, ChannelKind::Email);
    assert_eq!(outcomes[0].status, DeliveryStatus::Failed);
    assert_eq!(outcomes[1].channel, ChannelKind::WebSocket);
    assert_eq!(outcomes[1].status, DeliveryStatus::Delivered);

    let event = rx.try_recv().unwrap();
    assert_eq!(event.user_id, "u1");
    assert_eq!(event.title, "Hi");
    assert!(mailer.sent.lock().unwrap().is_empty());
}
