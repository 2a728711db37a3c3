mod helpers;

use flight_notify::core::{HostEvent, Priority};
use flight_notify::dispatcher::{DispatchRules, EventDispatcher};
use flight_notify::task_manager::TaskManager;
use helpers::{FakeNotifier, RecordingSink};
use std::sync::Arc;

fn dispatcher(notifier: &FakeNotifier, sink: &RecordingSink, rules: DispatchRules) -> EventDispatcher {
    EventDispatcher::new(
        Arc::new(notifier.clone()),
        Arc::new(sink.clone()),
        TaskManager::detached(),
        rules,
    )
}

fn all_enabled() -> DispatchRules {
    DispatchRules {
        relay_private: true,
        relay_radio: true,
        relay_selcal: true,
        disconnect_notice: true,
    }
}

fn connected(callsign: &str) -> HostEvent {
    HostEvent::Connected {
        callsign: callsign.to_string(),
    }
}

fn radio(from: &str, message: &str) -> HostEvent {
    HostEvent::RadioMessage {
        from: from.to_string(),
        message: message.to_string(),
    }
}

async fn settle(tasks: &TaskManager) {
    tasks.drain().await;
}

#[tokio::test]
async fn test_radio_message_mentioning_callsign_is_relayed() {
    let notifier = FakeNotifier::new();
    let sink = RecordingSink::default();
    let tasks = TaskManager::detached();
    let mut dispatcher = EventDispatcher::new(
        Arc::new(notifier.clone()),
        Arc::new(sink.clone()),
        tasks.clone(),
        all_enabled(),
    );

    dispatcher.handle(connected("DLH123"));
    dispatcher.handle(radio("EDDF_TWR", "Tower mentions DLH123 inbound"));
    settle(&tasks).await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title.as_deref(), Some("EDDF_TWR"));
    assert_eq!(sent[0].body, "Tower mentions DLH123 inbound");
    assert_eq!(sent[0].priority, Some(Priority::High));
}

#[tokio::test]
async fn test_radio_message_for_someone_else_is_not_relayed() {
    let notifier = FakeNotifier::new();
    let dispatcher = {
        let mut d = dispatcher(&notifier, &RecordingSink::default(), all_enabled());
        d.handle(connected("DLH123"));
        d
    };

    assert!(dispatcher
        .notification_for(&radio("EDDF_TWR", "BAW45 cleared to land"))
        .is_none());
    // Matching is case-sensitive.
    assert!(dispatcher
        .notification_for(&radio("EDDF_TWR", "dlh123 contact ground"))
        .is_none());
}

#[tokio::test]
async fn test_radio_message_while_disconnected_is_not_relayed() {
    let notifier = FakeNotifier::new();
    let dispatcher = dispatcher(&notifier, &RecordingSink::default(), all_enabled());

    assert!(!dispatcher.session().is_connected());
    assert!(dispatcher
        .notification_for(&radio("EDDF_TWR", "DLH123 contact ground"))
        .is_none());
}

#[tokio::test]
async fn test_disabled_flags_suppress_relays() {
    let notifier = FakeNotifier::new();
    let mut dispatcher = dispatcher(&notifier, &RecordingSink::default(), DispatchRules::default());
    dispatcher.handle(connected("DLH123"));

    for event in [
        radio("EDDF_TWR", "DLH123 contact ground"),
        HostEvent::PrivateMessage {
            from: "EDDF_TWR".to_string(),
            message: "hello".to_string(),
        },
        HostEvent::SelcalAlert {
            from: "EGGX_FSS".to_string(),
        },
        HostEvent::Disconnected,
    ] {
        assert!(dispatcher.notification_for(&event).is_none(), "{:?}", event);
    }
}

#[tokio::test]
async fn test_connect_disconnect_cycle_sends_one_notice() {
    let notifier = FakeNotifier::new();
    let tasks = TaskManager::detached();
    let mut dispatcher = EventDispatcher::new(
        Arc::new(notifier.clone()),
        Arc::new(RecordingSink::default()),
        tasks.clone(),
        all_enabled(),
    );

    assert_eq!(dispatcher.session().callsign(), None);
    dispatcher.handle(connected("DLH123"));
    assert_eq!(dispatcher.session().callsign(), Some("DLH123"));
    dispatcher.handle(HostEvent::Disconnected);
    settle(&tasks).await;

    assert_eq!(notifier.bodies(), vec!["Disconnected from network"]);
    assert_eq!(dispatcher.session().callsign(), None);
}

#[tokio::test]
async fn test_private_message_and_selcal_mapping() {
    let notifier = FakeNotifier::new();
    let dispatcher = dispatcher(&notifier, &RecordingSink::default(), all_enabled());

    let private = dispatcher
        .notification_for(&HostEvent::PrivateMessage {
            from: "EDGG_CTR".to_string(),
            message: "Say altitude".to_string(),
        })
        .unwrap();
    assert_eq!(private.body, "Say altitude");
    assert_eq!(private.title.as_deref(), Some("EDGG_CTR"));
    assert_eq!(private.priority, Some(Priority::High));

    let selcal = dispatcher
        .notification_for(&HostEvent::SelcalAlert {
            from: "EGGX_FSS".to_string(),
        })
        .unwrap();
    assert_eq!(selcal.body, "SELCAL Alert");
    assert_eq!(selcal.title.as_deref(), Some("EGGX_FSS"));
}

#[tokio::test]
async fn test_failed_send_is_logged_not_retried() {
    let notifier = FakeNotifier::failing();
    let sink = RecordingSink::default();
    let tasks = TaskManager::detached();
    let mut dispatcher = EventDispatcher::new(
        Arc::new(notifier.clone()),
        Arc::new(sink.clone()),
        tasks.clone(),
        all_enabled(),
    );

    dispatcher.handle(HostEvent::SelcalAlert {
        from: "EGGX_FSS".to_string(),
    });
    settle(&tasks).await;

    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(
        sink.lines(),
        vec!["Failed to send notification via fake: backend rejected the message: backend down"]
    );
}
