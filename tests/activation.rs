mod helpers;

use flight_notify::app::{ActivationError, App, HOPPIE_LOGON_MISSING, PLUGIN_LOAD_FAILED};
use flight_notify::config::SettingsError;
use flight_notify::core::{EventKind, HostEvent, Priority};
use flight_notify::host::Subscriptions;
use flight_notify::notification::driver::SelectionError;
use flight_notify::relay::RelayState;
use flight_notify::task_manager::TaskManager;
use helpers::{pushover_settings, FakeNotifier, RecordingRelay, RecordingSink};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::test]
async fn test_missing_user_key_fails_activation_without_subscriptions() {
    // Arrange
    let mut settings = pushover_settings();
    settings.general.driver = Some("PushOver".to_string());
    settings.pushover.user_key = None;
    let sink = RecordingSink::default();
    let notifier = FakeNotifier::new();
    let tasks = TaskManager::detached();
    let mut subscriptions = Subscriptions::new();

    // Act
    let result = App::builder()
        .settings(settings)
        .debug_sink(Arc::new(sink.clone()))
        .notifier_override(Arc::new(notifier.clone()))
        .task_manager(tasks.clone())
        .update_check(false)
        .activate(&mut subscriptions);

    // Assert
    assert!(matches!(
        result,
        Err(ActivationError::Driver(SelectionError::InvalidConfig { .. }))
    ));
    assert!(subscriptions.is_empty());
    assert!(sink.contains("Pushover API key or user key not set"));
    tasks.drain().await;
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_unknown_driver_fails_activation() {
    let mut settings = pushover_settings();
    settings.general.driver = Some("carrier-pigeon".to_string());
    let sink = RecordingSink::default();
    let mut subscriptions = Subscriptions::new();

    let result = App::builder()
        .settings(settings)
        .debug_sink(Arc::new(sink.clone()))
        .update_check(false)
        .activate(&mut subscriptions);

    assert!(matches!(
        result,
        Err(ActivationError::Driver(SelectionError::UnknownDriver(_)))
    ));
    assert!(subscriptions.is_empty());
    assert_eq!(
        sink.lines(),
        vec!["Driver not set correctly. Check your flight-notify.toml"]
    );
}

#[tokio::test]
async fn test_missing_settings_store_fails_activation() {
    let sink = RecordingSink::default();
    let mut subscriptions = Subscriptions::new();

    let result = App::builder()
        .settings_result(Err(SettingsError::StoreUnavailable(PathBuf::from(
            "/nonexistent/flight-notify.toml",
        ))))
        .debug_sink(Arc::new(sink.clone()))
        .activate(&mut subscriptions);

    assert!(matches!(result, Err(ActivationError::Settings(_))));
    assert!(subscriptions.is_empty());
    assert_eq!(sink.lines(), vec![PLUGIN_LOAD_FAILED]);
}

#[tokio::test]
async fn test_successful_activation_subscribes_per_flags_and_announces() {
    // Arrange
    let mut settings = pushover_settings();
    settings.relay_private.enabled = true;
    settings.relay_selcal.enabled = true;
    let sink = RecordingSink::default();
    let notifier = FakeNotifier::new();
    let mut subscriptions = Subscriptions::new();

    // Act
    let app = App::builder()
        .settings(settings)
        .debug_sink(Arc::new(sink.clone()))
        .notifier_override(Arc::new(notifier.clone()))
        .local_version("1.1.0")
        .update_check(false)
        .activate(&mut subscriptions)
        .expect("activation should succeed");
    app.tasks().drain().await;

    // Assert
    let kinds: Vec<EventKind> = subscriptions.kinds().collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Connected,
            EventKind::Disconnected,
            EventKind::PrivateMessage,
            EventKind::SelcalAlert,
        ]
    );
    assert_eq!(notifier.bodies(), vec!["Connected. Running version v1.1.0"]);
    assert_eq!(
        sink.lines(),
        vec![
            "Driver set to Pushover",
            "Notify plugin connected and enabled on v1.1.0",
        ]
    );
}

#[tokio::test]
async fn test_relay_enabled_without_logon_code_is_reported_and_fatal() {
    let mut settings = pushover_settings();
    settings.hoppie.enabled = true;
    let sink = RecordingSink::default();
    let notifier = FakeNotifier::new();
    let relay = RecordingRelay::default();
    let tasks = TaskManager::detached();
    let mut subscriptions = Subscriptions::new();

    let result = App::builder()
        .settings(settings)
        .debug_sink(Arc::new(sink.clone()))
        .notifier_override(Arc::new(notifier.clone()))
        .relay(Box::new(relay.clone()))
        .task_manager(tasks.clone())
        .update_check(false)
        .activate(&mut subscriptions);
    tasks.drain().await;

    assert!(matches!(result, Err(ActivationError::MissingRelayLogon)));
    assert!(subscriptions.is_empty());
    assert!(relay.calls().is_empty());
    assert!(sink.contains(HOPPIE_LOGON_MISSING));
    assert_eq!(notifier.bodies(), vec![HOPPIE_LOGON_MISSING]);
}

#[tokio::test]
async fn test_relay_follows_network_session() {
    // Arrange
    let mut settings = pushover_settings();
    settings.hoppie.enabled = true;
    settings.hoppie.logon_code = Some("SECRET".to_string());
    settings.disconnect.enabled = true;
    let notifier = FakeNotifier::new();
    let relay = RecordingRelay::default();
    let mut subscriptions = Subscriptions::new();

    let mut app = App::builder()
        .settings(settings)
        .debug_sink(Arc::new(RecordingSink::default()))
        .notifier_override(Arc::new(notifier.clone()))
        .relay(Box::new(relay.clone()))
        .update_check(false)
        .activate(&mut subscriptions)
        .unwrap();
    assert_eq!(relay.calls(), vec!["initialize:SECRET"]);

    // Act
    app.handle(HostEvent::Connected {
        callsign: "DLH123".to_string(),
    });
    assert_eq!(
        app.dispatcher().relay().map(|r| r.state()),
        Some(RelayState::Running)
    );
    app.handle(HostEvent::Disconnected);
    app.tasks().drain().await;

    // Assert
    assert_eq!(
        relay.calls(),
        vec!["initialize:SECRET", "start:DLH123", "stop"]
    );
    let disconnect = notifier
        .sent()
        .into_iter()
        .find(|n| n.body == "Disconnected from network")
        .expect("disconnect notice should be sent");
    assert_eq!(disconnect.title.as_deref(), Some("vPilot"));
    assert_eq!(disconnect.priority, Some(Priority::High));
}
