//! Long-running consumer of the Docker event stream.
//!
//! The listener is a small supervised state machine:
//!
//! ```text
//! Subscribing ──ok──> Streaming ──stream ends / errors──> Backoff
//!      ^    └──err──────────────────────────────────────────^  │
//!      └───────────────────── after delay ─────────────────────┘
//! ```
//!
//! Events inside one subscription are handled one at a time, in the order
//! the engine sent them. A bad event costs a short pause, a broken
//! subscription a longer one. Nothing here ever gives up.

use futures::StreamExt;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bollard::models::EventMessage;

use super::event::LifecycleEvent;
use super::filter::{self, TriggerRule};
use super::source::{EventSource, EventStream};
use super::ListenerError;
use crate::notify::{MessageTemplate, Notifier};
use crate::store::ConfigStore;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Pause after an event that could not be processed.
    pub event_pause: Duration,
    /// Wait before re-subscribing after the stream broke or ended.
    pub resubscribe_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            event_pause: Duration::from_secs(1),
            resubscribe_delay: Duration::from_secs(5),
        }
    }
}

pub enum ListenerState {
    Subscribing,
    Streaming(EventStream),
    Backoff(Duration),
}

impl fmt::Debug for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerState::Subscribing => f.write_str("Subscribing"),
            ListenerState::Streaming(_) => f.write_str("Streaming"),
            ListenerState::Backoff(delay) => f.debug_tuple("Backoff").field(delay).finish(),
        }
    }
}

pub struct EventListener {
    source: Arc<dyn EventSource>,
    store: Arc<ConfigStore>,
    notifier: Arc<dyn Notifier>,
    rule: TriggerRule,
    template: MessageTemplate,
    policy: RetryPolicy,
}

impl EventListener {
    pub fn new(
        source: Arc<dyn EventSource>,
        store: Arc<ConfigStore>,
        notifier: Arc<dyn Notifier>,
        rule: TriggerRule,
        template: MessageTemplate,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
            rule,
            template,
            policy: RetryPolicy::default(),
        }
    }

    #[allow(unused)]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run until the task is dropped.
    pub async fn run(self) {
        tracing::info!(
            "Watching {} events on containers labelled {}",
            self.rule.actions.join(","),
            self.rule.label_selector()
        );

        let mut state = ListenerState::Subscribing;
        loop {
            state = self.step(state).await;
        }
    }

    /// Advance the state machine by one transition.
    pub async fn step(&self, state: ListenerState) -> ListenerState {
        match state {
            ListenerState::Subscribing => match self.source.subscribe().await {
                Ok(stream) => {
                    tracing::info!("Subscribed to Docker events");
                    ListenerState::Streaming(stream)
                }
                Err(e) => {
                    tracing::error!("Failed to subscribe to Docker events: {}", e);
                    ListenerState::Backoff(self.policy.resubscribe_delay)
                }
            },
            ListenerState::Streaming(mut stream) => {
                match self.consume(&mut stream).await {
                    Some(e) => tracing::error!("Docker event stream failed: {}", e),
                    None => tracing::warn!("Docker event stream ended"),
                }
                ListenerState::Backoff(self.policy.resubscribe_delay)
            }
            ListenerState::Backoff(delay) => {
                tracing::info!("Resubscribing to Docker events in {}ms", delay.as_millis());
                tokio::time::sleep(delay).await;
                ListenerState::Subscribing
            }
        }
    }

    /// Drain one subscription. Returns the error that broke it, if any.
    async fn consume(&self, stream: &mut EventStream) -> Option<ListenerError> {
        while let Some(item) = stream.next().await {
            let message = match item {
                Ok(message) => message,
                Err(e) => return Some(e),
            };

            if let Err(e) = self.handle(message).await {
                tracing::warn!("Failed to process event: {}", e);
                tokio::time::sleep(self.policy.event_pause).await;
            }
        }
        None
    }

    /// Filter one raw event and deliver its notification if it passes.
    pub async fn handle(&self, message: EventMessage) -> Result<(), ListenerError> {
        let (resource_type, action) = LifecycleEvent::header(&message);
        if !self.rule.is_watched(&resource_type, &action) {
            return Ok(());
        }

        let event = LifecycleEvent::decode(message)?;
        if !self.rule.matches_labels(&event.labels) {
            tracing::debug!("Ignoring {} of unlabelled container {}", event.action, event.short_id());
            return Ok(());
        }

        let toggle = self.store.get(&event.resource_id).await;
        if !filter::should_notify(&event.action, &toggle) {
            tracing::debug!("Notifications for {} disabled on {}", event.action, event.container_name());
            return Ok(());
        }

        let message = self.template.render(event.container_name(), &event.action);
        self.notifier.deliver(&message).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::notifier::testing::RecordingNotifier;
    use async_trait::async_trait;
    use bollard::models::{EventActor, EventMessageTypeEnum};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    const WEB1: &str = "aaaaaaaaaaaa1111111111111111111111111111111111111111111111111111";
    const DB1: &str = "bbbbbbbbbbbb2222222222222222222222222222222222222222222222222222";

    type Session = Vec<Result<EventMessage, ListenerError>>;

    /// Hands out one scripted session per subscribe call, then blocks forever.
    struct ScriptedSource {
        sessions: Mutex<VecDeque<Result<Session, ListenerError>>>,
        subscriptions: Mutex<usize>,
    }

    impl ScriptedSource {
        fn new(sessions: Vec<Result<Session, ListenerError>>) -> Self {
            Self {
                sessions: Mutex::new(sessions.into()),
                subscriptions: Mutex::new(0),
            }
        }

        fn subscriptions(&self) -> usize {
            *self.subscriptions.lock().unwrap()
        }
    }

    #[async_trait]
    impl EventSource for ScriptedSource {
        async fn subscribe(&self) -> Result<EventStream, ListenerError> {
            *self.subscriptions.lock().unwrap() += 1;
            let next = self.sessions.lock().unwrap().pop_front();
            match next {
                Some(Ok(events)) => Ok(futures::stream::iter(events).boxed()),
                Some(Err(e)) => Err(e),
                None => futures::future::pending().await,
            }
        }
    }

    fn event(typ: EventMessageTypeEnum, action: &str, id: &str, attrs: &[(&str, &str)]) -> EventMessage {
        let attributes: HashMap<String, String> =
            attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        EventMessage {
            typ: Some(typ),
            action: Some(action.to_string()),
            actor: Some(EventActor {
                id: Some(id.to_string()),
                attributes: Some(attributes),
            }),
            ..Default::default()
        }
    }

    fn labelled(action: &str, id: &str, name: &str) -> EventMessage {
        event(
            EventMessageTypeEnum::CONTAINER,
            action,
            id,
            &[("notify", "true"), ("name", name)],
        )
    }

    fn engine_error() -> ListenerError {
        ListenerError::Engine(bollard::errors::Error::DockerResponseServerError {
            status_code: 500,
            message: "daemon restarting".to_string(),
        })
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            event_pause: Duration::from_millis(1),
            resubscribe_delay: Duration::from_millis(1),
        }
    }

    struct Harness {
        listener: EventListener,
        source: Arc<ScriptedSource>,
        notifier: Arc<RecordingNotifier>,
        store: Arc<ConfigStore>,
        _dir: tempfile::TempDir,
    }

    async fn harness(sessions: Vec<Result<Session, ListenerError>>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ConfigStore::load(dir.path().join("config.json")).await);
        let source = Arc::new(ScriptedSource::new(sessions));
        let notifier = Arc::new(RecordingNotifier::default());

        let listener = EventListener::new(
            source.clone(),
            store.clone(),
            notifier.clone(),
            TriggerRule::default(),
            MessageTemplate::default(),
        )
        .with_policy(fast_policy());

        Harness {
            listener,
            source,
            notifier,
            store,
            _dir: dir,
        }
    }

    async fn drive_one_session(h: &Harness) -> ListenerState {
        let state = h.listener.step(ListenerState::Subscribing).await;
        assert!(matches!(state, ListenerState::Streaming(_)));
        h.listener.step(state).await
    }

    #[tokio::test]
    async fn test_labelled_start_is_notified() {
        let h = harness(vec![Ok(vec![Ok(labelled("start", WEB1, "web1"))])]).await;
        drive_one_session(&h).await;
        assert_eq!(h.notifier.messages(), vec!["Container web1 start"]);
    }

    #[tokio::test]
    async fn test_non_container_events_are_ignored() {
        let attrs = [("notify", "true"), ("name", "web1")];
        let h = harness(vec![Ok(vec![
            Ok(event(EventMessageTypeEnum::NETWORK, "start", WEB1, &attrs)),
            Ok(event(EventMessageTypeEnum::IMAGE, "stop", WEB1, &attrs)),
            Ok(event(EventMessageTypeEnum::VOLUME, "start", WEB1, &attrs)),
        ])])
        .await;

        drive_one_session(&h).await;
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_unlabelled_containers_are_ignored() {
        let h = harness(vec![Ok(vec![
            Ok(event(EventMessageTypeEnum::CONTAINER, "start", WEB1, &[("name", "web1")])),
            Ok(event(EventMessageTypeEnum::CONTAINER, "start", WEB1, &[("notify", "false")])),
            Ok(event(EventMessageTypeEnum::CONTAINER, "stop", WEB1, &[("notify", "TRUE")])),
        ])])
        .await;

        drive_one_session(&h).await;
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_unwatched_actions_are_ignored() {
        let h = harness(vec![Ok(vec![
            Ok(labelled("die", WEB1, "web1")),
            Ok(labelled("create", WEB1, "web1")),
        ])])
        .await;

        drive_one_session(&h).await;
        assert!(h.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_toggles_gate_delivery() {
        let h = harness(vec![Ok(vec![
            Ok(labelled("start", WEB1, "web1")),
            Ok(labelled("stop", WEB1, "web1")),
            Ok(labelled("start", DB1, "db1")),
        ])])
        .await;
        h.store.set_toggle(WEB1, "start").await.unwrap();

        drive_one_session(&h).await;
        assert_eq!(h.notifier.messages(), vec!["Container web1 stop", "Container db1 start"]);
    }

    #[tokio::test]
    async fn test_name_falls_back_to_short_id() {
        let h = harness(vec![Ok(vec![Ok(event(
            EventMessageTypeEnum::CONTAINER,
            "stop",
            DB1,
            &[("notify", "true")],
        ))])])
        .await;

        drive_one_session(&h).await;
        assert_eq!(h.notifier.messages(), vec!["Container bbbbbbbbbbbb stop"]);
    }

    #[tokio::test]
    async fn test_malformed_event_is_skipped() {
        let broken = EventMessage {
            typ: Some(EventMessageTypeEnum::CONTAINER),
            action: Some("start".to_string()),
            actor: None,
            ..Default::default()
        };
        let h = harness(vec![Ok(vec![
            Ok(labelled("start", WEB1, "web1")),
            Ok(broken),
            Ok(labelled("stop", WEB1, "web1")),
        ])])
        .await;

        let state = drive_one_session(&h).await;
        assert!(matches!(state, ListenerState::Backoff(_)));
        assert_eq!(h.notifier.messages(), vec!["Container web1 start", "Container web1 stop"]);
    }

    #[tokio::test]
    async fn test_stream_error_ends_session() {
        let h = harness(vec![Ok(vec![
            Ok(labelled("start", WEB1, "web1")),
            Err(engine_error()),
            Ok(labelled("stop", WEB1, "web1")),
        ])])
        .await;

        let state = drive_one_session(&h).await;
        assert!(matches!(state, ListenerState::Backoff(d) if d == fast_policy().resubscribe_delay));
        assert_eq!(h.notifier.messages(), vec!["Container web1 start"]);
    }

    #[tokio::test]
    async fn test_subscribe_failure_backs_off() {
        let h = harness(vec![Err(engine_error())]).await;

        let state = h.listener.step(ListenerState::Subscribing).await;
        assert!(matches!(state, ListenerState::Backoff(_)));

        let state = h.listener.step(state).await;
        assert!(matches!(state, ListenerState::Subscribing));
    }

    #[tokio::test]
    async fn test_run_resubscribes_after_failures() {
        let h = harness(vec![
            Err(engine_error()),
            Ok(vec![Ok(labelled("start", WEB1, "web1")), Err(engine_error())]),
            Ok(vec![Ok(labelled("stop", WEB1, "web1"))]),
        ])
        .await;

        let Harness { listener, source, notifier, _dir, .. } = h;
        // The fourth subscribe never returns, so the run loop parks there
        let result = tokio::time::timeout(Duration::from_millis(500), listener.run()).await;
        assert!(result.is_err());

        assert_eq!(source.subscriptions(), 4);
        assert_eq!(notifier.messages(), vec!["Container web1 start", "Container web1 stop"]);
    }
}
