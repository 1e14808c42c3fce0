use async_trait::async_trait;
use bollard::models::EventMessage;
use futures::stream::BoxStream;

use super::ListenerError;

/// Raw engine events in emission order. An `Err` item means the
/// subscription itself broke; the stream should not be polled again.
pub type EventStream = BoxStream<'static, Result<EventMessage, ListenerError>>;

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Open a subscription to container events.
    async fn subscribe(&self) -> Result<EventStream, ListenerError>;
}
