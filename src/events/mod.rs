//! Docker lifecycle events -> notifications.
//!
//! ```text
//! EventSource ──> EventListener ──> filter (TriggerRule, should_notify) ──> Notifier
//!                      │
//!                      └── ConfigStore::get
//! ```

pub mod event;
pub mod filter;
pub mod listener;
pub mod source;

pub use listener::EventListener;

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("docker engine error: {0}")]
    Engine(#[from] bollard::errors::Error),

    #[error("malformed event: {0}")]
    Malformed(String),
}
