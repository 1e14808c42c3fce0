//! Durable per-container notification switches.

pub mod config_store;
pub mod toggle;

pub use config_store::ConfigStore;
pub use toggle::{ContainerToggle, ToggleEvent};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid event '{0}', expected 'start' or 'stop'")]
    InvalidEvent(String),

    #[error("failed to persist config: {0}")]
    Persist(#[from] std::io::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}
