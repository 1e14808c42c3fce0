use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::StoreError;

/// Per-container notification switches.
///
/// Containers without a stored record are notified for every event,
/// so the default has both switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerToggle {
    pub start: bool,
    pub stop: bool,
}

impl Default for ContainerToggle {
    fn default() -> Self {
        Self {
            start: true,
            stop: true,
        }
    }
}

impl ContainerToggle {
    pub fn flip(&mut self, event: ToggleEvent) {
        match event {
            ToggleEvent::Start => self.start = !self.start,
            ToggleEvent::Stop => self.stop = !self.stop,
        }
    }

    pub fn is_enabled(&self, event: ToggleEvent) -> bool {
        match event {
            ToggleEvent::Start => self.start,
            ToggleEvent::Stop => self.stop,
        }
    }
}

/// Lifecycle events that carry a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleEvent {
    Start,
    Stop,
}

impl ToggleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleEvent::Start => "start",
            ToggleEvent::Stop => "stop",
        }
    }
}

impl fmt::Display for ToggleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToggleEvent {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(ToggleEvent::Start),
            "stop" => Ok(ToggleEvent::Stop),
            other => Err(StoreError::InvalidEvent(other.to_string())),
        }
    }
}
