//! Which events turn into notifications.

use std::collections::HashMap;

use crate::store::{ContainerToggle, ToggleEvent};

pub const DEFAULT_LABEL: &str = "notify";
pub const DEFAULT_VALUE: &str = "true";
pub const DEFAULT_ACTIONS: &str = "start,stop";

const CONTAINER: &str = "container";

/// Final gate: does this container want to hear about `action`?
pub fn should_notify(action: &str, toggle: &ContainerToggle) -> bool {
    match action.parse::<ToggleEvent>() {
        Ok(event) => toggle.is_enabled(event),
        Err(_) => false,
    }
}

/// Label and action requirements an event must meet before the store is consulted.
#[derive(Debug, Clone)]
pub struct TriggerRule {
    pub label: String,
    pub value: String,
    pub actions: Vec<String>,
}

impl TriggerRule {
    pub fn new(label: impl Into<String>, value: impl Into<String>, actions: Vec<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            actions,
        }
    }

    /// Split a comma separated action list, dropping blanks.
    pub fn parse_actions(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|action| !action.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn is_watched(&self, resource_type: &str, action: &str) -> bool {
        resource_type == CONTAINER && self.actions.iter().any(|a| a == action)
    }

    pub fn matches_labels(&self, labels: &HashMap<String, String>) -> bool {
        labels.get(&self.label).is_some_and(|value| *value == self.value)
    }

    /// `label=value`, the form the engine's label filter takes.
    pub fn label_selector(&self) -> String {
        format!("{}={}", self.label, self.value)
    }
}

impl Default for TriggerRule {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL, DEFAULT_VALUE, Self::parse_actions(DEFAULT_ACTIONS))
    }
}
