use bollard::models::EventMessage;
use std::collections::HashMap;

use super::ListenerError;

const SHORT_ID_LEN: usize = 12;

/// A decoded engine event. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleEvent {
    pub resource_type: String,
    pub action: String,
    pub resource_id: String,
    pub labels: HashMap<String, String>,
}

impl LifecycleEvent {
    /// Resource type and action of a raw message, empty when absent.
    /// Cheap enough to run before the full decode.
    pub fn header(message: &EventMessage) -> (String, String) {
        let resource_type = message.typ.as_ref().map(|t| t.to_string()).unwrap_or_default();
        let action = message.action.clone().unwrap_or_default();
        (resource_type, action)
    }

    pub fn decode(message: EventMessage) -> Result<Self, ListenerError> {
        let (resource_type, action) = Self::header(&message);

        let actor = message
            .actor
            .ok_or_else(|| ListenerError::Malformed(format!("{} event has no actor", action)))?;

        let resource_id = actor
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ListenerError::Malformed(format!("{} event has no actor id", action)))?;

        let labels = actor.attributes.unwrap_or_default();

        Ok(Self {
            resource_type,
            action,
            resource_id,
            labels,
        })
    }

    pub fn short_id(&self) -> &str {
        short_id(&self.resource_id)
    }

    /// The `name` attribute, or the short id when the engine sent none.
    pub fn container_name(&self) -> &str {
        self.labels
            .get("name")
            .map(String::as_str)
            .unwrap_or_else(|| self.short_id())
    }
}

/// First 12 characters of a container id.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}
