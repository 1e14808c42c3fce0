//! `{name}` / `{event}` message templates.

pub const DEFAULT_TEMPLATE: &str = "Container {name} {event}";

#[derive(Debug, Clone)]
pub struct MessageTemplate {
    raw: String,
}

impl MessageTemplate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Substitute `{name}` and `{event}` in one pass.
    ///
    /// Any other `{...}` group, and a `{` without a closing brace, is copied
    /// through unchanged. Substituted values are never rescanned.
    pub fn render(&self, name: &str, event: &str) -> String {
        let mut out = String::with_capacity(self.raw.len() + name.len() + event.len());
        let mut rest = self.raw.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];

            let Some(close) = tail.find('}') else {
                out.push_str(tail);
                return out;
            };

            match &tail[1..close] {
                "name" => out.push_str(name),
                "event" => out.push_str(event),
                _ => out.push_str(&tail[..=close]),
            }
            rest = &tail[close + 1..];
        }

        out.push_str(rest);
        out
    }
}

impl Default for MessageTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}
