pub mod notifier;
pub mod template;

pub use notifier::{Notifier, WebhookNotifier};
pub use template::MessageTemplate;
