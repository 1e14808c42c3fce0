use clap::Args;
use std::path::PathBuf;

use crate::events::filter::{self, TriggerRule};
use crate::notify::template::{self, MessageTemplate};

pub const CONFIG_FILE: &str = "config.json";

/// Daemon settings. Every option can come from a flag or the environment.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Directory holding the persisted notification switches
    #[arg(long, env = "DATA_DIR", default_value = "/data")]
    pub data_dir: PathBuf,

    /// Webhook that receives notifications; empty disables delivery
    #[arg(long = "webhook", env = "DISCORD_WEBHOOK", default_value = "")]
    pub webhook: String,

    /// Label a container must carry to be watched
    #[arg(long, env = "TRIGGER_LABEL", default_value = filter::DEFAULT_LABEL)]
    pub trigger_label: String,

    /// Value the trigger label must have
    #[arg(long, env = "TRIGGER_VALUE", default_value = filter::DEFAULT_VALUE)]
    pub trigger_value: String,

    /// Comma separated lifecycle actions to watch
    #[arg(long, env = "EVENTS", default_value = filter::DEFAULT_ACTIONS)]
    pub events: String,

    /// Notification text, `{name}` and `{event}` are substituted
    #[arg(long, env = "MESSAGE_TEMPLATE", default_value = template::DEFAULT_TEMPLATE)]
    pub message_template: String,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Docker socket path, local defaults when unset
    #[arg(long, env = "DOCKER_SOCKET")]
    pub docker_socket: Option<String>,
}

impl Config {
    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    pub fn webhook(&self) -> Option<String> {
        let webhook = self.webhook.trim();
        (!webhook.is_empty()).then(|| webhook.to_string())
    }

    pub fn trigger_rule(&self) -> TriggerRule {
        TriggerRule::new(
            self.trigger_label.clone(),
            self.trigger_value.clone(),
            TriggerRule::parse_actions(&self.events),
        )
    }

    pub fn template(&self) -> MessageTemplate {
        MessageTemplate::new(self.message_template.clone())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
