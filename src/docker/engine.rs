use async_trait::async_trait;
use bollard::container::ListContainersOptions;
use bollard::system::EventsOptions;
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashMap;

use crate::control::catalog::{ContainerCatalog, ContainerInfo};
use crate::events::filter::TriggerRule;
use crate::events::source::{EventSource, EventStream};
use crate::events::ListenerError;

const CONNECT_TIMEOUT_SECS: u64 = 120;

/// The one Docker connection the daemon holds.
#[derive(Clone)]
pub struct DockerEngine {
    docker: Docker,
    rule: TriggerRule,
}

impl DockerEngine {
    /// Connect through `socket`, or the local defaults (`DOCKER_HOST` or the
    /// platform socket) when none is given.
    pub fn connect(socket: Option<&str>, rule: TriggerRule) -> Result<Self, bollard::errors::Error> {
        let docker = match socket {
            Some(path) => Docker::connect_with_socket(path, CONNECT_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)?,
            None => Docker::connect_with_local_defaults()?,
        };

        Ok(Self { docker, rule })
    }

    /// Verify Docker daemon is running and accessible
    pub async fn check_docker(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ping_result = tokio::time::timeout(
            tokio::time::Duration::from_secs(5),
            self.docker.ping()
        ).await;

        match ping_result {
            Ok(Ok(_)) => {
                tracing::info!("Docker daemon accessible");
                Ok(())
            }
            Ok(Err(e)) => {
                let error_msg = format!("Docker daemon not accessible: {}", e);
                tracing::error!("{}", error_msg);
                Err(error_msg.into())
            }
            Err(_) => {
                let error_msg = "Docker ping timeout after 5 seconds";
                tracing::error!("{}", error_msg);
                Err(error_msg.into())
            }
        }
    }

    /// Engine-side pre-filter. The listener still checks every event itself.
    fn event_filters(&self) -> HashMap<String, Vec<String>> {
        HashMap::from([
            ("type".to_string(), vec!["container".to_string()]),
            ("event".to_string(), self.rule.actions.clone()),
            ("label".to_string(), vec![self.rule.label_selector()]),
        ])
    }
}

#[async_trait]
impl EventSource for DockerEngine {
    async fn subscribe(&self) -> Result<EventStream, ListenerError> {
        let options = EventsOptions::<String> {
            filters: self.event_filters(),
            ..Default::default()
        };

        let stream = self
            .docker
            .events(Some(options))
            .map(|item| item.map_err(ListenerError::from))
            .boxed();

        Ok(stream)
    }
}

#[async_trait]
impl ContainerCatalog for DockerEngine {
    async fn list_containers(&self) -> Result<Vec<ContainerInfo>, Box<dyn std::error::Error + Send + Sync>> {
        let options = ListContainersOptions::<String> {
            all: true,
            filters: HashMap::from([("label".to_string(), vec![self.rule.label_selector()])]),
            ..Default::default()
        };

        let summaries = self.docker.list_containers(Some(options)).await?;

        let containers = summaries
            .into_iter()
            .filter_map(|summary| {
                let id = summary.id?;
                let name = summary
                    .names
                    .and_then(|names| names.into_iter().next())
                    .map(|name| name.trim_start_matches('/').to_string())
                    .unwrap_or_default();

                Some(ContainerInfo {
                    id,
                    name,
                    image: summary.image.unwrap_or_default(),
                    status: summary.state.unwrap_or_default(),
                    labels: summary.labels.unwrap_or_default(),
                })
            })
            .collect();

        Ok(containers)
    }
}
