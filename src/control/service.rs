//! Read and toggle operations behind the HTTP API.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::catalog::ContainerCatalog;
use crate::events::event::short_id;
use crate::events::filter::TriggerRule;
use crate::store::{ConfigStore, ContainerToggle, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerView {
    pub id: String,
    pub short_id: String,
    pub name: String,
    pub image: String,
    pub runtime_status: String,
    pub start: bool,
    pub stop: bool,
}

pub struct ControlService {
    store: Arc<ConfigStore>,
    catalog: Arc<dyn ContainerCatalog>,
    rule: TriggerRule,
}

impl ControlService {
    pub fn new(store: Arc<ConfigStore>, catalog: Arc<dyn ContainerCatalog>, rule: TriggerRule) -> Self {
        Self { store, catalog, rule }
    }

    /// Labelled containers with their switches, defaults filled in.
    ///
    /// An engine failure is logged and yields an empty list.
    pub async fn list_containers(&self) -> Vec<ContainerView> {
        let containers = match self.catalog.list_containers().await {
            Ok(containers) => containers,
            Err(e) => {
                tracing::error!("Error listing containers: {}", e);
                return Vec::new();
            }
        };

        let toggles: HashMap<String, ContainerToggle> = self.store.snapshot().await.into_iter().collect();

        containers
            .into_iter()
            .filter(|container| self.rule.matches_labels(&container.labels))
            .map(|container| {
                let toggle = toggles.get(&container.id).copied().unwrap_or_default();
                ContainerView {
                    short_id: short_id(&container.id).to_string(),
                    id: container.id,
                    name: container.name,
                    image: container.image,
                    runtime_status: container.status,
                    start: toggle.start,
                    stop: toggle.stop,
                }
            })
            .collect()
    }

    /// The `label=value` pair containers must carry to be watched.
    pub fn trigger(&self) -> String {
        self.rule.label_selector()
    }

    pub async fn toggle(&self, id: &str, event: &str) -> Result<ContainerToggle, StoreError> {
        self.store.set_toggle(id, event).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::control::catalog::{ContainerCatalog, ContainerInfo};
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Fixed listing, or a listing failure when `containers` is `None`.
    pub struct StaticCatalog {
        pub containers: Option<Vec<ContainerInfo>>,
    }

    pub fn container(id: &str, name: &str, labels: &[(&str, &str)]) -> ContainerInfo {
        ContainerInfo {
            id: id.to_string(),
            name: name.to_string(),
            image: "nginx:latest".to_string(),
            status: "running".to_string(),
            labels: labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<HashMap<_, _>>(),
        }
    }

    #[async_trait]
    impl ContainerCatalog for StaticCatalog {
        async fn list_containers(&self) -> Result<Vec<ContainerInfo>, Box<dyn std::error::Error + Send + Sync>> {
            self.containers.clone().ok_or_else(|| "Docker daemon not accessible".into())
        }
    }
}
