use async_trait::async_trait;
use std::collections::HashMap;

/// A container as the engine lists it.
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: String,
    pub labels: HashMap<String, String>,
}

/// Live container listing, running or not.
#[async_trait]
pub trait ContainerCatalog: Send + Sync {
    async fn list_containers(&self) -> Result<Vec<ContainerInfo>, Box<dyn std::error::Error + Send + Sync>>;
}
