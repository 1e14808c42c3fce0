use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::toggle::{ContainerToggle, ToggleEvent};
use super::StoreError;

type Entries = BTreeMap<String, ContainerToggle>;

/// Container id -> notification switches, persisted as one JSON document.
///
/// Every read and every toggle goes through the same lock. A toggle holds
/// the write guard until the new document has been renamed into place, so
/// two toggles on the same container can never lose a flip.
pub struct ConfigStore {
    path: PathBuf,
    entries: RwLock<Entries>,
}

impl ConfigStore {
    /// Load the store from `path`.
    ///
    /// A missing or unreadable file is not an error: the store starts empty
    /// and the next toggle rewrites the file.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let entries = match read_entries(&path).await {
            Ok(Some(entries)) => {
                tracing::info!("Config loaded from {} ({} entries)", path.display(), entries.len());
                entries
            }
            Ok(None) => {
                tracing::info!("No existing config at {}, starting empty", path.display());
                Entries::new()
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable config at {}: {}", path.display(), e);
                Entries::new()
            }
        };

        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored switches for `id`, or the all-enabled default.
    pub async fn get(&self, id: &str) -> ContainerToggle {
        let entries = self.entries.read().await;
        entries.get(id).copied().unwrap_or_default()
    }

    /// Flip one switch for `id` and persist the whole document.
    ///
    /// If the write fails the flip is kept in memory and the error is
    /// returned so the caller knows the change is not durable.
    pub async fn set_toggle(&self, id: &str, event: &str) -> Result<ContainerToggle, StoreError> {
        let event: ToggleEvent = event.parse()?;

        let mut entries = self.entries.write().await;
        let toggle = entries.entry(id.to_string()).or_default();
        toggle.flip(event);
        let updated = *toggle;

        if let Err(e) = persist(&self.path, &entries).await {
            tracing::error!("Failed to save config to {}: {}", self.path.display(), e);
            return Err(e);
        }

        tracing::info!("Updated config for {}: start={} stop={}", id, updated.start, updated.stop);
        Ok(updated)
    }

    /// Point-in-time copy of every stored record, ordered by container id.
    pub async fn snapshot(&self) -> Vec<(String, ContainerToggle)> {
        let entries = self.entries.read().await;
        entries.iter().map(|(id, toggle)| (id.clone(), *toggle)).collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

async fn read_entries(path: &Path) -> Result<Option<Entries>, Box<dyn std::error::Error + Send + Sync>> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let entries: Entries = serde_json::from_slice(&content)?;
    Ok(Some(entries))
}

/// Sibling file the next document is staged in before the rename.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write the document next to `path` and flush it to disk.
/// The canonical file is not touched.
async fn write_temp(path: &Path, entries: &Entries) -> Result<PathBuf, StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let serialized = serde_json::to_vec_pretty(entries)?;
    let temp = temp_path(path);

    let mut file = tokio::fs::File::create(&temp).await?;
    file.write_all(&serialized).await?;
    file.sync_all().await?;

    Ok(temp)
}

async fn persist(path: &Path, entries: &Entries) -> Result<(), StoreError> {
    let temp = write_temp(path, entries).await?;
    tokio::fs::rename(&temp, path).await?;
    tracing::debug!("Config saved to {}", path.display());
    Ok(())
}
