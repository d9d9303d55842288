//! Contact persistence collaborators.
//!
//! The SQLite [`ContactRepository`] is the primary store; [`LocalContactFile`]
//! is the durable fallback used whenever the primary is unavailable or empty.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use wayfarer_core::types::Contact;
use wayfarer_storage::ContactRepository;

use crate::error::SosError;

/// A place emergency contacts can be written to and read from.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn add(&self, user_id: &str, contact: &Contact) -> Result<(), SosError>;

    async fn list(&self, user_id: &str) -> Result<Vec<Contact>, SosError>;
}

#[async_trait]
impl ContactStore for ContactRepository {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn add(&self, user_id: &str, contact: &Contact) -> Result<(), SosError> {
        let repo = self.clone();
        let user_id = user_id.to_string();
        let contact = contact.clone();
        tokio::task::spawn_blocking(move || repo.add(&user_id, &contact))
            .await
            .map_err(|e| SosError::Storage(format!("contact task failed: {}", e)))??;
        Ok(())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Contact>, SosError> {
        let repo = self.clone();
        let user_id = user_id.to_string();
        let contacts = tokio::task::spawn_blocking(move || repo.list(&user_id))
            .await
            .map_err(|e| SosError::Storage(format!("contact task failed: {}", e)))??;
        Ok(contacts)
    }
}

/// On-disk layout of the fallback file.
///
/// Older files hold a single shared list. The first user to touch such a
/// file claims the list and the file is rewritten in the per-user form.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContactFile {
    PerUser(BTreeMap<String, Vec<Contact>>),
    Shared(Vec<Contact>),
}

/// JSON file of contacts keyed by user id.
#[derive(Debug)]
pub struct LocalContactFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalContactFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<ContactFile, SosError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(ContactFile::PerUser(BTreeMap::new())),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(ContactFile::PerUser(BTreeMap::new()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Per-user contents, moving a shared list over to `user_id`.
    /// Callers hold the write lock.
    async fn read_claimed(&self, user_id: &str) -> Result<BTreeMap<String, Vec<Contact>>, SosError> {
        match self.read_file().await? {
            ContactFile::PerUser(map) => Ok(map),
            ContactFile::Shared(list) => {
                let mut map = BTreeMap::new();
                map.insert(user_id.to_string(), list);
                self.write_file(&map).await?;
                info!(path = %self.path.display(), user_id, "Shared contact list claimed");
                Ok(map)
            }
        }
    }

    async fn write_file(&self, by_user: &BTreeMap<String, Vec<Contact>>) -> Result<(), SosError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(by_user)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl ContactStore for LocalContactFile {
    fn name(&self) -> &str {
        "local-file"
    }

    async fn add(&self, user_id: &str, contact: &Contact) -> Result<(), SosError> {
        let _guard = self.write_lock.lock().await;

        let mut by_user = self.read_claimed(user_id).await?;

        let contacts = by_user.entry(user_id.to_string()).or_default();
        match contacts
            .iter_mut()
            .find(|c| c.phone_number == contact.phone_number)
        {
            Some(existing) => *existing = contact.clone(),
            None => contacts.push(contact.clone()),
        }

        self.write_file(&by_user).await?;
        debug!(path = %self.path.display(), user_id, "Contact written to local file");
        Ok(())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Contact>, SosError> {
        let contacts = match self.read_file().await? {
            ContactFile::PerUser(mut map) => map.remove(user_id).unwrap_or_default(),
            ContactFile::Shared(_) => {
                let _guard = self.write_lock.lock().await;
                self.read_claimed(user_id)
                    .await?
                    .remove(user_id)
                    .unwrap_or_default()
            }
        };
        // Numbers written by hand may not be canonical yet.
        Ok(contacts
            .into_iter()
            .map(|c| Contact::new(c.name, &c.phone_number, c.relation))
            .collect())
    }
}
