//! # casahub-adapter-storage-json
//!
//! JSON file persistence for the casahub core: one versioned storage file
//! per collection inside a storage directory, written atomically via a
//! temporary file and rename. Implements the core's repository ports with
//! round-trip fidelity — reload returns records in stored order.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use casahub_core::ports::storage::{DeviceRecord, DeviceRepository, RuleRepository, StorageError};
use casahub_domain::id::RuleId;
use casahub_domain::rule::Rule;

const STORAGE_VERSION: u32 = 1;
const DEVICES_FILE: &str = "devices.json";
const RULES_FILE: &str = "rules.json";

/// Envelope wrapping each storage file with its schema version.
#[derive(Debug, Serialize, Deserialize)]
struct StorageFile<T> {
    version: u32,
    key: String,
    data: T,
}

/// File-backed storage rooted at one directory.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    dir: PathBuf,
}

impl JsonStorage {
    /// Create storage rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    async fn read<T>(&self, file: &str) -> Result<Option<T>, StorageError>
    where
        T: DeserializeOwned,
    {
        let path = self.path(file);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(?path, "storage file not present yet");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let envelope: StorageFile<T> = serde_json::from_str(&content)?;
        if envelope.version != STORAGE_VERSION {
            return Err(StorageError::VersionMismatch {
                expected: STORAGE_VERSION,
                found: envelope.version,
            });
        }
        Ok(Some(envelope.data))
    }

    async fn write<T>(&self, file: &str, data: T) -> Result<(), StorageError>
    where
        T: Serialize,
    {
        fs::create_dir_all(&self.dir).await?;
        let envelope = StorageFile {
            version: STORAGE_VERSION,
            key: file.trim_end_matches(".json").to_string(),
            data,
        };
        let content = serde_json::to_string_pretty(&envelope)?;
        // Write-then-rename keeps a crash from truncating the previous file.
        let tmp = self.path(&format!("{file}.tmp"));
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, self.path(file)).await?;
        Ok(())
    }
}

impl DeviceRepository for JsonStorage {
    async fn load(&self) -> Result<Vec<DeviceRecord>, StorageError> {
        Ok(self.read(DEVICES_FILE).await?.unwrap_or_default())
    }

    async fn store(&self, devices: Vec<DeviceRecord>) -> Result<(), StorageError> {
        self.write(DEVICES_FILE, devices).await
    }
}

impl RuleRepository for JsonStorage {
    async fn load(&self) -> Result<Vec<Rule>, StorageError> {
        Ok(self.read(RULES_FILE).await?.unwrap_or_default())
    }

    async fn save(&self, rule: Rule) -> Result<(), StorageError> {
        let mut rules: Vec<Rule> = self.read(RULES_FILE).await?.unwrap_or_default();
        if let Some(existing) = rules.iter_mut().find(|r| r.id == rule.id) {
            *existing = rule;
        } else {
            rules.push(rule);
        }
        self.write(RULES_FILE, rules).await
    }

    async fn delete(&self, id: RuleId) -> Result<(), StorageError> {
        let mut rules: Vec<Rule> = self.read(RULES_FILE).await?.unwrap_or_default();
        rules.retain(|r| r.id != id);
        self.write(RULES_FILE, rules).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use casahub_domain::action::Action;
    use casahub_domain::descriptor::EventDescriptor;
    use casahub_domain::id::{ActionTypeId, DeviceClassId, DeviceId, EventTypeId, PluginId};
    use casahub_domain::param::Param;
    use casahub_domain::state_evaluator::StateEvaluator;

    fn record(name: &str) -> DeviceRecord {
        DeviceRecord {
            id: DeviceId::new(),
            device_class_id: DeviceClassId::new(),
            plugin_id: PluginId::new(),
            name: name.to_string(),
            params: vec![Param::new("label", name)],
        }
    }

    fn rule() -> Rule {
        let device_id = DeviceId::new();
        Rule::new(
            RuleId::new(),
            vec![EventDescriptor::new(EventTypeId::new(), device_id, Vec::new())],
            StateEvaluator::Always,
            vec![Action::new(ActionTypeId::new(), device_id, Vec::new())],
        )
    }

    #[tokio::test]
    async fn should_return_empty_collections_before_first_write() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());
        assert!(DeviceRepository::load(&storage).await.unwrap().is_empty());
        assert!(RuleRepository::load(&storage).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_roundtrip_devices_preserving_order() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        let records = vec![record("first"), record("second"), record("third")];
        storage.store(records.clone()).await.unwrap();

        let loaded = DeviceRepository::load(&storage).await.unwrap();
        assert_eq!(loaded, records);
    }

    #[tokio::test]
    async fn should_roundtrip_rules_preserving_order() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        let first = rule();
        let second = rule();
        let third = rule();
        for r in [&first, &second, &third] {
            storage.save(r.clone()).await.unwrap();
        }

        let loaded = RuleRepository::load(&storage).await.unwrap();
        let ids: Vec<RuleId> = loaded.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
    }

    #[tokio::test]
    async fn should_replace_rule_in_place_keeping_position() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        let first = rule();
        let second = rule();
        storage.save(first.clone()).await.unwrap();
        storage.save(second.clone()).await.unwrap();

        let mut repaired = first.clone();
        repaired.actions.clear();
        storage.save(repaired).await.unwrap();

        let loaded = RuleRepository::load(&storage).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, first.id);
        assert!(loaded[0].actions.is_empty());
        assert_eq!(loaded[1].id, second.id);
    }

    #[tokio::test]
    async fn should_delete_single_rule() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        let doomed = rule();
        let kept = rule();
        storage.save(doomed.clone()).await.unwrap();
        storage.save(kept.clone()).await.unwrap();
        storage.delete(doomed.id).await.unwrap();

        let loaded = RuleRepository::load(&storage).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, kept.id);
    }

    #[tokio::test]
    async fn should_reject_unknown_storage_version() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());
        tokio::fs::create_dir_all(dir.path()).await.unwrap();
        tokio::fs::write(
            dir.path().join(DEVICES_FILE),
            r#"{"version": 99, "key": "devices", "data": []}"#,
        )
        .await
        .unwrap();

        let result = DeviceRepository::load(&storage).await;
        assert!(matches!(
            result,
            Err(StorageError::VersionMismatch {
                expected: 1,
                found: 99
            })
        ));
    }
}
