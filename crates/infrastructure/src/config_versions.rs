use celeris_dns_domain::{ResolveError, ResolverConfig};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

const MAX_VERSIONS: usize = 100;

/// One historical configuration snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigVersion {
    pub version: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub author: String,
    pub comment: String,
    pub config: serde_json::Value,
}

/// Directory-backed history of configuration snapshots, pruned to the most
/// recent 100.
pub struct ConfigVersionStore {
    dir: PathBuf,
    current: Mutex<Option<String>>,
}

impl ConfigVersionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ResolveError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| ResolveError::Persistence(format!("{}: {}", dir.display(), e)))?;

        let store = Self {
            dir,
            current: Mutex::new(None),
        };
        let history = store.history();
        *store.current.lock() = history.last().map(|v| v.version.clone());
        Ok(store)
    }

    pub fn save_version(
        &self,
        config: &ResolverConfig,
        author: &str,
        comment: &str,
    ) -> Result<String, ResolveError> {
        let config_json = serde_json::to_value(config)
            .map_err(|e| ResolveError::Persistence(e.to_string()))?;
        self.save_raw(config_json, author, comment)
    }

    fn save_raw(
        &self,
        config: serde_json::Value,
        author: &str,
        comment: &str,
    ) -> Result<String, ResolveError> {
        let timestamp = now_millis();
        let version = self.unique_version_id(timestamp);

        let entry = ConfigVersion {
            version: version.clone(),
            timestamp,
            author: author.to_string(),
            comment: comment.to_string(),
            config,
        };

        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| ResolveError::Persistence(e.to_string()))?;
        let path = self.version_path(&version);
        std::fs::write(&path, json)
            .map_err(|e| ResolveError::Persistence(format!("{}: {}", path.display(), e)))?;

        *self.current.lock() = Some(version.clone());
        self.prune_history();

        debug!(version = %version, author = %author, "Config version saved");
        Ok(version)
    }

    /// Sorted oldest-first. Unreadable entries are skipped.
    pub fn history(&self) -> Vec<ConfigVersion> {
        let mut versions = Vec::new();
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return versions;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match Self::read_version_file(&path) {
                    Ok(version) => versions.push(version),
                    Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable version"),
                }
            }
        }

        versions.sort_by_key(|v| (v.timestamp, v.version.clone()));
        versions
    }

    pub fn current_version(&self) -> Option<String> {
        self.current.lock().clone()
    }

    pub fn get_version(&self, version: &str) -> Result<ConfigVersion, ResolveError> {
        Self::read_version_file(&self.version_path(version))
    }

    /// Restores `version` by saving a new snapshot carrying its config.
    pub fn rollback(&self, version: &str, author: &str) -> Result<ResolverConfig, ResolveError> {
        let target = self.get_version(version)?;
        let config: ResolverConfig = serde_json::from_value(target.config.clone())
            .map_err(|e| ResolveError::Persistence(format!("corrupt version {}: {}", version, e)))?;

        self.save_raw(
            target.config,
            author,
            &format!("Rollback to version {}", version),
        )?;
        Ok(config)
    }

    pub fn rollback_to_latest(&self, author: &str) -> Result<ResolverConfig, ResolveError> {
        let history = self.history();
        let latest = history
            .last()
            .ok_or_else(|| ResolveError::Persistence("no versions saved".to_string()))?;
        self.rollback(&latest.version.clone(), author)
    }

    /// Lists the JSON paths whose values differ between two versions.
    pub fn diff(&self, version_a: &str, version_b: &str) -> Result<Vec<String>, ResolveError> {
        let a = self.get_version(version_a)?;
        let b = self.get_version(version_b)?;
        let mut differences = Vec::new();
        diff_values(&a.config, &b.config, "", &mut differences);
        Ok(differences)
    }

    pub fn export_version(&self, version: &str, output: &str) -> Result<(), ResolveError> {
        let entry = self.get_version(version)?;
        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| ResolveError::Persistence(e.to_string()))?;
        std::fs::write(output, json)
            .map_err(|e| ResolveError::Persistence(format!("{}: {}", output, e)))
    }

    /// Imports an exported snapshot as a fresh version.
    pub fn import_version(&self, input: &str, comment: &str) -> Result<String, ResolveError> {
        let entry = Self::read_version_file(Path::new(input))?;
        self.save_raw(entry.config, &entry.author, comment)
    }

    fn read_version_file(path: &Path) -> Result<ConfigVersion, ResolveError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ResolveError::Persistence(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| ResolveError::Persistence(format!("{}: {}", path.display(), e)))
    }

    fn version_path(&self, version: &str) -> PathBuf {
        self.dir.join(format!("{}.json", version))
    }

    fn unique_version_id(&self, timestamp: u64) -> String {
        let mut version = format!("v{}", timestamp);
        let mut suffix = 0;
        while self.version_path(&version).exists() {
            suffix += 1;
            // zero-padded so lexical order matches save order within one ms
            version = format!("v{}-{:03}", timestamp, suffix);
        }
        version
    }

    fn prune_history(&self) {
        let history = self.history();
        if history.len() <= MAX_VERSIONS {
            return;
        }
        let excess = history.len() - MAX_VERSIONS;
        for version in history.iter().take(excess) {
            let path = self.version_path(&version.version);
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "Failed to prune old version");
            }
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn diff_values(a: &serde_json::Value, b: &serde_json::Value, path: &str, out: &mut Vec<String>) {
    use serde_json::Value;

    match (a, b) {
        (Value::Object(map_a), Value::Object(map_b)) => {
            for (key, value_a) in map_a {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                match map_b.get(key) {
                    Some(value_b) => diff_values(value_a, value_b, &child, out),
                    None => out.push(format!("{}: removed", child)),
                }
            }
            for key in map_b.keys() {
                if !map_a.contains_key(key) {
                    let child = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };
                    out.push(format!("{}: added", child));
                }
            }
        }
        _ if a != b => out.push(format!("{}: {} -> {}", path, a, b)),
        _ => {}
    }
}
