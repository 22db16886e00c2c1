//! Pre-fault policy snapshots, one slot per bucket.

use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};

use crate::error::{FaultInjectionError, FaultInjectionResult};
use crate::policy::PolicyDocument;

/// Storage for the policy a bucket had before a fault was injected.
///
/// Each bucket has at most one record; writing replaces it.
#[async_trait]
pub trait BackupStore: Send + Sync {
    /// Human-readable location of the record for `bucket`.
    fn location(&self, bucket: &str) -> String;

    /// Whether a record exists for `bucket`.
    async fn exists(&self, bucket: &str) -> FaultInjectionResult<bool>;

    /// Save `policy` for `bucket`, overwriting any earlier record.
    async fn write(&self, bucket: &str, policy: &PolicyDocument) -> FaultInjectionResult<()>;

    /// Load the record for `bucket`.
    async fn read(&self, bucket: &str) -> FaultInjectionResult<PolicyDocument>;

    /// Remove the record for `bucket`.
    async fn delete(&self, bucket: &str) -> FaultInjectionResult<()>;
}

/// Backups kept as pretty-printed JSON files in a single directory.
#[derive(Debug, Clone)]
pub struct FileBackupStore {
    dir: PathBuf,
}

impl FileBackupStore {
    /// Store backups under `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store backups next to the running executable.
    pub fn beside_executable() -> FaultInjectionResult<Self> {
        let exe = std::env::current_exe()
            .map_err(|e| FaultInjectionError::backup("locate executable", "", e))?;
        let dir = exe.parent().map_or_else(PathBuf::new, Path::to_path_buf);
        Ok(Self::new(dir))
    }

    /// Backup directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/.original_policy_<bucket>.json`
    pub fn path_for(&self, bucket: &str) -> PathBuf {
        self.dir.join(format!(".original_policy_{bucket}.json"))
    }
}

#[async_trait]
impl BackupStore for FileBackupStore {
    fn location(&self, bucket: &str) -> String {
        self.path_for(bucket).display().to_string()
    }

    async fn exists(&self, bucket: &str) -> FaultInjectionResult<bool> {
        let path = self.path_for(bucket);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| FaultInjectionError::backup("stat", path, e))
    }

    async fn write(&self, bucket: &str, policy: &PolicyDocument) -> FaultInjectionResult<()> {
        let path = self.path_for(bucket);
        let body = policy
            .to_json_pretty()
            .map_err(|e| FaultInjectionError::backup_format(&path, e))?;

        if !self.dir.as_os_str().is_empty() {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| FaultInjectionError::backup("create directory", &self.dir, e))?;
        }
        debug!("Writing backup for bucket '{}' to {:?}", bucket, path);
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| FaultInjectionError::backup("write", path, e))
    }

    async fn read(&self, bucket: &str) -> FaultInjectionResult<PolicyDocument> {
        let path = self.path_for(bucket);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FaultInjectionError::backup("read", &path, e))?;
        PolicyDocument::from_json(&raw).map_err(|e| FaultInjectionError::backup_format(path, e))
    }

    async fn delete(&self, bucket: &str) -> FaultInjectionResult<()> {
        let path = self.path_for(bucket);
        debug!("Removing backup {:?}", path);
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| FaultInjectionError::backup("delete", path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Effect, OneOrMany, Principal, Statement};
    use serde_json::Map;

    fn one_statement_policy() -> PolicyDocument {
        PolicyDocument {
            statements: vec![Statement {
                sid: Some("A".to_string()),
                effect: Effect::Allow,
                principal: Some(Principal::aws("arn:aws:iam::123:role/r")),
                action: Some(OneOrMany::One("s3:GetObject".to_string())),
                resource: Some(OneOrMany::One("arn:aws:s3:::b1/*".to_string())),
                other: Map::new(),
            }],
            ..PolicyDocument::default()
        }
    }

    #[test]
    fn test_backup_file_name_is_derived_from_bucket() {
        let store = FileBackupStore::new("/var/backups");
        assert_eq!(
            store.path_for("b1"),
            PathBuf::from("/var/backups/.original_policy_b1.json")
        );
    }

    #[tokio::test]
    async fn test_write_read_delete_cycle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileBackupStore::new(dir.path().join("nested"));
        let policy = one_statement_policy();

        assert!(!store.exists("b1").await.expect("exists"));
        store.write("b1", &policy).await.expect("write");
        assert!(store.exists("b1").await.expect("exists"));
        assert_eq!(store.read("b1").await.expect("read"), policy);

        let on_disk = std::fs::read_to_string(store.path_for("b1")).expect("file");
        assert_eq!(on_disk, policy.to_json_pretty().expect("json"));

        store.delete("b1").await.expect("delete");
        assert!(!store.exists("b1").await.expect("exists"));
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileBackupStore::new(dir.path());

        store.write("b1", &one_statement_policy()).await.expect("write");
        store.write("b1", &PolicyDocument::default()).await.expect("write");

        assert!(store.read("b1").await.expect("read").is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_backup_is_a_format_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileBackupStore::new(dir.path());
        std::fs::write(store.path_for("b1"), "not json").expect("seed");

        let err = store.read("b1").await.expect_err("should fail");
        assert!(matches!(err, FaultInjectionError::BackupFormat { .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_backup_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileBackupStore::new(dir.path());

        let err = store.delete("b1").await.expect_err("should fail");
        assert!(matches!(err, FaultInjectionError::Backup { .. }));
    }
}
