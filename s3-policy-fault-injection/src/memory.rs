//! In-memory policy and backup stores.
//!
//! These stand in for S3 and the backup directory when exercising the
//! inject/restore logic. The policy store mirrors S3 in rejecting a policy
//! without statements.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::aws::{PolicyLookup, PolicyStore};
use crate::backup::BackupStore;
use crate::error::{FaultInjectionError, FaultInjectionResult};
use crate::policy::PolicyDocument;

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A call made against [`InMemoryPolicyStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `get_policy(bucket)`
    Get(String),
    /// `put_policy(bucket, ..)`
    Put(String),
    /// `delete_policy(bucket)`
    Delete(String),
}

/// Policy store keeping policies in a map and recording every call.
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    policies: Mutex<HashMap<String, PolicyDocument>>,
    calls: Mutex<Vec<StoreCall>>,
    deny_writes: AtomicBool,
}

impl InMemoryPolicyStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `bucket` with `policy`.
    #[must_use]
    pub fn with_policy(self, bucket: &str, policy: PolicyDocument) -> Self {
        locked(&self.policies).insert(bucket.to_string(), policy);
        self
    }

    /// Current policy of `bucket`, without recording a call.
    pub fn policy(&self, bucket: &str) -> Option<PolicyDocument> {
        locked(&self.policies).get(bucket).cloned()
    }

    /// Replace the policy of `bucket` behind the tool's back.
    pub fn set_policy(&self, bucket: &str, policy: PolicyDocument) {
        locked(&self.policies).insert(bucket.to_string(), policy);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        locked(&self.calls).clone()
    }

    /// Number of put and delete calls made so far.
    pub fn write_count(&self) -> usize {
        locked(&self.calls)
            .iter()
            .filter(|c| !matches!(c, StoreCall::Get(_)))
            .count()
    }

    /// Make subsequent puts and deletes fail with an access error.
    pub fn deny_writes(&self) {
        self.deny_writes.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: StoreCall) {
        locked(&self.calls).push(call);
    }

    fn check_writable(&self, operation: &str, bucket: &str) -> FaultInjectionResult<()> {
        if self.deny_writes.load(Ordering::SeqCst) {
            return Err(FaultInjectionError::store_access(
                operation,
                bucket,
                "AccessDenied: Access Denied",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn get_policy(&self, bucket: &str) -> FaultInjectionResult<PolicyLookup> {
        self.record(StoreCall::Get(bucket.to_string()));
        Ok(self
            .policy(bucket)
            .map_or(PolicyLookup::NotFound, PolicyLookup::Found))
    }

    async fn put_policy(&self, bucket: &str, policy: &PolicyDocument) -> FaultInjectionResult<()> {
        self.record(StoreCall::Put(bucket.to_string()));
        self.check_writable("PutBucketPolicy", bucket)?;
        if policy.is_empty() {
            return Err(FaultInjectionError::store_access(
                "PutBucketPolicy",
                bucket,
                "MalformedPolicy: Policy has no statements",
            ));
        }
        locked(&self.policies).insert(bucket.to_string(), policy.clone());
        Ok(())
    }

    async fn delete_policy(&self, bucket: &str) -> FaultInjectionResult<()> {
        self.record(StoreCall::Delete(bucket.to_string()));
        self.check_writable("DeleteBucketPolicy", bucket)?;
        locked(&self.policies).remove(bucket);
        Ok(())
    }
}

/// Backup store keeping records in a map.
#[derive(Debug, Default)]
pub struct InMemoryBackupStore {
    records: Mutex<HashMap<String, PolicyDocument>>,
}

impl InMemoryBackupStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record for `bucket`.
    pub fn record(&self, bucket: &str) -> Option<PolicyDocument> {
        locked(&self.records).get(bucket).cloned()
    }
}

#[async_trait]
impl BackupStore for InMemoryBackupStore {
    fn location(&self, bucket: &str) -> String {
        format!("memory://{bucket}")
    }

    async fn exists(&self, bucket: &str) -> FaultInjectionResult<bool> {
        Ok(locked(&self.records).contains_key(bucket))
    }

    async fn write(&self, bucket: &str, policy: &PolicyDocument) -> FaultInjectionResult<()> {
        locked(&self.records).insert(bucket.to_string(), policy.clone());
        Ok(())
    }

    async fn read(&self, bucket: &str) -> FaultInjectionResult<PolicyDocument> {
        self.record(bucket).ok_or_else(|| {
            FaultInjectionError::backup(
                "read",
                self.location(bucket),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )
        })
    }

    async fn delete(&self, bucket: &str) -> FaultInjectionResult<()> {
        locked(&self.records).remove(bucket).map(|_| ()).ok_or_else(|| {
            FaultInjectionError::backup(
                "delete",
                self.location(bucket),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )
        })
    }
}
