//! Inject and restore orchestration.
//!
//! Both operations are a short, strictly ordered sequence of store calls:
//! read before write, backup before mutation. Nothing here locks a bucket;
//! callers serialize operations against the same bucket.

use log::{debug, info, warn};

use crate::aws::{PolicyLookup, PolicyStore};
use crate::backup::BackupStore;
use crate::error::{FaultInjectionError, FaultInjectionResult};
use crate::fault::{build_deny_statement, FaultTarget, DEFAULT_PARTITION, FAULT_STATEMENT_SID};

/// Result of a successful injection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectOutcome {
    /// Where the pre-fault policy was saved
    pub backup_location: String,
    /// Sid of the statement that was applied
    pub fault_sid: &'static str,
    /// Statements in the live policy after injection
    pub statement_count: usize,
    /// Whether the bucket had a policy before injection
    pub had_policy: bool,
    /// Whether an earlier fault statement was replaced
    pub replaced_fault_statement: bool,
    /// Whether an existing backup was overwritten.
    ///
    /// When set, the snapshot from the earlier injection is gone and a later
    /// restore returns the bucket to its state before *this* injection.
    pub overwrote_backup: bool,
}

/// Path taken by a successful restore
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The saved policy was written back and the backup removed
    RestoredFromBackup {
        /// Backup that was consumed
        backup_location: String,
        /// Statements in the restored policy
        statement_count: usize,
    },
    /// The saved policy had no statements, so the bucket policy was deleted
    BackupWasEmptyPolicyDeleted {
        /// Backup that was consumed
        backup_location: String,
    },
    /// No backup; fault statements were stripped from the live policy
    FaultStatementRemoved {
        /// Fault statements removed
        removed: usize,
        /// Statements left in the policy
        remaining: usize,
    },
    /// No backup; the fault statement was the only statement, so the policy was deleted
    FaultWasOnlyStatementPolicyDeleted,
    /// No backup and no policy on the bucket
    NothingToRestore,
}

/// Main service struct that holds the stores and runs inject / restore
pub struct FaultInjectionService<P, B> {
    policy_store: P,
    backup_store: B,
    partition: String,
}

/// Bucket names become part of the backup file name.
fn validate_bucket(bucket: &str) -> FaultInjectionResult<()> {
    if bucket.is_empty() {
        return Err(FaultInjectionError::validation("bucket name must not be empty"));
    }
    if bucket.contains(['/', '\\']) {
        return Err(FaultInjectionError::validation(format!(
            "bucket name '{bucket}' must not contain path separators"
        )));
    }
    Ok(())
}

impl<P: PolicyStore, B: BackupStore> FaultInjectionService<P, B> {
    /// New construct
    pub fn new(policy_store: P, backup_store: B) -> Self {
        Self {
            policy_store,
            backup_store,
            partition: DEFAULT_PARTITION.to_string(),
        }
    }

    /// ARN partition used for the fault statement's resources.
    #[must_use]
    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    /// Policy store
    pub const fn policy_store(&self) -> &P {
        &self.policy_store
    }

    /// Backup store
    pub const fn backup_store(&self) -> &B {
        &self.backup_store
    }

    /// Deny `denied_principal` object read, object write and listing on `bucket`.
    ///
    /// The current policy is saved to the backup store before the live policy is
    /// touched. Re-running without a restore replaces the fault statement rather
    /// than duplicating it, but also replaces the backup.
    pub async fn inject(
        &self,
        bucket: &str,
        denied_principal: &str,
    ) -> FaultInjectionResult<InjectOutcome> {
        validate_bucket(bucket)?;
        let target =
            FaultTarget::new(bucket, denied_principal).with_partition(self.partition.as_str());

        let lookup = self.policy_store.get_policy(bucket).await?;
        let had_policy = matches!(lookup, PolicyLookup::Found(_));
        if !had_policy {
            info!("Bucket '{}' has no policy; starting from an empty document", bucket);
        }
        let mut document = lookup.or_empty();

        let overwrote_backup = self.backup_store.exists(bucket).await?;
        if overwrote_backup {
            warn!(
                "Backup for bucket '{}' already exists and will be overwritten; the policy saved by the earlier injection is lost",
                bucket
            );
        }
        self.backup_store.write(bucket, &document).await?;
        let backup_location = self.backup_store.location(bucket);
        info!("Original policy saved to {}", backup_location);

        let replaced_fault_statement =
            document.apply_fault_statement(build_deny_statement(&target));
        if replaced_fault_statement {
            debug!("Replaced existing {} statement", FAULT_STATEMENT_SID);
        }

        self.policy_store.put_policy(bucket, &document).await?;
        info!(
            "Fault injected: {} added to {} for {}",
            FAULT_STATEMENT_SID, bucket, denied_principal
        );

        Ok(InjectOutcome {
            backup_location,
            fault_sid: FAULT_STATEMENT_SID,
            statement_count: document.statements.len(),
            had_policy,
            replaced_fault_statement,
            overwrote_backup,
        })
    }

    /// Undo an injection on `bucket`.
    ///
    /// Restores the saved policy when a backup exists. Otherwise strips the
    /// fault statement from whatever policy is live, which cannot recover
    /// statements lost to an overwritten backup.
    pub async fn restore(&self, bucket: &str) -> FaultInjectionResult<RestoreOutcome> {
        validate_bucket(bucket)?;

        if self.backup_store.exists(bucket).await? {
            self.restore_from_backup(bucket).await
        } else {
            info!(
                "No backup found for bucket '{}'; removing {} statement by Sid",
                bucket, FAULT_STATEMENT_SID
            );
            self.remove_fault_statement(bucket).await
        }
    }

    async fn restore_from_backup(&self, bucket: &str) -> FaultInjectionResult<RestoreOutcome> {
        let backup_location = self.backup_store.location(bucket);
        let saved = self.backup_store.read(bucket).await?;

        let outcome = if saved.is_empty() {
            self.policy_store.delete_policy(bucket).await?;
            info!("Original had no statements; bucket policy deleted");
            RestoreOutcome::BackupWasEmptyPolicyDeleted {
                backup_location: backup_location.clone(),
            }
        } else {
            self.policy_store.put_policy(bucket, &saved).await?;
            info!("Policy restored from {}", backup_location);
            RestoreOutcome::RestoredFromBackup {
                backup_location: backup_location.clone(),
                statement_count: saved.statements.len(),
            }
        };

        self.backup_store.delete(bucket).await?;
        debug!("Backup {} removed", backup_location);
        Ok(outcome)
    }

    async fn remove_fault_statement(&self, bucket: &str) -> FaultInjectionResult<RestoreOutcome> {
        let PolicyLookup::Found(mut document) = self.policy_store.get_policy(bucket).await? else {
            info!("No bucket policy exists; nothing to restore");
            return Ok(RestoreOutcome::NothingToRestore);
        };

        let removed = document.remove_fault_statements();
        if removed == 0 {
            warn!(
                "Bucket '{}' has no {} statement; writing policy back unchanged",
                bucket, FAULT_STATEMENT_SID
            );
        }

        if document.is_empty() {
            self.policy_store.delete_policy(bucket).await?;
            info!("{} was the only statement; bucket policy deleted", FAULT_STATEMENT_SID);
            return Ok(RestoreOutcome::FaultWasOnlyStatementPolicyDeleted);
        }

        self.policy_store.put_policy(bucket, &document).await?;
        info!("{} statement removed; policy updated", FAULT_STATEMENT_SID);
        Ok(RestoreOutcome::FaultStatementRemoved {
            removed,
            remaining: document.statements.len(),
        })
    }
}
