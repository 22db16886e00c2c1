//! Error handling module

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for operations that can fail with `FaultInjectionError`
pub type FaultInjectionResult<T> = std::result::Result<T, FaultInjectionError>;

/// Errors raised while injecting or restoring a bucket policy fault.
///
/// A bucket without a policy is not an error; see [`crate::PolicyLookup`].
#[derive(Error, Debug)]
pub enum FaultInjectionError {
    /// Authorization, network or service failure of a policy store call
    #[error("Policy store {operation} failed for bucket '{bucket}': {message}")]
    StoreAccess {
        /// The store call that failed (e.g., "GetBucketPolicy")
        operation: String,
        /// Target bucket
        bucket: String,
        /// Error reported by the store
        message: String,
    },

    /// The store returned a policy that is not a valid policy document
    #[error("Bucket '{bucket}' has a malformed policy document: {source}")]
    PolicyFormat {
        /// Target bucket
        bucket: String,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Backup file system operation errors
    #[error("Backup {operation} failed on path '{path}': {source}")]
    Backup {
        /// The operation that failed (e.g., "read", "write", "delete")
        operation: String,
        /// The backup file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A backup file exists but does not hold a policy document
    #[error("Backup '{path}' is not a valid policy document: {source}")]
    BackupFormat {
        /// The backup file path
        path: PathBuf,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Input validation errors for user-provided data
    #[error("Validation error: {message}")]
    Validation {
        /// Detailed validation error message
        message: String,
    },
}

impl FaultInjectionError {
    /// Create a policy store access error
    pub fn store_access(
        operation: impl Into<String>,
        bucket: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::StoreAccess {
            operation: operation.into(),
            bucket: bucket.into(),
            message: message.into(),
        }
    }

    /// Create a malformed policy error
    pub(crate) fn policy_format(bucket: impl Into<String>, source: serde_json::Error) -> Self {
        Self::PolicyFormat {
            bucket: bucket.into(),
            source,
        }
    }

    /// Create a backup I/O error with operation context
    pub(crate) fn backup(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Backup {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a backup format error
    pub(crate) fn backup_format(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::BackupFormat {
            path: path.into(),
            source,
        }
    }

    /// Create a validation error
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True for failures of the remote policy store.
    pub const fn is_store_access(&self) -> bool {
        matches!(self, Self::StoreAccess { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_error_creation() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = FaultInjectionError::backup("write", "/tmp/.original_policy_b1.json", io_error);

        assert!(matches!(error, FaultInjectionError::Backup { .. }));
        assert!(error.to_string().contains("write"));
        assert!(error.to_string().contains("/tmp/.original_policy_b1.json"));
        assert!(!error.is_store_access());
    }

    #[test]
    fn test_store_access_error_message() {
        let error = FaultInjectionError::store_access("PutBucketPolicy", "b1", "AccessDenied");
        assert!(error.is_store_access());
        assert_eq!(
            error.to_string(),
            "Policy store PutBucketPolicy failed for bucket 'b1': AccessDenied"
        );
    }
}
