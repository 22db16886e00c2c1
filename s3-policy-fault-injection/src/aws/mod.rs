//! Policy store integration: the store abstraction and its AWS S3 implementation.

/// S3 bucket policy client
pub mod s3;

use async_trait::async_trait;

use crate::error::FaultInjectionResult;
use crate::policy::PolicyDocument;

/// Outcome of reading a bucket policy.
///
/// A bucket without a policy is an ordinary result, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyLookup {
    /// The bucket has a policy
    Found(PolicyDocument),
    /// No policy is attached to the bucket
    NotFound,
}

impl PolicyLookup {
    /// The found document, or a fresh empty one.
    pub fn or_empty(self) -> PolicyDocument {
        match self {
            Self::Found(doc) => doc,
            Self::NotFound => PolicyDocument::default(),
        }
    }
}

/// Remote store holding the live bucket policy.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Read the policy attached to `bucket`.
    async fn get_policy(&self, bucket: &str) -> FaultInjectionResult<PolicyLookup>;

    /// Replace the whole policy attached to `bucket`.
    async fn put_policy(&self, bucket: &str, policy: &PolicyDocument) -> FaultInjectionResult<()>;

    /// Remove the policy from `bucket` entirely.
    async fn delete_policy(&self, bucket: &str) -> FaultInjectionResult<()>;
}
