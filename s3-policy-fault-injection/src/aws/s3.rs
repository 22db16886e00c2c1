use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::Client as S3Client;
use log::debug;

use crate::aws::{PolicyLookup, PolicyStore};
use crate::error::{FaultInjectionError, FaultInjectionResult};
use crate::policy::PolicyDocument;

/// Error code S3 returns from GetBucketPolicy when no policy is attached.
const NO_SUCH_BUCKET_POLICY: &str = "NoSuchBucketPolicy";

/// Bucket policy store backed by the S3 API
pub struct S3PolicyStore {
    pub(crate) client: S3Client,
}

impl S3PolicyStore {
    /// New construct
    pub const fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Build a client from the standard credential provider chain.
    ///
    /// `region` and `profile` override what the chain would resolve.
    pub async fn from_env(region: Option<String>, profile: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;

        Self::new(S3Client::new(&config))
    }
}

fn is_no_such_bucket_policy<E: ProvideErrorMetadata>(err: &E) -> bool {
    err.code() == Some(NO_SUCH_BUCKET_POLICY)
}

fn store_error(
    operation: &str,
    bucket: &str,
    err: impl std::error::Error,
) -> FaultInjectionError {
    FaultInjectionError::store_access(operation, bucket, DisplayErrorContext(err).to_string())
}

#[async_trait]
impl PolicyStore for S3PolicyStore {
    async fn get_policy(&self, bucket: &str) -> FaultInjectionResult<PolicyLookup> {
        debug!("GetBucketPolicy bucket={}", bucket);
        let out = match self.client.get_bucket_policy().bucket(bucket).send().await {
            Ok(out) => out,
            Err(e) if e.as_service_error().is_some_and(is_no_such_bucket_policy) => {
                debug!("Bucket '{}' has no policy", bucket);
                return Ok(PolicyLookup::NotFound);
            }
            Err(e) => return Err(store_error("GetBucketPolicy", bucket, e)),
        };

        let Some(raw) = out.policy() else {
            return Ok(PolicyLookup::NotFound);
        };

        let doc = PolicyDocument::from_json(raw)
            .map_err(|e| FaultInjectionError::policy_format(bucket, e))?;
        Ok(PolicyLookup::Found(doc))
    }

    async fn put_policy(&self, bucket: &str, policy: &PolicyDocument) -> FaultInjectionResult<()> {
        let body = policy
            .to_json()
            .map_err(|e| FaultInjectionError::policy_format(bucket, e))?;
        debug!(
            "PutBucketPolicy bucket={} statements={}",
            bucket,
            policy.statements.len()
        );

        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(body)
            .send()
            .await
            .map_err(|e| store_error("PutBucketPolicy", bucket, e))?;
        Ok(())
    }

    async fn delete_policy(&self, bucket: &str) -> FaultInjectionResult<()> {
        debug!("DeleteBucketPolicy bucket={}", bucket);
        self.client
            .delete_bucket_policy()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| store_error("DeleteBucketPolicy", bucket, e))?;
        Ok(())
    }
}
