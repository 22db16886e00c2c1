//! This crate provides the core business logic for S3 policy fault injection:
//! - Bucket policy document model
//! - The reserved `FaultInjectionDeny` statement and its discrimination
//! - Policy store (AWS S3) and backup store (filesystem) abstractions
//! - Inject / restore orchestration
//!

pub mod aws;
pub mod backup;
pub mod commands;
mod error;
mod fault;
#[cfg(any(test, feature = "integ-test"))]
pub mod memory;
mod policy;

// Re-exports for a small, focused public API
pub use aws::s3::S3PolicyStore;
pub use aws::{PolicyLookup, PolicyStore};
pub use backup::{BackupStore, FileBackupStore};
pub use commands::{FaultInjectionService, InjectOutcome, RestoreOutcome};
pub use error::{FaultInjectionError, FaultInjectionResult};
pub use fault::{
    build_deny_statement, FaultTarget, StatementKind, DEFAULT_PARTITION, DENIED_ACTIONS,
    FAULT_STATEMENT_SID,
};
pub use policy::{Effect, OneOrMany, PolicyDocument, Principal, Statement, DEFAULT_POLICY_VERSION};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsing_sample_bucket_policy() {
        let raw = r#"{
            "Version": "2012-10-17",
            "Statement": [{
                "Sid": "AllowLambdaRead",
                "Effect": "Allow",
                "Principal": {"AWS": "arn:aws:iam::123456789012:role/reader"},
                "Action": "s3:GetObject",
                "Resource": "arn:aws:s3:::my-bucket/*"
            }]
        }"#;
        let doc = PolicyDocument::from_json(raw).expect("should parse");
        assert_eq!(doc.version.as_deref(), Some("2012-10-17"));
        assert_eq!(doc.statements.len(), 1);
        assert_eq!(doc.statements[0].effect, Effect::Allow);
        assert_eq!(doc.statements[0].kind(), StatementKind::Original);
    }

    #[test]
    fn test_fault_statement_for_cn_partition() {
        let target = FaultTarget::new("my-bucket", "arn:aws-cn:iam::680431765560:role/fn")
            .with_partition("aws-cn");
        let stmt = build_deny_statement(&target);
        assert_eq!(stmt.kind(), StatementKind::FaultInjected);
        assert_eq!(
            stmt.resource,
            Some(OneOrMany::Many(vec![
                "arn:aws-cn:s3:::my-bucket".to_string(),
                "arn:aws-cn:s3:::my-bucket/*".to_string(),
            ]))
        );
    }
}
