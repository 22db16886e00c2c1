//! The injected deny statement and everything that recognizes it.
//!
//! All comparisons against the reserved sid happen here. Statements carrying any
//! other sid (or none) are [`StatementKind::Original`] and are never modified.

use crate::policy::{Effect, OneOrMany, PolicyDocument, Principal, Statement};
use derive_new::new;
use serde_json::Map;

/// Reserved sid that tags the injected statement.
pub const FAULT_STATEMENT_SID: &str = "FaultInjectionDeny";

/// Object read, object write and bucket listing.
pub const DENIED_ACTIONS: [&str; 3] = ["s3:GetObject", "s3:PutObject", "s3:ListBucket"];

/// ARN partition used unless configured otherwise.
pub const DEFAULT_PARTITION: &str = "aws";

/// Discriminates injected statements from everything else in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Pre-existing statement, owned by whoever wrote the policy
    Original,
    /// Statement added by fault injection
    FaultInjected,
}

/// Bucket and principal a fault is injected for.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct FaultTarget {
    /// Bucket name
    #[new(into)]
    pub bucket: String,
    /// Principal to deny, passed through to the policy as-is
    #[new(into)]
    pub denied_principal: String,
    /// ARN partition for the bucket resources
    #[new(value = "DEFAULT_PARTITION.to_string()")]
    pub partition: String,
}

impl FaultTarget {
    /// Use a non-default ARN partition (`aws-cn`, `aws-us-gov`, ...).
    #[must_use]
    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    /// `arn:<partition>:s3:::<bucket>`
    pub fn bucket_arn(&self) -> String {
        format!("arn:{}:s3:::{}", self.partition, self.bucket)
    }

    /// `arn:<partition>:s3:::<bucket>/*`
    pub fn objects_arn(&self) -> String {
        format!("{}/*", self.bucket_arn())
    }
}

/// Build the statement that denies the target principal access to the bucket.
pub fn build_deny_statement(target: &FaultTarget) -> Statement {
    Statement {
        sid: Some(FAULT_STATEMENT_SID.to_string()),
        effect: Effect::Deny,
        principal: Some(Principal::aws(target.denied_principal.clone())),
        action: Some(OneOrMany::Many(
            DENIED_ACTIONS.iter().map(ToString::to_string).collect(),
        )),
        resource: Some(OneOrMany::Many(vec![
            target.bucket_arn(),
            target.objects_arn(),
        ])),
        other: Map::new(),
    }
}

impl Statement {
    /// Classify by sid.
    pub fn kind(&self) -> StatementKind {
        if self.sid.as_deref() == Some(FAULT_STATEMENT_SID) {
            StatementKind::FaultInjected
        } else {
            StatementKind::Original
        }
    }
}

impl PolicyDocument {
    /// Whether the document currently carries an injected statement.
    pub fn has_fault_statement(&self) -> bool {
        self.statements
            .iter()
            .any(|s| s.kind() == StatementKind::FaultInjected)
    }

    /// Drop injected statements, keeping the order of the rest.
    ///
    /// Returns the number of statements removed.
    pub fn remove_fault_statements(&mut self) -> usize {
        let before = self.statements.len();
        self.statements.retain(|s| s.kind() == StatementKind::Original);
        before - self.statements.len()
    }

    /// Replace any injected statement with `statement`, appended last.
    ///
    /// Returns true if an earlier injected statement was replaced.
    pub fn apply_fault_statement(&mut self, statement: Statement) -> bool {
        let replaced = self.remove_fault_statements() > 0;
        self.statements.push(statement);
        replaced
    }
}
