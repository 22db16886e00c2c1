//! Bucket policy document model.
//!
//! Only the keys this crate reasons about are typed. Everything else on a
//! statement (`Condition`, `NotAction`, `NotPrincipal`, ...) is carried through
//! untouched so that restoring a policy never rewrites unrelated statements.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Policy language version used when a bucket has no policy yet.
pub const DEFAULT_POLICY_VERSION: &str = "2012-10-17";

/// Statement effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Allow
    Allow,
    /// Deny
    Deny,
}

/// A policy field that may be written as a single string or as a list.
///
/// The original shape is kept so a parsed policy serializes back the way it was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// `"s3:GetObject"`
    One(String),
    /// `["s3:GetObject", "s3:PutObject"]`
    Many(Vec<String>),
}

impl OneOrMany {
    /// Iterate over the contained values regardless of shape.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values = match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values.as_slice(),
        };
        values.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

/// Who a statement applies to.
///
/// Mapped principals keep their key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Principal {
    /// `"*"`
    Wildcard(String),
    /// `{"AWS": "arn:aws:iam::123456789012:role/name"}`, `{"Service": [...]}`, ...
    Mapped(Map<String, Value>),
}

impl Principal {
    /// An IAM principal (`{"AWS": <arn>}`).
    pub fn aws(arn: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("AWS".to_string(), Value::String(arn.into()));
        Self::Mapped(map)
    }
}

/// One access-control rule within a bucket policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    /// Statement identifier, unique within a document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    /// Allow or Deny
    pub effect: Effect,
    /// Principal the rule applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    /// Actions covered by the rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<OneOrMany>,
    /// Resources covered by the rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<OneOrMany>,
    /// Any other statement keys, preserved verbatim
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A bucket policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Policy language version tag; absent means the store's implicit default
    #[serde(rename = "Version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Optional policy identifier
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Ordered statements
    #[serde(
        rename = "Statement",
        default,
        deserialize_with = "statements_from_one_or_many"
    )]
    pub statements: Vec<Statement>,
}

fn statements_from_one_or_many<'de, D>(deserializer: D) -> Result<Vec<Statement>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Statements {
        Many(Vec<Statement>),
        One(Box<Statement>),
    }

    Ok(match Statements::deserialize(deserializer)? {
        Statements::Many(statements) => statements,
        Statements::One(statement) => vec![*statement],
    })
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self {
            version: Some(DEFAULT_POLICY_VERSION.to_string()),
            id: None,
            statements: Vec::new(),
        }
    }
}

impl PolicyDocument {
    /// Parse a policy document from its JSON text.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Compact JSON, as sent to the policy store.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Pretty-printed JSON, as written to backup files.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// A document without statements stands for "no policy" in the store.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_statement_keys_survive_round_trip() {
        let raw = json!({
            "Version": "2012-10-17",
            "Id": "BucketPolicy",
            "Statement": [{
                "Sid": "DenyInsecureTransport",
                "Effect": "Deny",
                "Principal": "*",
                "NotAction": "s3:ListBucket",
                "Resource": ["arn:aws:s3:::b1", "arn:aws:s3:::b1/*"],
                "Condition": {"Bool": {"aws:SecureTransport": "false"}}
            }]
        });

        let doc: PolicyDocument = serde_json::from_value(raw.clone()).expect("should parse");
        let stmt = &doc.statements[0];
        assert_eq!(stmt.principal, Some(Principal::Wildcard("*".to_string())));
        assert!(stmt.action.is_none());
        assert!(stmt.other.contains_key("Condition"));
        assert!(stmt.other.contains_key("NotAction"));

        let back = serde_json::to_value(&doc).expect("should serialize");
        assert_eq!(back, raw);
    }

    #[test]
    fn test_single_string_action_keeps_its_shape() {
        let raw = r#"{"Version":"2012-10-17","Statement":[{"Sid":"A","Effect":"Allow","Principal":{"AWS":"arn:aws:iam::123:role/r"},"Action":"s3:GetObject","Resource":"arn:aws:s3:::b1/*"}]}"#;
        let doc = PolicyDocument::from_json(raw).expect("should parse");
        assert_eq!(
            doc.statements[0].action,
            Some(OneOrMany::One("s3:GetObject".to_string()))
        );
        assert_eq!(doc.to_json().expect("should serialize"), raw);
    }

    #[test]
    fn test_single_statement_object_is_accepted() {
        let raw = r#"{"Version":"2012-10-17","Statement":{"Sid":"A","Effect":"Allow","Principal":"*","Action":"s3:GetObject","Resource":"arn:aws:s3:::b1/*"}}"#;
        let doc = PolicyDocument::from_json(raw).expect("should parse");
        assert_eq!(doc.statements.len(), 1);
        assert_eq!(doc.statements[0].sid.as_deref(), Some("A"));
    }

    #[test]
    fn test_missing_version_stays_missing() {
        let raw = r#"{"Statement":[{"Sid":"A","Effect":"Allow","Principal":"*","Action":"s3:GetObject","Resource":"arn:aws:s3:::b1/${aws:username}/*"}]}"#;
        let doc = PolicyDocument::from_json(raw).expect("should parse");
        assert_eq!(doc.version, None);
        assert_eq!(doc.to_json().expect("should serialize"), raw);
    }

    #[test]
    fn test_default_document_is_versioned_and_empty() {
        let doc = PolicyDocument::default();
        assert_eq!(doc.version.as_deref(), Some(DEFAULT_POLICY_VERSION));
        assert!(doc.is_empty());
        assert_eq!(
            doc.to_json().expect("should serialize"),
            r#"{"Version":"2012-10-17","Statement":[]}"#
        );
        assert!(PolicyDocument::from_json("{}").expect("should parse").is_empty());
    }

    #[test]
    fn test_principal_key_order_is_preserved() {
        let raw = r#"{"Service":"lambda.amazonaws.com","AWS":"arn:aws:iam::1:role/a"}"#;
        let principal: Principal = serde_json::from_str(raw).expect("should parse");
        assert_eq!(serde_json::to_string(&principal).expect("should serialize"), raw);
    }

    #[test]
    fn test_principal_list_of_arns() {
        let raw = json!({"AWS": ["arn:aws:iam::1:role/a", "arn:aws:iam::1:role/b"]});
        let principal: Principal = serde_json::from_value(raw).expect("should parse");
        let Principal::Mapped(map) = principal else {
            panic!("expected mapped principal");
        };
        assert_eq!(
            map["AWS"],
            json!(["arn:aws:iam::1:role/a", "arn:aws:iam::1:role/b"])
        );
    }
}
