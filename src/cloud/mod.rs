//! Collaborator boundary between the engine and the cloud provider
//!
//! The engine never talks to provider APIs directly. It is handed two
//! collaborators at construction time: a [`ResourceListing`] that enumerates
//! live resources (and the dependents of parents that have them), and a
//! [`ResourceLifecycle`] that refreshes and destroys individual resources.
//! The AWS-backed implementations live in [`aws`]; tests substitute
//! in-memory fakes.

pub mod aws;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// One live resource, normalized from whatever shape the provider returns.
#[derive(Debug, Clone, Default)]
pub struct RawResource {
    /// Unique identifier. Providers occasionally return records without one;
    /// such entries survive to the pipeline, which skips them.
    pub id: Option<String>,
    /// Resource tags, empty for untaggable types.
    pub tags: HashMap<String, String>,
    /// Provider-specific extra fields the destroy call may need
    /// (e.g. a zone's name).
    pub attrs: HashMap<String, String>,
}

impl RawResource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}

/// One record inside a hosted zone. Deleting a zone implies deleting these
/// first; `value` is what gets matched and recorded, the rest is targeting
/// context for the destroy call.
#[derive(Debug, Clone)]
pub struct ZoneRecord {
    pub name: String,
    pub record_type: String,
    pub ttl: Option<i64>,
    pub value: String,
}

/// Entities a managed IAM policy is attached to.
#[derive(Debug, Clone, Default)]
pub struct PolicyEntities {
    pub policy_name: String,
    pub users: Vec<String>,
    pub groups: Vec<String>,
    pub roles: Vec<String>,
}

/// Enumerates live resources per type, plus the dependent lookups the
/// expander needs for parents that imply sub-resources.
#[async_trait]
pub trait ResourceListing: Send + Sync {
    /// List every live resource of the given type, normalized. Must tolerate
    /// empty results.
    async fn list(&self, resource_type: &str) -> Result<Vec<RawResource>>;

    /// Records of a hosted zone.
    async fn zone_records(&self, zone_id: &str) -> Result<Vec<ZoneRecord>>;

    /// Mount target ids of a file system.
    async fn mount_targets(&self, file_system_id: &str) -> Result<Vec<String>>;

    /// ARNs of managed policies attached to a user.
    async fn attached_user_policies(&self, user_name: &str) -> Result<Vec<String>>;

    /// ARNs of managed policies attached to a role.
    async fn attached_role_policies(&self, role_name: &str) -> Result<Vec<String>>;

    /// Names of inline policies embedded in a role.
    async fn inline_role_policies(&self, role_name: &str) -> Result<Vec<String>>;

    /// Users, groups and roles a managed policy is attached to.
    async fn policy_entities(&self, policy_arn: &str) -> Result<PolicyEntities>;
}

/// Refreshes and destroys individual resources.
#[async_trait]
pub trait ResourceLifecycle: Send + Sync {
    /// Reconcile locally known attributes with live state. Callers fall back
    /// to their local attributes when this fails, so implementations may
    /// error freely on missing resources.
    async fn refresh(
        &self,
        resource_type: &str,
        id: &str,
        attrs: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>>;

    /// Destroy one resource. Only ever called outside dry-run.
    async fn destroy(
        &self,
        resource_type: &str,
        id: &str,
        attrs: &HashMap<String, String>,
    ) -> Result<()>;
}
