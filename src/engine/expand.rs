//! Dependency expansion: parents imply dependents
//!
//! Some resource types cannot be deleted while sub-resources exist: a hosted
//! zone holds records, a file system has mount targets, IAM principals carry
//! policy attachments. For those types the expander performs per-parent
//! lookups and emits the dependents as separate sets, strictly ahead of the
//! parent set. Dependents inherit the parent's match decision; they have no
//! filter rules of their own.

use super::catalog::{Dependents, ResourceDescriptor};
use super::resource_set::ResourceSet;
use crate::cloud::ResourceListing;
use crate::config::FilterConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

pub struct DependencyExpander {
    listing: Arc<dyn ResourceListing>,
    filter: Arc<FilterConfig>,
}

impl DependencyExpander {
    pub fn new(listing: Arc<dyn ResourceListing>, filter: Arc<FilterConfig>) -> Self {
        Self { listing, filter }
    }

    /// Turn a matched parent set into the ordered list of sets to destroy:
    /// dependent sets first, the parent set itself last.
    ///
    /// A lookup failure for one parent skips that parent's dependents only;
    /// sibling parents and dependents already discovered stay in the run.
    pub async fn expand(
        &self,
        descriptor: &ResourceDescriptor,
        parent: ResourceSet,
    ) -> Vec<ResourceSet> {
        let mut sets = match descriptor.dependents {
            None => Vec::new(),
            Some(Dependents::ZoneRecords) => self.zone_records(&parent).await,
            Some(Dependents::MountTargets) => self.mount_targets(&parent).await,
            Some(Dependents::UserPolicies) => self.user_policies(&parent).await,
            Some(Dependents::RolePolicies) => self.role_policies(&parent).await,
            Some(Dependents::PolicyAttachments) => self.policy_attachments(&parent).await,
        };
        sets.push(parent);
        sets
    }

    /// Zone records, with each record value re-checked against the zone
    /// type's own rule. An id-pattern zone rule therefore also narrows which
    /// record values get swept; a match-all rule takes every record.
    async fn zone_records(&self, parent: &ResourceSet) -> Vec<ResourceSet> {
        let mut records = ResourceSet::new("aws_route53_record");
        let no_tags = HashMap::new();

        for zone_id in parent.live_ids() {
            let zone_records = match self.listing.zone_records(&zone_id).await {
                Ok(zone_records) => zone_records,
                Err(e) => {
                    warn!(zone_id = %zone_id, error = ?e, "Record lookup failed");
                    continue;
                }
            };
            for record in zone_records {
                if !self
                    .filter
                    .matches(&parent.resource_type, &record.value, &no_tags)
                {
                    continue;
                }
                let mut attrs = HashMap::new();
                attrs.insert("zone_id".to_string(), zone_id.clone());
                attrs.insert("name".to_string(), record.name);
                attrs.insert("record_type".to_string(), record.record_type);
                if let Some(ttl) = record.ttl {
                    attrs.insert("ttl".to_string(), ttl.to_string());
                }
                records.push(Some(record.value), attrs, HashMap::new());
            }
        }

        vec![records]
    }

    async fn mount_targets(&self, parent: &ResourceSet) -> Vec<ResourceSet> {
        let mut targets = ResourceSet::new("aws_efs_mount_target");

        for file_system_id in parent.live_ids() {
            match self.listing.mount_targets(&file_system_id).await {
                Ok(ids) => {
                    for id in ids {
                        targets.push(Some(id), HashMap::new(), HashMap::new());
                    }
                }
                Err(e) => {
                    warn!(
                        file_system_id = %file_system_id,
                        error = ?e,
                        "Mount target lookup failed"
                    );
                }
            }
        }

        vec![targets]
    }

    async fn user_policies(&self, parent: &ResourceSet) -> Vec<ResourceSet> {
        let mut attachments = ResourceSet::new("aws_iam_user_policy_attachment");

        for user_name in parent.live_ids() {
            match self.listing.attached_user_policies(&user_name).await {
                Ok(arns) => {
                    for arn in arns {
                        let mut attrs = HashMap::new();
                        attrs.insert("user".to_string(), user_name.clone());
                        attrs.insert("policy_arn".to_string(), arn.clone());
                        attachments.push(Some(arn), attrs, HashMap::new());
                    }
                }
                Err(e) => {
                    warn!(user = %user_name, error = ?e, "Attached policy lookup failed");
                }
            }
        }

        vec![attachments]
    }

    /// Roles yield two dependent sets: managed-policy attachments, then
    /// inline policies addressed as `role:policy`.
    async fn role_policies(&self, parent: &ResourceSet) -> Vec<ResourceSet> {
        let mut attachments = ResourceSet::new("aws_iam_role_policy_attachment");
        let mut inline = ResourceSet::new("aws_iam_role_policy");

        for role_name in parent.live_ids() {
            match self.listing.attached_role_policies(&role_name).await {
                Ok(arns) => {
                    for arn in arns {
                        let mut attrs = HashMap::new();
                        attrs.insert("role".to_string(), role_name.clone());
                        attrs.insert("policy_arn".to_string(), arn.clone());
                        attachments.push(Some(arn), attrs, HashMap::new());
                    }
                }
                Err(e) => {
                    warn!(role = %role_name, error = ?e, "Attached policy lookup failed");
                }
            }

            match self.listing.inline_role_policies(&role_name).await {
                Ok(names) => {
                    for name in names {
                        inline.push(
                            Some(format!("{role_name}:{name}")),
                            HashMap::new(),
                            HashMap::new(),
                        );
                    }
                }
                Err(e) => {
                    warn!(role = %role_name, error = ?e, "Inline policy lookup failed");
                }
            }
        }

        vec![attachments, inline]
    }

    async fn policy_attachments(&self, parent: &ResourceSet) -> Vec<ResourceSet> {
        let mut attachments = ResourceSet::new("aws_iam_policy_attachment");

        for policy_arn in parent.live_ids() {
            let entities = match self.listing.policy_entities(&policy_arn).await {
                Ok(entities) => entities,
                Err(e) => {
                    warn!(policy_arn = %policy_arn, error = ?e, "Entity lookup failed");
                    continue;
                }
            };
            let mut attrs = HashMap::new();
            attrs.insert("policy_arn".to_string(), policy_arn.clone());
            attrs.insert("name".to_string(), entities.policy_name);
            attrs.insert("users".to_string(), entities.users.join("."));
            attrs.insert("roles".to_string(), entities.roles.join("."));
            attrs.insert("groups".to_string(), entities.groups.join("."));
            attachments.push(Some(policy_arn), attrs, HashMap::new());
        }

        vec![attachments]
    }
}
