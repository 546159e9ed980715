//! AWS-backed collaborators
//!
//! `AwsCloud` loads SDK configuration once and holds one explicit client
//! handle per service. Both collaborator traits dispatch on the terraform
//! type name to the per-service modules.

mod ec2;
mod efs;
mod elb;
mod error;
mod iam;
mod route53;
mod scaling;
mod tags;

use super::{PolicyEntities, RawResource, ResourceLifecycle, ResourceListing, ZoneRecord};
use anyhow::{bail, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use std::collections::HashMap;

pub struct AwsCloud {
    ec2: aws_sdk_ec2::Client,
    iam: aws_sdk_iam::Client,
    route53: aws_sdk_route53::Client,
    efs: aws_sdk_efs::Client,
    autoscaling: aws_sdk_autoscaling::Client,
    elb: aws_sdk_elasticloadbalancing::Client,
}

impl AwsCloud {
    /// Load credentials and region from the usual chain (env, config files,
    /// instance metadata), with optional profile and region overrides.
    pub async fn new(profile: Option<&str>, region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;

        Self {
            ec2: aws_sdk_ec2::Client::new(&config),
            iam: aws_sdk_iam::Client::new(&config),
            route53: aws_sdk_route53::Client::new(&config),
            efs: aws_sdk_efs::Client::new(&config),
            autoscaling: aws_sdk_autoscaling::Client::new(&config),
            elb: aws_sdk_elasticloadbalancing::Client::new(&config),
        }
    }
}

#[async_trait]
impl ResourceListing for AwsCloud {
    async fn list(&self, resource_type: &str) -> Result<Vec<RawResource>> {
        match resource_type {
            "aws_autoscaling_group" | "aws_launch_configuration" => {
                scaling::list(&self.autoscaling, resource_type).await
            }
            "aws_elb" => elb::list_load_balancers(&self.elb).await,
            "aws_route53_zone" => route53::list_zones(&self.route53).await,
            "aws_efs_file_system" => efs::list_file_systems(&self.efs).await,
            t if t.starts_with("aws_iam_") => iam::list(&self.iam, resource_type).await,
            _ => ec2::list(&self.ec2, resource_type).await,
        }
    }

    async fn zone_records(&self, zone_id: &str) -> Result<Vec<ZoneRecord>> {
        route53::zone_records(&self.route53, zone_id).await
    }

    async fn mount_targets(&self, file_system_id: &str) -> Result<Vec<String>> {
        efs::mount_targets(&self.efs, file_system_id).await
    }

    async fn attached_user_policies(&self, user_name: &str) -> Result<Vec<String>> {
        iam::attached_user_policies(&self.iam, user_name).await
    }

    async fn attached_role_policies(&self, role_name: &str) -> Result<Vec<String>> {
        iam::attached_role_policies(&self.iam, role_name).await
    }

    async fn inline_role_policies(&self, role_name: &str) -> Result<Vec<String>> {
        iam::inline_role_policies(&self.iam, role_name).await
    }

    async fn policy_entities(&self, policy_arn: &str) -> Result<PolicyEntities> {
        iam::policy_entities(&self.iam, policy_arn).await
    }
}

#[async_trait]
impl ResourceLifecycle for AwsCloud {
    async fn refresh(
        &self,
        resource_type: &str,
        id: &str,
        attrs: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>> {
        // Only the EC2 family has a cheap describe-by-id probe; everything
        // else keeps its inventory-time attributes.
        if resource_type.starts_with("aws_iam_")
            || resource_type.starts_with("aws_route53_")
            || resource_type.starts_with("aws_efs_")
            || resource_type == "aws_elb"
            || resource_type.starts_with("aws_autoscaling")
            || resource_type == "aws_launch_configuration"
        {
            return Ok(attrs.clone());
        }
        ec2::refresh(&self.ec2, resource_type, id, attrs).await
    }

    async fn destroy(
        &self,
        resource_type: &str,
        id: &str,
        attrs: &HashMap<String, String>,
    ) -> Result<()> {
        let result = match resource_type {
            "aws_autoscaling_group" | "aws_launch_configuration" => {
                scaling::destroy(&self.autoscaling, resource_type, id).await
            }
            "aws_elb" => elb::destroy(&self.elb, id).await,
            "aws_route53_zone" | "aws_route53_record" => {
                route53::destroy(&self.route53, resource_type, id, attrs).await
            }
            "aws_efs_file_system" | "aws_efs_mount_target" => {
                efs::destroy(&self.efs, resource_type, id).await
            }
            t if t.starts_with("aws_iam_") => {
                iam::destroy(&self.iam, resource_type, id, attrs).await
            }
            t if t.starts_with("aws_") => ec2::destroy(&self.ec2, resource_type, id).await,
            other => bail!("Unsupported resource type {other}"),
        };
        error::ignore_not_found(result, resource_type, id)
    }
}
