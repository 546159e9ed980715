//! Auto Scaling groups and launch configurations
//!
//! Groups delete with force so in-flight instances do not block the sweep;
//! the instance pass has already terminated anything the filter matched
//! directly.

use crate::cloud::RawResource;
use anyhow::{bail, Result};
use aws_sdk_autoscaling::Client;
use std::collections::HashMap;

use super::tags::autoscaling_tags;

pub(crate) async fn list(autoscaling: &Client, resource_type: &str) -> Result<Vec<RawResource>> {
    match resource_type {
        "aws_autoscaling_group" => {
            let response = autoscaling.describe_auto_scaling_groups().send().await?;
            Ok(response
                .auto_scaling_groups()
                .iter()
                .map(|group| RawResource {
                    id: Some(group.auto_scaling_group_name().to_string()),
                    tags: autoscaling_tags(group.tags()),
                    attrs: HashMap::new(),
                })
                .collect())
        }
        "aws_launch_configuration" => {
            let response = autoscaling.describe_launch_configurations().send().await?;
            Ok(response
                .launch_configurations()
                .iter()
                .map(|lc| RawResource::new(lc.launch_configuration_name()))
                .collect())
        }
        other => bail!("Unsupported Auto Scaling resource type {other}"),
    }
}

pub(crate) async fn destroy(autoscaling: &Client, resource_type: &str, id: &str) -> Result<()> {
    match resource_type {
        "aws_autoscaling_group" => {
            autoscaling
                .delete_auto_scaling_group()
                .auto_scaling_group_name(id)
                .force_delete(true)
                .send()
                .await?;
        }
        "aws_launch_configuration" => {
            autoscaling
                .delete_launch_configuration()
                .launch_configuration_name(id)
                .send()
                .await?;
        }
        other => bail!("Unsupported Auto Scaling resource type {other}"),
    }
    Ok(())
}
