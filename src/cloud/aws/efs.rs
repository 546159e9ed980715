//! EFS file systems and mount targets

use crate::cloud::RawResource;
use anyhow::{bail, Result};
use aws_sdk_efs::Client;

use super::tags::efs_tags;

pub(crate) async fn list_file_systems(efs: &Client) -> Result<Vec<RawResource>> {
    let response = efs.describe_file_systems().send().await?;
    Ok(response
        .file_systems()
        .iter()
        .map(|fs| RawResource {
            id: Some(fs.file_system_id().to_string()),
            tags: efs_tags(fs.tags()),
            attrs: Default::default(),
        })
        .collect())
}

pub(crate) async fn mount_targets(efs: &Client, file_system_id: &str) -> Result<Vec<String>> {
    let response = efs
        .describe_mount_targets()
        .file_system_id(file_system_id)
        .send()
        .await?;
    Ok(response
        .mount_targets()
        .iter()
        .map(|mt| mt.mount_target_id().to_string())
        .collect())
}

pub(crate) async fn destroy(efs: &Client, resource_type: &str, id: &str) -> Result<()> {
    match resource_type {
        "aws_efs_file_system" => {
            efs.delete_file_system().file_system_id(id).send().await?;
        }
        "aws_efs_mount_target" => {
            efs.delete_mount_target().mount_target_id(id).send().await?;
        }
        other => bail!("Unsupported EFS resource type {other}"),
    }
    Ok(())
}
