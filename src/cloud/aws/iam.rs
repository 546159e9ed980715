//! IAM listing, dependent lookups and destroy
//!
//! Top-level listings paginate with the marker loop; accounts accumulate
//! far more roles and policies than one page holds. Managed policies are
//! scoped to customer-managed only, since AWS-managed policies cannot be
//! deleted anyway.

use crate::cloud::{PolicyEntities, RawResource};
use anyhow::{bail, Context, Result};
use aws_sdk_iam::types::PolicyScopeType;
use aws_sdk_iam::Client;
use std::collections::HashMap;

pub(crate) async fn list(iam: &Client, resource_type: &str) -> Result<Vec<RawResource>> {
    match resource_type {
        "aws_iam_user" => list_users(iam).await,
        "aws_iam_role" => list_roles(iam).await,
        "aws_iam_policy" => list_policies(iam).await,
        "aws_iam_instance_profile" => list_instance_profiles(iam).await,
        other => bail!("Unsupported IAM resource type {other}"),
    }
}

async fn list_users(iam: &Client) -> Result<Vec<RawResource>> {
    let mut resources = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let mut request = iam.list_users();
        if let Some(m) = &marker {
            request = request.marker(m);
        }
        let response = request.send().await?;

        for user in response.users() {
            resources.push(RawResource::new(user.user_name()));
        }

        if response.is_truncated() {
            marker = response.marker().map(str::to_string);
        } else {
            break;
        }
    }
    Ok(resources)
}

async fn list_roles(iam: &Client) -> Result<Vec<RawResource>> {
    let mut resources = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let mut request = iam.list_roles();
        if let Some(m) = &marker {
            request = request.marker(m);
        }
        let response = request.send().await?;

        for role in response.roles() {
            resources.push(RawResource::new(role.role_name()));
        }

        if response.is_truncated() {
            marker = response.marker().map(str::to_string);
        } else {
            break;
        }
    }
    Ok(resources)
}

async fn list_policies(iam: &Client) -> Result<Vec<RawResource>> {
    let mut resources = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let mut request = iam.list_policies().scope(PolicyScopeType::Local);
        if let Some(m) = &marker {
            request = request.marker(m);
        }
        let response = request.send().await?;

        for policy in response.policies() {
            resources.push(RawResource {
                id: policy.arn().map(str::to_string),
                tags: HashMap::new(),
                attrs: HashMap::new(),
            });
        }

        if response.is_truncated() {
            marker = response.marker().map(str::to_string);
        } else {
            break;
        }
    }
    Ok(resources)
}

async fn list_instance_profiles(iam: &Client) -> Result<Vec<RawResource>> {
    let mut resources = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let mut request = iam.list_instance_profiles();
        if let Some(m) = &marker {
            request = request.marker(m);
        }
        let response = request.send().await?;

        for profile in response.instance_profiles() {
            resources.push(RawResource::new(profile.instance_profile_name()));
        }

        if response.is_truncated() {
            marker = response.marker().map(str::to_string);
        } else {
            break;
        }
    }
    Ok(resources)
}

pub(crate) async fn attached_user_policies(iam: &Client, user_name: &str) -> Result<Vec<String>> {
    let response = iam
        .list_attached_user_policies()
        .user_name(user_name)
        .send()
        .await?;
    Ok(response
        .attached_policies()
        .iter()
        .filter_map(|p| p.policy_arn().map(str::to_string))
        .collect())
}

pub(crate) async fn attached_role_policies(iam: &Client, role_name: &str) -> Result<Vec<String>> {
    let response = iam
        .list_attached_role_policies()
        .role_name(role_name)
        .send()
        .await?;
    Ok(response
        .attached_policies()
        .iter()
        .filter_map(|p| p.policy_arn().map(str::to_string))
        .collect())
}

pub(crate) async fn inline_role_policies(iam: &Client, role_name: &str) -> Result<Vec<String>> {
    let response = iam.list_role_policies().role_name(role_name).send().await?;
    Ok(response.policy_names().to_vec())
}

pub(crate) async fn policy_entities(iam: &Client, policy_arn: &str) -> Result<PolicyEntities> {
    let policy = iam.get_policy().policy_arn(policy_arn).send().await?;
    let policy_name = policy
        .policy()
        .and_then(|p| p.policy_name())
        .unwrap_or_default()
        .to_string();

    let response = iam
        .list_entities_for_policy()
        .policy_arn(policy_arn)
        .send()
        .await?;

    Ok(PolicyEntities {
        policy_name,
        users: response
            .policy_users()
            .iter()
            .filter_map(|u| u.user_name().map(str::to_string))
            .collect(),
        groups: response
            .policy_groups()
            .iter()
            .filter_map(|g| g.group_name().map(str::to_string))
            .collect(),
        roles: response
            .policy_roles()
            .iter()
            .filter_map(|r| r.role_name().map(str::to_string))
            .collect(),
    })
}

pub(crate) async fn destroy(
    iam: &Client,
    resource_type: &str,
    id: &str,
    attrs: &HashMap<String, String>,
) -> Result<()> {
    match resource_type {
        "aws_iam_user" => {
            iam.delete_user().user_name(id).send().await?;
        }
        "aws_iam_role" => {
            iam.delete_role().role_name(id).send().await?;
        }
        "aws_iam_policy" => {
            iam.delete_policy().policy_arn(id).send().await?;
        }
        "aws_iam_instance_profile" => {
            iam.delete_instance_profile()
                .instance_profile_name(id)
                .send()
                .await?;
        }
        "aws_iam_user_policy_attachment" => {
            let user = attrs.get("user").context("Missing user attribute")?;
            iam.detach_user_policy()
                .user_name(user)
                .policy_arn(id)
                .send()
                .await?;
        }
        "aws_iam_role_policy_attachment" => {
            let role = attrs.get("role").context("Missing role attribute")?;
            iam.detach_role_policy()
                .role_name(role)
                .policy_arn(id)
                .send()
                .await?;
        }
        "aws_iam_role_policy" => {
            // Inline policies are addressed as role:policy.
            let (role, policy) = id
                .split_once(':')
                .context("Inline policy id is not role:policy")?;
            iam.delete_role_policy()
                .role_name(role)
                .policy_name(policy)
                .send()
                .await?;
        }
        "aws_iam_policy_attachment" => {
            detach_everywhere(iam, id, attrs).await?;
        }
        other => bail!("Unsupported IAM resource type {other}"),
    }
    Ok(())
}

/// Detach a managed policy from every entity recorded at expansion time.
/// Entity lists arrive dot-joined in the attributes.
async fn detach_everywhere(
    iam: &Client,
    policy_arn: &str,
    attrs: &HashMap<String, String>,
) -> Result<()> {
    let names = |key: &str| -> Vec<String> {
        attrs
            .get(key)
            .map(|joined| {
                joined
                    .split('.')
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };

    for user in names("users") {
        iam.detach_user_policy()
            .user_name(user)
            .policy_arn(policy_arn)
            .send()
            .await?;
    }
    for role in names("roles") {
        iam.detach_role_policy()
            .role_name(role)
            .policy_arn(policy_arn)
            .send()
            .await?;
    }
    for group in names("groups") {
        iam.detach_group_policy()
            .group_name(group)
            .policy_arn(policy_arn)
            .send()
            .await?;
    }
    Ok(())
}
