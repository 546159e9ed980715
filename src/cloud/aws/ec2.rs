//! EC2-family listing, refresh and destroy
//!
//! Covers the networking constructs, instances, and EBS/AMI storage types.
//! Listing normalizes each describe response into `RawResource` records;
//! destroy issues the direct per-type delete call and leaves ordering to the
//! catalog.

use crate::cloud::RawResource;
use anyhow::{bail, Result};
use aws_sdk_ec2::types::InstanceStateName;
use aws_sdk_ec2::Client;
use std::collections::HashMap;

use super::tags::ec2_tags;

fn normalize<T>(
    items: &[T],
    id: impl Fn(&T) -> Option<&str>,
    tags: impl Fn(&T) -> &[aws_sdk_ec2::types::Tag],
) -> Vec<RawResource> {
    items
        .iter()
        .map(|item| RawResource {
            id: id(item).map(str::to_string),
            tags: ec2_tags(tags(item)),
            attrs: HashMap::new(),
        })
        .collect()
}

pub(crate) async fn list(ec2: &Client, resource_type: &str) -> Result<Vec<RawResource>> {
    match resource_type {
        "aws_instance" => list_instances(ec2).await,
        "aws_internet_gateway" => {
            let response = ec2.describe_internet_gateways().send().await?;
            Ok(normalize(
                response.internet_gateways(),
                |g| g.internet_gateway_id(),
                |g| g.tags(),
            ))
        }
        "aws_eip" => {
            let response = ec2.describe_addresses().send().await?;
            Ok(normalize(
                response.addresses(),
                |a| a.allocation_id(),
                |a| a.tags(),
            ))
        }
        "aws_vpc_endpoint" => {
            let response = ec2.describe_vpc_endpoints().send().await?;
            Ok(normalize(
                response.vpc_endpoints(),
                |e| e.vpc_endpoint_id(),
                |e| e.tags(),
            ))
        }
        "aws_nat_gateway" => {
            let response = ec2.describe_nat_gateways().send().await?;
            Ok(normalize(
                response.nat_gateways(),
                |n| n.nat_gateway_id(),
                |n| n.tags(),
            ))
        }
        "aws_network_interface" => {
            let response = ec2.describe_network_interfaces().send().await?;
            Ok(normalize(
                response.network_interfaces(),
                |n| n.network_interface_id(),
                |n| n.tag_set(),
            ))
        }
        "aws_route_table" => {
            let response = ec2.describe_route_tables().send().await?;
            Ok(normalize(
                response.route_tables(),
                |r| r.route_table_id(),
                |r| r.tags(),
            ))
        }
        "aws_security_group" => {
            let response = ec2.describe_security_groups().send().await?;
            Ok(normalize(
                response.security_groups(),
                |g| g.group_id(),
                |g| g.tags(),
            ))
        }
        "aws_network_acl" => {
            let response = ec2.describe_network_acls().send().await?;
            Ok(normalize(
                response.network_acls(),
                |n| n.network_acl_id(),
                |n| n.tags(),
            ))
        }
        "aws_subnet" => {
            let response = ec2.describe_subnets().send().await?;
            Ok(normalize(
                response.subnets(),
                |s| s.subnet_id(),
                |s| s.tags(),
            ))
        }
        "aws_vpc" => {
            let response = ec2.describe_vpcs().send().await?;
            Ok(normalize(response.vpcs(), |v| v.vpc_id(), |v| v.tags()))
        }
        "aws_ebs_snapshot" => {
            let response = ec2.describe_snapshots().owner_ids("self").send().await?;
            Ok(normalize(
                response.snapshots(),
                |s| s.snapshot_id(),
                |s| s.tags(),
            ))
        }
        "aws_ebs_volume" => {
            let response = ec2.describe_volumes().send().await?;
            Ok(normalize(
                response.volumes(),
                |v| v.volume_id(),
                |v| v.tags(),
            ))
        }
        "aws_ami" => {
            let response = ec2.describe_images().owners("self").send().await?;
            Ok(normalize(
                response.images(),
                |i| i.image_id(),
                |i| i.tags(),
            ))
        }
        other => bail!("Unsupported EC2 resource type {other}"),
    }
}

/// Instances, excluding terminated ones (they linger in describe output for
/// a while after termination).
async fn list_instances(ec2: &Client) -> Result<Vec<RawResource>> {
    let response = ec2.describe_instances().send().await?;

    let mut resources = Vec::new();
    for reservation in response.reservations() {
        for instance in reservation.instances() {
            let state = instance.state().and_then(|s| s.name());
            if matches!(state, Some(InstanceStateName::Terminated)) {
                continue;
            }
            resources.push(RawResource {
                id: instance.instance_id().map(str::to_string),
                tags: ec2_tags(instance.tags()),
                attrs: HashMap::new(),
            });
        }
    }
    Ok(resources)
}

/// Probe live state for the types where a single describe-by-id is cheap.
/// A missing resource surfaces as an error; the pipeline falls back to its
/// locally known attributes and the destroy path handles "already gone".
pub(crate) async fn refresh(
    ec2: &Client,
    resource_type: &str,
    id: &str,
    attrs: &HashMap<String, String>,
) -> Result<HashMap<String, String>> {
    match resource_type {
        "aws_instance" => {
            ec2.describe_instances().instance_ids(id).send().await?;
        }
        "aws_vpc" => {
            ec2.describe_vpcs().vpc_ids(id).send().await?;
        }
        "aws_security_group" => {
            ec2.describe_security_groups().group_ids(id).send().await?;
        }
        "aws_ebs_volume" => {
            ec2.describe_volumes().volume_ids(id).send().await?;
        }
        _ => {}
    }
    Ok(attrs.clone())
}

pub(crate) async fn destroy(ec2: &Client, resource_type: &str, id: &str) -> Result<()> {
    match resource_type {
        "aws_instance" => {
            ec2.terminate_instances().instance_ids(id).send().await?;
        }
        "aws_internet_gateway" => {
            ec2.delete_internet_gateway()
                .internet_gateway_id(id)
                .send()
                .await?;
        }
        "aws_eip" => {
            ec2.release_address().allocation_id(id).send().await?;
        }
        "aws_vpc_endpoint" => {
            ec2.delete_vpc_endpoints().vpc_endpoint_ids(id).send().await?;
        }
        "aws_nat_gateway" => {
            ec2.delete_nat_gateway().nat_gateway_id(id).send().await?;
        }
        "aws_network_interface" => {
            ec2.delete_network_interface()
                .network_interface_id(id)
                .send()
                .await?;
        }
        "aws_route_table" => {
            ec2.delete_route_table().route_table_id(id).send().await?;
        }
        "aws_security_group" => {
            ec2.delete_security_group().group_id(id).send().await?;
        }
        "aws_network_acl" => {
            ec2.delete_network_acl().network_acl_id(id).send().await?;
        }
        "aws_subnet" => {
            ec2.delete_subnet().subnet_id(id).send().await?;
        }
        "aws_vpc" => {
            ec2.delete_vpc().vpc_id(id).send().await?;
        }
        "aws_ebs_snapshot" => {
            ec2.delete_snapshot().snapshot_id(id).send().await?;
        }
        "aws_ebs_volume" => {
            ec2.delete_volume().volume_id(id).send().await?;
        }
        "aws_ami" => {
            ec2.deregister_image().image_id(id).send().await?;
        }
        other => bail!("Unsupported EC2 resource type {other}"),
    }
    Ok(())
}
