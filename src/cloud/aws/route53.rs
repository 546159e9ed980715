//! Route 53 hosted zones and records

use crate::cloud::{RawResource, ZoneRecord};
use anyhow::{bail, Context, Result};
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use aws_sdk_route53::Client;
use std::collections::HashMap;

pub(crate) async fn list_zones(route53: &Client) -> Result<Vec<RawResource>> {
    let response = route53.list_hosted_zones().send().await?;
    Ok(response
        .hosted_zones()
        .iter()
        .map(|zone| RawResource::new(zone.id()).with_attr("name", zone.name()))
        .collect())
}

/// Flattened records of a zone, one entry per record value.
pub(crate) async fn zone_records(route53: &Client, zone_id: &str) -> Result<Vec<ZoneRecord>> {
    let response = route53
        .list_resource_record_sets()
        .hosted_zone_id(zone_id)
        .send()
        .await?;

    let mut records = Vec::new();
    for record_set in response.resource_record_sets() {
        for record in record_set.resource_records() {
            records.push(ZoneRecord {
                name: record_set.name().to_string(),
                record_type: record_set.r#type().as_str().to_string(),
                ttl: record_set.ttl(),
                value: record.value().to_string(),
            });
        }
    }
    Ok(records)
}

pub(crate) async fn destroy(
    route53: &Client,
    resource_type: &str,
    id: &str,
    attrs: &HashMap<String, String>,
) -> Result<()> {
    match resource_type {
        "aws_route53_zone" => {
            route53.delete_hosted_zone().id(id).send().await?;
        }
        "aws_route53_record" => {
            delete_record(route53, id, attrs).await?;
        }
        other => bail!("Unsupported Route 53 resource type {other}"),
    }
    Ok(())
}

/// Records delete through a change batch; the id is the record value, the
/// rest of the targeting context rides in the attributes set at expansion.
async fn delete_record(
    route53: &Client,
    value: &str,
    attrs: &HashMap<String, String>,
) -> Result<()> {
    let zone_id = attrs.get("zone_id").context("Missing zone_id attribute")?;
    let name = attrs.get("name").context("Missing name attribute")?;
    let record_type = attrs
        .get("record_type")
        .context("Missing record_type attribute")?;

    let mut record_set = ResourceRecordSet::builder()
        .name(name)
        .r#type(RrType::from(record_type.as_str()))
        .resource_records(ResourceRecord::builder().value(value).build()?);
    if let Some(ttl) = attrs.get("ttl").and_then(|t| t.parse::<i64>().ok()) {
        record_set = record_set.ttl(ttl);
    }

    let change_batch = ChangeBatch::builder()
        .changes(
            Change::builder()
                .action(ChangeAction::Delete)
                .resource_record_set(record_set.build()?)
                .build()?,
        )
        .build()?;

    route53
        .change_resource_record_sets()
        .hosted_zone_id(zone_id)
        .change_batch(change_batch)
        .send()
        .await?;
    Ok(())
}
