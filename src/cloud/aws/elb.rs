//! Classic load balancers
//!
//! The describe response carries no tags, so ELBs match on name patterns
//! only.

use crate::cloud::RawResource;
use anyhow::Result;
use aws_sdk_elasticloadbalancing::Client;
use std::collections::HashMap;

pub(crate) async fn list_load_balancers(elb: &Client) -> Result<Vec<RawResource>> {
    let response = elb.describe_load_balancers().send().await?;
    Ok(response
        .load_balancer_descriptions()
        .iter()
        .map(|lb| RawResource {
            id: lb.load_balancer_name().map(str::to_string),
            tags: HashMap::new(),
            attrs: HashMap::new(),
        })
        .collect())
}

pub(crate) async fn destroy(elb: &Client, id: &str) -> Result<()> {
    elb.delete_load_balancer()
        .load_balancer_name(id)
        .send()
        .await?;
    Ok(())
}
