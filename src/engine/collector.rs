//! Per-type inventory: list live resources and apply the filter

use super::catalog::ResourceDescriptor;
use super::resource_set::ResourceSet;
use crate::cloud::ResourceListing;
use crate::config::FilterConfig;
use std::sync::Arc;
use tracing::{debug, warn};

/// Walks one resource type's live inventory through the filter predicate.
pub struct InventoryCollector {
    listing: Arc<dyn ResourceListing>,
    filter: Arc<FilterConfig>,
}

impl InventoryCollector {
    pub fn new(listing: Arc<dyn ResourceListing>, filter: Arc<FilterConfig>) -> Self {
        Self { listing, filter }
    }

    /// Collect the matching resources of one type, preserving source order.
    ///
    /// A listing failure is contained here: the type contributes zero
    /// candidates and the run continues.
    pub async fn collect(&self, descriptor: &ResourceDescriptor) -> ResourceSet {
        let resource_type = descriptor.terraform_type;
        let mut set = ResourceSet::new(resource_type);

        let resources = match self.listing.list(resource_type).await {
            Ok(resources) => resources,
            Err(e) => {
                warn!(
                    resource_type = %resource_type,
                    error = ?e,
                    "Listing failed, type contributes no resources"
                );
                return set;
            }
        };

        for resource in resources {
            let matched = match &resource.id {
                Some(id) => self.filter.matches(resource_type, id, &resource.tags),
                // No id to match against; never in scope.
                None => false,
            };
            if matched {
                set.push(resource.id, resource.attrs, resource.tags);
            }
        }

        debug!(
            resource_type = %resource_type,
            matched = set.live_ids().len(),
            "Collected inventory"
        );
        set
    }
}
