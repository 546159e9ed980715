//! The sweep engine: catalog-ordered inventory, expansion and destruction

pub mod catalog;
pub mod collector;
pub mod expand;
pub mod manifest;
pub mod pipeline;
pub mod resource_set;

pub use manifest::Manifest;
pub use pipeline::{DestructionPipeline, WipeReport, DEFAULT_CONCURRENCY};
pub use resource_set::ResourceSet;

use crate::cloud::{ResourceLifecycle, ResourceListing};
use crate::config::FilterConfig;
use anyhow::Result;
use collector::InventoryCollector;
use expand::DependencyExpander;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Sweep behavior knobs.
#[derive(Debug, Clone, Copy)]
pub struct SweepOptions {
    /// Inventory and match only; never call destroy.
    pub dry_run: bool,
    /// Worker count per resource set.
    pub concurrency: usize,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Aggregate outcome of a full sweep.
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepReport {
    /// Resource sets that contained at least one concrete id.
    pub sets: usize,
    pub matched: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SweepReport {
    fn absorb(&mut self, wipe: WipeReport) {
        if wipe.matched > 0 {
            self.sets += 1;
        }
        self.matched += wipe.matched;
        self.deleted += wipe.deleted;
        self.skipped += wipe.skipped;
        self.failed += wipe.failed;
    }
}

/// Walks the catalog strictly in deletion order: collect each type's
/// matching resources, expand dependents, and feed every emitted set to the
/// destruction pipeline, one set at a time.
pub struct Sweeper {
    collector: InventoryCollector,
    expander: DependencyExpander,
    pipeline: DestructionPipeline,
    manifest: Arc<Mutex<Manifest>>,
}

impl Sweeper {
    pub fn new(
        listing: Arc<dyn ResourceListing>,
        lifecycle: Arc<dyn ResourceLifecycle>,
        filter: FilterConfig,
        options: SweepOptions,
    ) -> Self {
        let filter = Arc::new(filter);
        let manifest = Arc::new(Mutex::new(Manifest::default()));
        Self {
            collector: InventoryCollector::new(Arc::clone(&listing), Arc::clone(&filter)),
            expander: DependencyExpander::new(listing, filter),
            pipeline: DestructionPipeline::new(
                lifecycle,
                Arc::clone(&manifest),
                options.dry_run,
                options.concurrency,
            ),
            manifest,
        }
    }

    /// Run the full sweep. Only configuration problems abort a run, and
    /// those are caught before a `Sweeper` exists; everything here is
    /// contained per type or per resource, so this always completes.
    pub async fn run(&self) -> SweepReport {
        let mut report = SweepReport::default();

        for descriptor in catalog::CATALOG {
            let parent = self.collector.collect(descriptor).await;
            if parent.is_empty() {
                continue;
            }
            // Dependent sets come back ahead of the parent; each destroy
            // call joins its workers, which serializes the sets.
            for set in self.expander.expand(descriptor, parent).await {
                report.absorb(self.pipeline.destroy(set).await);
            }
        }

        info!(
            sets = report.sets,
            matched = report.matched,
            deleted = report.deleted,
            skipped = report.skipped,
            failed = report.failed,
            "Sweep complete"
        );
        report
    }

    /// Serialized manifest of everything that matched so far.
    pub fn manifest_yaml(&self) -> Result<String> {
        self.manifest.lock().expect("manifest lock poisoned").to_yaml()
    }

    pub fn write_manifest(&self, path: &Path) -> Result<()> {
        self.manifest
            .lock()
            .expect("manifest lock poisoned")
            .write_to(path)
    }
}
