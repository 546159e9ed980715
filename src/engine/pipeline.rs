//! Bounded-concurrency destruction of one resource set
//!
//! Exactly `concurrency` workers drain a single queue of the same capacity,
//! which caps simultaneous in-flight provider calls. The destroy call for a
//! set returns only after every dispatched resource finished, which is the
//! barrier that keeps dependent sets strictly ahead of their parents.

use super::manifest::Manifest;
use super::resource_set::ResourceSet;
use crate::cloud::ResourceLifecycle;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const DEFAULT_CONCURRENCY: usize = 10;

/// Attribute merged into every resource before destruction so non-empty
/// containers (buckets, zones, users) tear down without a manual emptying
/// step.
const FORCE_DESTROY: &str = "force_destroy";

/// What happened to one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Deleted,
    Skipped,
    Failed,
}

/// Aggregate outcome of one set's destruction pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct WipeReport {
    /// Resources recorded in the manifest (concrete ids).
    pub matched: usize,
    pub deleted: usize,
    /// Dry-run skips plus entries without an id.
    pub skipped: usize,
    pub failed: usize,
}

impl WipeReport {
    fn tally(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Deleted => self.deleted += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: WipeReport) {
        self.matched += other.matched;
        self.deleted += other.deleted;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

struct WorkItem {
    id: String,
    attrs: HashMap<String, String>,
    tags: HashMap<String, String>,
}

pub struct DestructionPipeline {
    lifecycle: Arc<dyn ResourceLifecycle>,
    manifest: Arc<Mutex<Manifest>>,
    dry_run: bool,
    concurrency: usize,
}

impl DestructionPipeline {
    pub fn new(
        lifecycle: Arc<dyn ResourceLifecycle>,
        manifest: Arc<Mutex<Manifest>>,
        dry_run: bool,
        concurrency: usize,
    ) -> Self {
        Self {
            lifecycle,
            manifest,
            dry_run,
            concurrency: concurrency.max(1),
        }
    }

    /// Destroy every resource in the set, `concurrency` at a time.
    ///
    /// The set is recorded in the manifest up front, dry-run or not. A
    /// single resource's failure is tallied and logged but never cancels
    /// its siblings; completion order within the set carries no meaning.
    pub async fn destroy(&self, set: ResourceSet) -> WipeReport {
        let mut report = WipeReport::default();
        if set.is_empty() {
            return report;
        }

        let live_ids = set.live_ids();
        report.matched = live_ids.len();
        self.manifest
            .lock()
            .expect("manifest lock poisoned")
            .record(&set.resource_type, live_ids);

        info!(
            resource_type = %set.resource_type,
            found = report.matched,
            dry_run = self.dry_run,
            "Destroying resource set"
        );
        for line in &set.info {
            info!(resource_type = %set.resource_type, "{line}");
        }

        let resource_type: Arc<str> = Arc::from(set.resource_type.as_str());
        let (tx, rx) = mpsc::channel::<WorkItem>(self.concurrency);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let tallies = Arc::new(Mutex::new(WipeReport::default()));

        let mut workers = Vec::with_capacity(self.concurrency);
        for _ in 0..self.concurrency {
            let rx = Arc::clone(&rx);
            let tallies = Arc::clone(&tallies);
            let lifecycle = Arc::clone(&self.lifecycle);
            let resource_type = Arc::clone(&resource_type);
            let dry_run = self.dry_run;
            workers.push(tokio::spawn(async move {
                loop {
                    let item = { rx.lock().await.recv().await };
                    let Some(item) = item else { break };
                    let outcome =
                        destroy_one(lifecycle.as_ref(), &resource_type, item, dry_run).await;
                    tallies.lock().expect("tally lock poisoned").tally(outcome);
                }
            }));
        }

        let attrs = set.attrs_aligned();
        let tags = set.tags_aligned();
        for ((id, attrs), tags) in set.ids.into_iter().zip(attrs).zip(tags) {
            match id {
                Some(id) => {
                    // Only fails if every worker panicked; surfaced below
                    // when the handles are joined.
                    let _ = tx.send(WorkItem { id, attrs, tags }).await;
                }
                None => report.skipped += 1,
            }
        }
        drop(tx);

        for joined in futures::future::join_all(workers).await {
            if let Err(e) = joined {
                warn!(error = ?e, "Destruction worker panicked");
            }
        }

        let tallies = *tallies.lock().expect("tally lock poisoned");
        report.merge(WipeReport {
            matched: 0,
            ..tallies
        });
        report
    }
}

async fn destroy_one(
    lifecycle: &dyn ResourceLifecycle,
    resource_type: &str,
    item: WorkItem,
    dry_run: bool,
) -> Outcome {
    if !item.tags.is_empty() {
        debug!(resource_type, id = %item.id, tags = ?item.tags, "Resource tags");
    }

    let mut attrs = item.attrs;
    attrs.insert(FORCE_DESTROY.to_string(), "true".to_string());

    // Refresh failure usually just means the resource's live shape is
    // already minimal; fall back to what we know locally.
    let attrs = match lifecycle.refresh(resource_type, &item.id, &attrs).await {
        Ok(mut refreshed) => {
            refreshed.insert(FORCE_DESTROY.to_string(), "true".to_string());
            refreshed
        }
        Err(e) => {
            warn!(
                resource_type,
                id = %item.id,
                error = ?e,
                "State refresh failed, using local attributes"
            );
            attrs
        }
    };

    if dry_run {
        info!(resource_type, id = %item.id, "[DRY RUN] Would destroy");
        return Outcome::Skipped;
    }

    match lifecycle.destroy(resource_type, &item.id, &attrs).await {
        Ok(()) => {
            info!(resource_type, id = %item.id, "Destroyed");
            Outcome::Deleted
        }
        Err(e) => {
            warn!(resource_type, id = %item.id, error = ?e, "Destroy failed");
            Outcome::Failed
        }
    }
}
