//! End-to-end engine tests over an in-memory fake cloud
//!
//! The fake implements both collaborator traits with scripted inventories,
//! injectable failures, and enough instrumentation to observe destroy
//! ordering and in-flight concurrency.

use anyhow::{bail, Result};
use async_trait::async_trait;
use awsweep::cloud::{
    PolicyEntities, RawResource, ResourceLifecycle, ResourceListing, ZoneRecord,
};
use awsweep::{FilterConfig, SweepOptions, Sweeper};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct FakeCloud {
    inventory: HashMap<String, Vec<RawResource>>,
    zone_records: HashMap<String, Vec<ZoneRecord>>,
    mount_targets: HashMap<String, Vec<String>>,
    role_attachments: HashMap<String, Vec<String>>,
    role_inline: HashMap<String, Vec<String>>,
    user_attachments: HashMap<String, Vec<String>>,
    fail_listing: HashSet<String>,
    fail_destroy: HashSet<String>,
    fail_refresh: bool,
    destroy_delay: Duration,
    // Instrumentation
    destroyed: Mutex<Vec<(String, String, HashMap<String, String>)>>,
    destroy_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeCloud {
    fn add(&mut self, resource_type: &str, resource: RawResource) {
        self.inventory
            .entry(resource_type.to_string())
            .or_default()
            .push(resource);
    }

    fn tagged(id: &str, tags: &[(&str, &str)]) -> RawResource {
        RawResource::new(id).with_tags(
            tags.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn destroy_order(&self) -> Vec<(String, String)> {
        self.destroyed
            .lock()
            .unwrap()
            .iter()
            .map(|(t, id, _)| (t.clone(), id.clone()))
            .collect()
    }

    fn destroyed_attrs(&self, id: &str) -> Option<HashMap<String, String>> {
        self.destroyed
            .lock()
            .unwrap()
            .iter()
            .find(|(_, i, _)| i == id)
            .map(|(_, _, attrs)| attrs.clone())
    }
}

#[async_trait]
impl ResourceListing for FakeCloud {
    async fn list(&self, resource_type: &str) -> Result<Vec<RawResource>> {
        if self.fail_listing.contains(resource_type) {
            bail!("listing unavailable for {resource_type}");
        }
        Ok(self.inventory.get(resource_type).cloned().unwrap_or_default())
    }

    async fn zone_records(&self, zone_id: &str) -> Result<Vec<ZoneRecord>> {
        Ok(self.zone_records.get(zone_id).cloned().unwrap_or_default())
    }

    async fn mount_targets(&self, file_system_id: &str) -> Result<Vec<String>> {
        Ok(self
            .mount_targets
            .get(file_system_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn attached_user_policies(&self, user_name: &str) -> Result<Vec<String>> {
        Ok(self
            .user_attachments
            .get(user_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn attached_role_policies(&self, role_name: &str) -> Result<Vec<String>> {
        Ok(self
            .role_attachments
            .get(role_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn inline_role_policies(&self, role_name: &str) -> Result<Vec<String>> {
        Ok(self.role_inline.get(role_name).cloned().unwrap_or_default())
    }

    async fn policy_entities(&self, _policy_arn: &str) -> Result<PolicyEntities> {
        Ok(PolicyEntities::default())
    }
}

#[async_trait]
impl ResourceLifecycle for FakeCloud {
    async fn refresh(
        &self,
        _resource_type: &str,
        _id: &str,
        attrs: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh {
            bail!("refresh unavailable");
        }
        Ok(attrs.clone())
    }

    async fn destroy(
        &self,
        resource_type: &str,
        id: &str,
        attrs: &HashMap<String, String>,
    ) -> Result<()> {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.destroy_delay.is_zero() {
            tokio::time::sleep(self.destroy_delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_destroy.contains(id) {
            bail!("provider refused to delete {id}");
        }
        self.destroyed.lock().unwrap().push((
            resource_type.to_string(),
            id.to_string(),
            attrs.clone(),
        ));
        Ok(())
    }
}

fn sweeper(cloud: Arc<FakeCloud>, filter: FilterConfig, options: SweepOptions) -> Sweeper {
    let listing: Arc<dyn ResourceListing> = cloud.clone();
    let lifecycle: Arc<dyn ResourceLifecycle> = cloud;
    Sweeper::new(listing, lifecycle, filter, options)
}

fn wipe_options() -> SweepOptions {
    SweepOptions {
        dry_run: false,
        concurrency: 10,
    }
}

/// Parse the manifest back and return the ids recorded for one type.
fn manifest_ids(sweeper: &Sweeper, resource_type: &str) -> Vec<String> {
    let yaml = sweeper.manifest_yaml().unwrap();
    let doc: BTreeMap<String, BTreeMap<String, Vec<String>>> =
        serde_yaml::from_str(&yaml).unwrap_or_default();
    doc.get(resource_type)
        .and_then(|entry| entry.get("ids"))
        .cloned()
        .unwrap_or_default()
}

#[tokio::test]
async fn anchored_tag_pattern_selects_exact_matches_only() {
    let mut fake = FakeCloud::default();
    fake.add("aws_vpc", FakeCloud::tagged("vpc-temp", &[("env", "temp")]));
    fake.add("aws_vpc", FakeCloud::tagged("vpc-prod", &[("env", "prod")]));
    fake.add(
        "aws_vpc",
        FakeCloud::tagged("vpc-staging", &[("env", "temp-staging")]),
    );
    let fake = Arc::new(fake);

    let filter = FilterConfig::from_yaml("aws_vpc:\n  tags:\n    env: \"^temp$\"\n").unwrap();
    let sweeper = sweeper(fake.clone(), filter, wipe_options());
    let report = sweeper.run().await;

    assert_eq!(report.matched, 1);
    assert_eq!(report.deleted, 1);
    assert_eq!(manifest_ids(&sweeper, "aws_vpc"), ["vpc-temp"]);
    assert_eq!(
        fake.destroy_order(),
        [("aws_vpc".to_string(), "vpc-temp".to_string())]
    );
}

#[tokio::test]
async fn dry_run_records_manifest_but_destroys_nothing() {
    let mut fake = FakeCloud::default();
    for i in 0..5 {
        fake.add("aws_subnet", RawResource::new(format!("subnet-{i}")));
    }
    let fake = Arc::new(fake);

    let filter = FilterConfig::from_yaml("aws_subnet:\n").unwrap();
    let sweeper = sweeper(
        fake.clone(),
        filter,
        SweepOptions {
            dry_run: true,
            concurrency: 10,
        },
    );
    let report = sweeper.run().await;

    assert_eq!(report.matched, 5);
    assert_eq!(report.skipped, 5);
    assert_eq!(report.deleted, 0);
    assert_eq!(fake.destroy_calls.load(Ordering::SeqCst), 0);
    assert_eq!(manifest_ids(&sweeper, "aws_subnet").len(), 5);
}

#[tokio::test]
async fn one_failure_never_aborts_the_set() {
    let mut fake = FakeCloud::default();
    for i in 0..10 {
        fake.add("aws_instance", RawResource::new(format!("i-{i}")));
    }
    fake.fail_destroy.insert("i-4".to_string());
    let fake = Arc::new(fake);

    let filter = FilterConfig::from_yaml("aws_instance:\n").unwrap();
    let sweeper = sweeper(fake.clone(), filter, wipe_options());
    let report = sweeper.run().await;

    assert_eq!(fake.destroy_calls.load(Ordering::SeqCst), 10);
    assert_eq!(report.deleted, 9);
    assert_eq!(report.failed, 1);
    // The failed resource still appears in the manifest; it matched.
    assert_eq!(manifest_ids(&sweeper, "aws_instance").len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_flight_destroys_never_exceed_concurrency() {
    let mut fake = FakeCloud::default();
    for i in 0..25 {
        fake.add("aws_ebs_volume", RawResource::new(format!("vol-{i}")));
    }
    fake.destroy_delay = Duration::from_millis(20);
    let fake = Arc::new(fake);

    let filter = FilterConfig::from_yaml("aws_ebs_volume:\n").unwrap();
    let sweeper = sweeper(
        fake.clone(),
        filter,
        SweepOptions {
            dry_run: false,
            concurrency: 5,
        },
    );
    let report = sweeper.run().await;

    assert_eq!(report.deleted, 25);
    let max = fake.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 5, "observed {max} concurrent destroys");
    assert!(max > 1, "destruction never ran concurrently");
}

#[tokio::test]
async fn mount_targets_destroy_before_their_file_system() {
    let mut fake = FakeCloud::default();
    fake.add("aws_efs_file_system", RawResource::new("fs-1"));
    fake.mount_targets.insert(
        "fs-1".to_string(),
        vec!["fsmt-a".to_string(), "fsmt-b".to_string()],
    );
    fake.destroy_delay = Duration::from_millis(5);
    let fake = Arc::new(fake);

    let filter = FilterConfig::from_yaml("aws_efs_file_system:\n").unwrap();
    let sweeper = sweeper(fake.clone(), filter, wipe_options());
    sweeper.run().await;

    let order = fake.destroy_order();
    let fs_pos = order.iter().position(|(_, id)| id == "fs-1").unwrap();
    for target in ["fsmt-a", "fsmt-b"] {
        let target_pos = order.iter().position(|(_, id)| id == target).unwrap();
        assert!(
            target_pos < fs_pos,
            "{target} destroyed after its file system"
        );
    }
    assert_eq!(
        manifest_ids(&sweeper, "aws_efs_mount_target"),
        ["fsmt-a", "fsmt-b"]
    );
}

#[tokio::test]
async fn zone_records_are_scoped_by_the_zone_rule() {
    let mut fake = FakeCloud::default();
    fake.add(
        "aws_route53_zone",
        RawResource::new("Z1").with_attr("name", "example.com."),
    );
    let record = |value: &str| ZoneRecord {
        name: "www.example.com.".to_string(),
        record_type: "CNAME".to_string(),
        ttl: Some(300),
        value: value.to_string(),
    };
    fake.zone_records.insert(
        "Z1".to_string(),
        vec![record("match-me"), record("other-a"), record("other-b")],
    );
    let fake = Arc::new(fake);

    // The zone matches by id; of its records, only one value matches.
    let filter =
        FilterConfig::from_yaml("aws_route53_zone:\n  ids: [\"Z1\", \"^match-me$\"]\n").unwrap();
    let sweeper = sweeper(fake.clone(), filter, wipe_options());
    sweeper.run().await;

    assert_eq!(manifest_ids(&sweeper, "aws_route53_record"), ["match-me"]);
    assert_eq!(manifest_ids(&sweeper, "aws_route53_zone"), ["Z1"]);

    let order = fake.destroy_order();
    let record_pos = order.iter().position(|(_, id)| id == "match-me").unwrap();
    let zone_pos = order.iter().position(|(_, id)| id == "Z1").unwrap();
    assert!(record_pos < zone_pos);
    assert!(!order.iter().any(|(_, id)| id == "other-a" || id == "other-b"));

    // The record carries its targeting context from expansion.
    let attrs = fake.destroyed_attrs("match-me").unwrap();
    assert_eq!(attrs.get("zone_id").map(String::as_str), Some("Z1"));
    assert_eq!(attrs.get("record_type").map(String::as_str), Some("CNAME"));
}

#[tokio::test]
async fn role_dependents_destroy_before_the_role() {
    let mut fake = FakeCloud::default();
    fake.add("aws_iam_role", RawResource::new("deploy"));
    fake.role_attachments.insert(
        "deploy".to_string(),
        vec!["arn:aws:iam::1:policy/p1".to_string()],
    );
    fake.role_inline
        .insert("deploy".to_string(), vec!["inline1".to_string()]);
    let fake = Arc::new(fake);

    let filter = FilterConfig::from_yaml("aws_iam_role:\n  ids: [\"^deploy$\"]\n").unwrap();
    let sweeper = sweeper(fake.clone(), filter, wipe_options());
    sweeper.run().await;

    let order = fake.destroy_order();
    assert_eq!(
        order,
        [
            (
                "aws_iam_role_policy_attachment".to_string(),
                "arn:aws:iam::1:policy/p1".to_string()
            ),
            ("aws_iam_role_policy".to_string(), "deploy:inline1".to_string()),
            ("aws_iam_role".to_string(), "deploy".to_string()),
        ]
    );

    let attrs = fake.destroyed_attrs("arn:aws:iam::1:policy/p1").unwrap();
    assert_eq!(attrs.get("role").map(String::as_str), Some("deploy"));
    // The forced-destroy safety attribute reaches every destroy call.
    assert_eq!(attrs.get("force_destroy").map(String::as_str), Some("true"));
}

#[tokio::test]
async fn listing_failure_contains_to_that_type() {
    let mut fake = FakeCloud::default();
    fake.add("aws_vpc", RawResource::new("vpc-1"));
    fake.add("aws_subnet", RawResource::new("subnet-1"));
    fake.fail_listing.insert("aws_vpc".to_string());
    let fake = Arc::new(fake);

    let filter = FilterConfig::from_yaml("aws_vpc:\naws_subnet:\n").unwrap();
    let sweeper = sweeper(fake.clone(), filter, wipe_options());
    let report = sweeper.run().await;

    // The failing type contributes nothing; the other type still sweeps.
    assert_eq!(report.matched, 1);
    assert_eq!(
        fake.destroy_order(),
        [("aws_subnet".to_string(), "subnet-1".to_string())]
    );
    assert!(manifest_ids(&sweeper, "aws_vpc").is_empty());
}

#[tokio::test]
async fn refresh_failure_falls_back_to_local_attributes() {
    let mut fake = FakeCloud::default();
    fake.add("aws_vpc", RawResource::new("vpc-1"));
    fake.fail_refresh = true;
    let fake = Arc::new(fake);

    let filter = FilterConfig::from_yaml("aws_vpc:\n").unwrap();
    let sweeper = sweeper(fake.clone(), filter, wipe_options());
    let report = sweeper.run().await;

    assert_eq!(report.deleted, 1);
    assert!(fake.refresh_calls.load(Ordering::SeqCst) > 0);
    let attrs = fake.destroyed_attrs("vpc-1").unwrap();
    assert_eq!(attrs.get("force_destroy").map(String::as_str), Some("true"));
}

#[tokio::test]
async fn unlisted_types_are_never_swept() {
    let mut fake = FakeCloud::default();
    fake.add("aws_vpc", RawResource::new("vpc-1"));
    fake.add("aws_eip", RawResource::new("eipalloc-1"));
    let fake = Arc::new(fake);

    let filter = FilterConfig::from_yaml("aws_eip:\n").unwrap();
    let sweeper = sweeper(fake.clone(), filter, wipe_options());
    let report = sweeper.run().await;

    assert_eq!(report.matched, 1);
    assert_eq!(
        fake.destroy_order(),
        [("aws_eip".to_string(), "eipalloc-1".to_string())]
    );
}

#[tokio::test]
async fn dry_run_manifests_are_byte_identical_across_runs() {
    let build_fake = || {
        let mut fake = FakeCloud::default();
        fake.add("aws_vpc", FakeCloud::tagged("vpc-1", &[("env", "temp")]));
        fake.add("aws_subnet", RawResource::new("subnet-1"));
        fake.add("aws_subnet", RawResource::new("subnet-2"));
        Arc::new(fake)
    };
    let options = SweepOptions {
        dry_run: true,
        concurrency: 10,
    };

    let mut manifests = Vec::new();
    for _ in 0..2 {
        let filter = FilterConfig::from_yaml("aws_vpc:\naws_subnet:\n").unwrap();
        let sweeper = sweeper(build_fake(), filter, options);
        sweeper.run().await;
        manifests.push(sweeper.manifest_yaml().unwrap());
    }
    assert_eq!(manifests[0], manifests[1]);
}
