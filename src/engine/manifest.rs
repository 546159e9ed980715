//! Audit manifest of matched resources
//!
//! Every set the pipeline receives is recorded here before any destruction,
//! so dry-run and destructive runs produce the same document. The output
//! shape mirrors the filter config (type to id list), which makes a manifest
//! usable as the starting point for a future filter file.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Default, Serialize)]
struct ManifestEntry {
    ids: Vec<String>,
}

/// Accumulated `type -> ids` record of everything that matched.
///
/// BTreeMap keys plus append-ordered ids keep serialization deterministic:
/// two runs over the same inventory write byte-identical documents.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    /// Record matched ids for a type. Types may contribute several times
    /// (dependent sets of the same type across parents); ids append in
    /// arrival order.
    pub fn record(&mut self, resource_type: &str, ids: Vec<String>) {
        if ids.is_empty() {
            return;
        }
        self.entries
            .entry(resource_type.to_string())
            .or_default()
            .ids
            .extend(ids);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids recorded for one type, if any.
    pub fn ids_for(&self, resource_type: &str) -> Option<&[String]> {
        self.entries.get(resource_type).map(|e| e.ids.as_slice())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize manifest")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let document = self.to_yaml()?;
        std::fs::write(path, document)
            .with_context(|| format!("Failed to write manifest {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sets_leave_no_entry() {
        let mut manifest = Manifest::default();
        manifest.record("aws_vpc", vec![]);
        assert!(manifest.is_empty());
    }

    #[test]
    fn repeated_types_append_in_order() {
        let mut manifest = Manifest::default();
        manifest.record("aws_efs_mount_target", vec!["fsmt-1".into()]);
        manifest.record("aws_efs_mount_target", vec!["fsmt-2".into()]);
        assert_eq!(
            manifest.ids_for("aws_efs_mount_target").unwrap(),
            ["fsmt-1", "fsmt-2"]
        );
    }

    #[test]
    fn yaml_shape_matches_filter_document() {
        let mut manifest = Manifest::default();
        manifest.record("aws_vpc", vec!["vpc-1".into(), "vpc-2".into()]);
        manifest.record("aws_subnet", vec!["subnet-9".into()]);

        let yaml = manifest.to_yaml().unwrap();
        // Keys sort alphabetically, each entry carries only its id list.
        assert_eq!(
            yaml,
            "aws_subnet:\n  ids:\n  - subnet-9\naws_vpc:\n  ids:\n  - vpc-1\n  - vpc-2\n"
        );
    }

    #[test]
    fn serialization_is_deterministic() {
        let build = || {
            let mut manifest = Manifest::default();
            manifest.record("aws_vpc", vec!["vpc-1".into()]);
            manifest.record("aws_ami", vec!["ami-1".into()]);
            manifest.to_yaml().unwrap()
        };
        assert_eq!(build(), build());
    }
}
