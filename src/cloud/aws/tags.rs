//! Tag normalization helpers
//!
//! Every AWS service defines its own tag type (ec2::Tag, efs::Tag,
//! autoscaling::TagDescription, ...) but they are all key/value string
//! pairs. One generic extractor handles them all via accessor closures.

use std::collections::HashMap;

pub(crate) fn tag_map<T>(
    tags: &[T],
    key: impl Fn(&T) -> Option<&str>,
    value: impl Fn(&T) -> Option<&str>,
) -> HashMap<String, String> {
    tags.iter()
        .filter_map(|t| match (key(t), value(t)) {
            (Some(k), Some(v)) => Some((k.to_string(), v.to_string())),
            _ => None,
        })
        .collect()
}

pub(crate) fn ec2_tags(tags: &[aws_sdk_ec2::types::Tag]) -> HashMap<String, String> {
    tag_map(tags, |t| t.key(), |t| t.value())
}

pub(crate) fn efs_tags(tags: &[aws_sdk_efs::types::Tag]) -> HashMap<String, String> {
    tag_map(tags, |t| Some(t.key()), |t| Some(t.value()))
}

pub(crate) fn autoscaling_tags(
    tags: &[aws_sdk_autoscaling::types::TagDescription],
) -> HashMap<String, String> {
    tag_map(tags, |t| t.key(), |t| t.value())
}
