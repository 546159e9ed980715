//! A batch of resources destined for deletion

use std::collections::HashMap;

/// One deletable batch: every matched resource of one type, in discovery
/// order.
///
/// `attrs` and `tags` are either empty (absent) or parallel to `ids`, with
/// strictly positional alignment. The constructors below enforce that shape;
/// the pipeline pads absent vectors when it dispatches work.
#[derive(Debug, Default)]
pub struct ResourceSet {
    pub resource_type: String,
    /// `None` entries are carried but skipped by the pipeline.
    pub ids: Vec<Option<String>>,
    pub attrs: Vec<HashMap<String, String>>,
    pub tags: Vec<HashMap<String, String>>,
    /// Freeform descriptive strings, logged when present.
    pub info: Vec<String>,
}

impl ResourceSet {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            ..Self::default()
        }
    }

    /// Append one resource, keeping attrs/tags aligned with ids.
    pub fn push(
        &mut self,
        id: Option<String>,
        attrs: HashMap<String, String>,
        tags: HashMap<String, String>,
    ) {
        self.ids.push(id);
        self.attrs.push(attrs);
        self.tags.push(tags);
    }

    /// True when there is nothing to do, including all-`None` id lists.
    pub fn is_empty(&self) -> bool {
        !self.ids.iter().any(Option::is_some)
    }

    /// The concrete (non-`None`) ids, in order.
    pub fn live_ids(&self) -> Vec<String> {
        self.ids.iter().flatten().cloned().collect()
    }

    /// Attrs padded out to `ids` length when absent.
    pub(crate) fn attrs_aligned(&self) -> Vec<HashMap<String, String>> {
        if self.attrs.is_empty() {
            vec![HashMap::new(); self.ids.len()]
        } else {
            debug_assert_eq!(self.attrs.len(), self.ids.len());
            self.attrs.clone()
        }
    }

    /// Tags padded out to `ids` length when absent.
    pub(crate) fn tags_aligned(&self) -> Vec<HashMap<String, String>> {
        if self.tags.is_empty() {
            vec![HashMap::new(); self.ids.len()]
        } else {
            debug_assert_eq!(self.tags.len(), self.ids.len());
            self.tags.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_detection_treats_all_none_as_empty() {
        let mut set = ResourceSet::new("aws_vpc");
        assert!(set.is_empty());

        set.push(None, HashMap::new(), HashMap::new());
        assert!(set.is_empty());

        set.push(Some("vpc-1".into()), HashMap::new(), HashMap::new());
        assert!(!set.is_empty());
        assert_eq!(set.live_ids(), ["vpc-1"]);
    }

    #[test]
    fn alignment_is_preserved_through_push() {
        let mut set = ResourceSet::new("aws_iam_role_policy_attachment");
        let mut attrs = HashMap::new();
        attrs.insert("role".to_string(), "deploy".to_string());
        set.push(Some("arn:a".into()), attrs, HashMap::new());
        set.push(Some("arn:b".into()), HashMap::new(), HashMap::new());

        let aligned = set.attrs_aligned();
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned[0].get("role").map(String::as_str), Some("deploy"));
        assert!(aligned[1].is_empty());
    }

    #[test]
    fn absent_attrs_pad_to_ids_length() {
        let set = ResourceSet {
            resource_type: "aws_subnet".into(),
            ids: vec![Some("subnet-1".into()), None, Some("subnet-2".into())],
            ..ResourceSet::default()
        };
        assert_eq!(set.attrs_aligned().len(), 3);
        assert_eq!(set.tags_aligned().len(), 3);
    }
}
