//! The metadata tree: list identifier strategies, stored at the path where
//! each identified list sits in the form.

use crate::descriptor::IdFormat;
use crate::path::Path;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key under which a list's identifier record is stored.
pub const ID_KEY: &str = "_id";

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ListIdentifier {
    /// The raw `id` request from the interaction hints.
    pub id: Value,
    pub format: IdFormat,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataTree {
    children: BTreeMap<String, MetadataTree>,
    id: Option<ListIdentifier>,
}

impl MetadataTree {
    pub fn new() -> Self {
        MetadataTree::default()
    }

    /// Store `ident` at `path`, creating intermediate nodes.
    pub fn record_list_identifier(&mut self, path: &Path, ident: ListIdentifier) {
        let mut node = self;
        for segment in path.segments() {
            node = node.children.entry(segment.clone()).or_default();
        }
        node.id = Some(ident);
    }
}

impl Serialize for MetadataTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.children.len() + usize::from(self.id.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (key, child) in &self.children {
            map.serialize_entry(key, child)?;
        }
        if let Some(id) = &self.id {
            map.serialize_entry(ID_KEY, id)?;
        }
        map.end()
    }
}
