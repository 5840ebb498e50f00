//! The presentation document: page layout, interaction hints and page
//! titles applied to a schema bundle.
//!
//! Field names follow the compact wire keys (`bd`, `l`, `p`, `po`, ...).
//! Widget-specific properties whose shape depends on the widget tag are kept
//! as raw JSON; the compiler interprets them per widget.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Only interaction entries for this medium are consulted.
pub const CAPTURE_MEDIUM: &str = "web";
/// Only interaction entries for this context are consulted.
pub const CAPTURE_CONTEXT: &str = "capture";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    /// Digest of the bundle this presentation targets.
    #[serde(rename = "bd")]
    pub bundle_digest: String,
    /// The presentation's own digest, informational only.
    #[serde(rename = "d", default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(rename = "l", default)]
    pub languages: Vec<String>,
    #[serde(rename = "p", default)]
    pub pages: Vec<PageSpec>,
    #[serde(rename = "po", default)]
    pub page_order: Vec<String>,
    /// Language -> page name -> display title.
    #[serde(rename = "pl", default)]
    pub page_labels: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(rename = "i", default)]
    pub interactions: Vec<Interaction>,
}

impl Presentation {
    /// The interaction entry for web capture, if any.
    pub fn capture_interaction(&self) -> Option<&Interaction> {
        self.interactions
            .iter()
            .find(|i| i.medium == CAPTURE_MEDIUM && i.context == CAPTURE_CONTEXT)
    }

    /// The page spec addressed by `name` through any of its naming keys.
    pub fn find_page(&self, name: &str) -> Option<&PageSpec> {
        self.pages.iter().find(|p| {
            p.name.as_deref() == Some(name)
                || p.synthetic.as_deref() == Some(name)
                || p.reference.as_deref() == Some(name)
        })
    }

    pub fn page_label(&self, lang: &str, page: &str) -> Option<&str> {
        self.page_labels
            .get(lang)
            .and_then(|labels| labels.get(page))
            .map(String::as_str)
    }
}

/// A page (or nested section) and its ordered entries.
///
/// Exactly one of `name`, `reference`, `synthetic` is expected; the
/// compiler rejects combinations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    /// Deprecated single-name addressing.
    #[serde(rename = "n", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Named reference: the entry embeds a reference-typed attribute.
    #[serde(rename = "nr", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Named synthetic section with no backing attribute.
    #[serde(rename = "ns", default, skip_serializing_if = "Option::is_none")]
    pub synthetic: Option<String>,
    #[serde(rename = "ao")]
    pub entries: Vec<PageEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageEntry {
    Attribute(String),
    Page(PageSpec),
}

/// Capture hints for one delivery medium and context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(rename = "m")]
    pub medium: String,
    #[serde(rename = "c")]
    pub context: String,
    /// Fully-qualified attribute path -> hints.
    #[serde(rename = "a", default)]
    pub attributes: BTreeMap<String, AttributeHints>,
}

/// Raw capture hints for one attribute path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeHints {
    /// Widget tag (`radio`, `select`, `date`, `list`, `question`, ...).
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub widget: Option<String>,
    /// Orientation for radios; option -> additional attributes for questions.
    #[serde(rename = "o", default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
    #[serde(rename = "va", default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(rename = "r", default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Value>,
    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Value>,
    /// Signature canvas/geolocation bindings.
    #[serde(rename = "m", default, skip_serializing_if = "Option::is_none")]
    pub bindings: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idt: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_item_remove: Option<Value>,
}
