//! Typed structs representing a schema bundle: its attributes and
//! per-language metadata.
//!
//! Per-language maps keep their declared key order because the compiler
//! reads "the first language" of an entry set as the default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Per-language values in declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Localized<T>(pub Vec<(String, T)>);

impl<T> Localized<T> {
    pub fn new() -> Self {
        Localized(Vec::new())
    }

    pub fn get(&self, lang: &str) -> Option<&T> {
        self.0.iter().find(|(l, _)| l == lang).map(|(_, v)| v)
    }

    /// The value of the first declared language.
    pub fn first(&self) -> Option<&T> {
        self.0.first().map(|(_, v)| v)
    }

    pub fn insert(&mut self, lang: impl Into<String>, value: T) {
        let lang = lang.into();
        match self.0.iter_mut().find(|(l, _)| *l == lang) {
            Some((_, v)) => *v = value,
            None => self.0.push((lang, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── Attribute types ─────────────────────────────────────────────────

/// Primitive value kinds an attribute can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Text,
    Numeric,
    Boolean,
    DateTime,
    Binary,
}

impl Primitive {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Text" => Some(Primitive::Text),
            "Numeric" => Some(Primitive::Numeric),
            "Boolean" => Some(Primitive::Boolean),
            "DateTime" => Some(Primitive::DateTime),
            "Binary" => Some(Primitive::Binary),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::Text => "Text",
            Primitive::Numeric => "Numeric",
            Primitive::Boolean => "Boolean",
            Primitive::DateTime => "DateTime",
            Primitive::Binary => "Binary",
        }
    }
}

/// The element type of an attribute, with any array wrapping removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseType {
    Primitive(Primitive),
    /// `refs:<digest>` -- points at another bundle.
    Reference(String),
    /// Anything else, kept verbatim (including nested arrays).
    Unrecognized(String),
}

impl BaseType {
    pub fn parse(tag: &str) -> Self {
        if let Some(digest) = tag.strip_prefix("refs:") {
            return BaseType::Reference(digest.to_string());
        }
        match Primitive::from_tag(tag) {
            Some(p) => BaseType::Primitive(p),
            None => BaseType::Unrecognized(tag.to_string()),
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::Primitive(p) => write!(f, "{}", p.as_str()),
            BaseType::Reference(digest) => write!(f, "refs:{}", digest),
            BaseType::Unrecognized(raw) => write!(f, "{}", raw),
        }
    }
}

/// A declared attribute type: a base type, optionally wrapped once in an
/// array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeType {
    pub base: BaseType,
    pub is_array: bool,
}

impl AttributeType {
    pub fn scalar(base: BaseType) -> Self {
        AttributeType {
            base,
            is_array: false,
        }
    }

    pub fn array(base: BaseType) -> Self {
        AttributeType {
            base,
            is_array: true,
        }
    }

    /// Parse the string form: `Text`, `refs:<digest>`, `Array[<inner>]`.
    pub fn parse(raw: &str) -> Self {
        match raw
            .strip_prefix("Array[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            Some(inner) => AttributeType::array(BaseType::parse(inner)),
            None => AttributeType::scalar(BaseType::parse(raw)),
        }
    }

    /// The referenced digest, looking through one array level.
    pub fn reference(&self) -> Option<&str> {
        match &self.base {
            BaseType::Reference(digest) => Some(digest),
            _ => None,
        }
    }

    /// The same type with the array wrapping removed.
    pub fn element(&self) -> AttributeType {
        AttributeType::scalar(self.base.clone())
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array {
            write!(f, "Array[{}]", self.base)
        } else {
            write!(f, "{}", self.base)
        }
    }
}

// ── Attributes ──────────────────────────────────────────────────────

/// Enumerated choice codes: either a flat list, or codes grouped under
/// category codes (groups keep declared order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryCodes {
    Flat(Vec<String>),
    Grouped(Vec<(String, Vec<String>)>),
}

/// A measurement unit declared as a single system/unit pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Units {
    pub system: String,
    pub unit: String,
}

/// One attribute of a schema bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDef {
    pub name: String,
    pub attr_type: AttributeType,
    /// Mandatory marker (`"M"`); anything else means optional.
    pub conformance: Option<String>,
    /// `"<n>"` or `"<min>-<max>"`, either bound may be empty.
    pub cardinality: Option<String>,
    pub format: Option<String>,
    pub units: Option<Units>,
    pub entry_codes: Option<EntryCodes>,
    /// Language -> (code -> label).
    pub entries: Option<Localized<BTreeMap<String, String>>>,
    pub labels: Localized<String>,
    pub informations: Localized<String>,
}

impl AttributeDef {
    /// A bare attribute with only a name and type.
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        AttributeDef {
            name: name.into(),
            attr_type,
            conformance: None,
            cardinality: None,
            format: None,
            units: None,
            entry_codes: None,
            entries: None,
            labels: Localized::new(),
            informations: Localized::new(),
        }
    }
}

/// Bundle-level display metadata for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleMeta {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A digest-identified schema bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaBundle {
    pub digest: String,
    pub attributes: Vec<AttributeDef>,
    pub meta: Localized<BundleMeta>,
}

impl SchemaBundle {
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }
}
