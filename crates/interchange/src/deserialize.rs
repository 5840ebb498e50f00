//! Deserialization of schema bundles and presentation documents.
//!
//! The main entry points are [`bundle_from_json`] and
//! [`presentation_from_json`], both taking a `&serde_json::Value`.

use crate::presentation::Presentation;
use crate::types::*;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Errors while reading input documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterchangeError {
    /// The document is missing a required top-level field.
    MissingField { field: String },
    /// An attribute declaration is malformed.
    AttributeError { name: String, message: String },
    /// The document structure is invalid.
    InvalidDocument(String),
}

impl fmt::Display for InterchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterchangeError::MissingField { field } => {
                write!(f, "document missing required field: '{}'", field)
            }
            InterchangeError::AttributeError { name, message } => {
                write!(f, "attribute '{}': {}", name, message)
            }
            InterchangeError::InvalidDocument(msg) => {
                write!(f, "invalid document: {}", msg)
            }
        }
    }
}

impl std::error::Error for InterchangeError {}

/// Deserialize a schema bundle document.
///
/// Attributes keep their declared order; that order drives dependency
/// validation and the "first language" of entry sets.
pub fn bundle_from_json(doc: &Value) -> Result<SchemaBundle, InterchangeError> {
    let digest = doc
        .get("digest")
        .and_then(|v| v.as_str())
        .ok_or_else(|| InterchangeError::MissingField {
            field: "digest".to_string(),
        })?
        .to_string();

    let attrs = doc
        .get("attributes")
        .and_then(|a| a.as_array())
        .ok_or_else(|| InterchangeError::MissingField {
            field: "attributes".to_string(),
        })?;

    let mut attributes = Vec::with_capacity(attrs.len());
    for obj in attrs {
        attributes.push(parse_attribute(obj)?);
    }

    let mut meta = Localized::new();
    if let Some(langs) = doc.get("meta").and_then(|m| m.as_object()) {
        for (lang, m) in langs {
            meta.insert(
                lang.clone(),
                BundleMeta {
                    name: optional_str(m, "name"),
                    description: optional_str(m, "description"),
                },
            );
        }
    }

    Ok(SchemaBundle {
        digest,
        attributes,
        meta,
    })
}

/// Deserialize a presentation document.
pub fn presentation_from_json(doc: &Value) -> Result<Presentation, InterchangeError> {
    serde_json::from_value(doc.clone())
        .map_err(|e| InterchangeError::InvalidDocument(format!("presentation: {}", e)))
}

// ── Parsing helpers ─────────────────────────────────────────────────

fn optional_str(obj: &Value, field: &str) -> Option<String> {
    obj.get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn parse_attribute(obj: &Value) -> Result<AttributeDef, InterchangeError> {
    let name = optional_str(obj, "name")
        .ok_or_else(|| InterchangeError::InvalidDocument("attribute missing 'name'".to_string()))?;

    let attr_type = match obj.get("type") {
        Some(Value::String(raw)) => AttributeType::parse(raw),
        Some(Value::Array(items)) => match items.as_slice() {
            [Value::String(inner)] => AttributeType::array(BaseType::parse(inner)),
            _ => {
                return Err(InterchangeError::AttributeError {
                    name,
                    message: "array type must wrap exactly one type tag".to_string(),
                })
            }
        },
        Some(other) => {
            return Err(InterchangeError::AttributeError {
                name,
                message: format!("unsupported type declaration {}", other),
            })
        }
        None => {
            return Err(InterchangeError::AttributeError {
                name,
                message: "missing 'type'".to_string(),
            })
        }
    };

    let units = obj
        .get("units")
        .and_then(|u| u.as_object())
        .and_then(|u| u.iter().next())
        .and_then(|(system, unit)| {
            Some(Units {
                system: system.clone(),
                unit: unit.as_str()?.to_string(),
            })
        });

    let entry_codes = match obj.get("entry_codes") {
        None | Some(Value::Null) => None,
        Some(Value::Array(codes)) => Some(EntryCodes::Flat(string_list(codes))),
        Some(Value::Object(groups)) => Some(EntryCodes::Grouped(
            groups
                .iter()
                .map(|(group, codes)| {
                    let codes = codes.as_array().map(|c| string_list(c)).unwrap_or_default();
                    (group.clone(), codes)
                })
                .collect(),
        )),
        Some(other) => {
            return Err(InterchangeError::AttributeError {
                name,
                message: format!("entry_codes must be a list or a map, got {}", other),
            })
        }
    };

    let entries = obj.get("entries").and_then(|e| e.as_object()).map(|langs| {
        let mut out = Localized::new();
        for (lang, labels) in langs {
            let labels: BTreeMap<String, String> = labels
                .as_object()
                .map(|m| {
                    m.iter()
                        .filter_map(|(code, label)| Some((code.clone(), label.as_str()?.to_string())))
                        .collect()
                })
                .unwrap_or_default();
            out.insert(lang.clone(), labels);
        }
        out
    });

    Ok(AttributeDef {
        attr_type,
        conformance: optional_str(obj, "conformance"),
        cardinality: optional_str(obj, "cardinality"),
        format: optional_str(obj, "format"),
        units,
        entry_codes,
        entries,
        labels: localized_strings(obj.get("labels")),
        informations: localized_strings(obj.get("informations")),
        name,
    })
}

fn string_list(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| v.as_str().map(|s| s.to_string()))
        .collect()
}

fn localized_strings(value: Option<&Value>) -> Localized<String> {
    let mut out = Localized::new();
    if let Some(langs) = value.and_then(|v| v.as_object()) {
        for (lang, text) in langs {
            if let Some(text) = text.as_str() {
                out.insert(lang.clone(), text.to_string());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::PageEntry;
    use serde_json::json;

    #[test]
    fn parses_attribute_types() {
        let doc = json!({
            "digest": "Eroot",
            "attributes": [
                {"name": "a", "type": "Text"},
                {"name": "b", "type": "Array[Numeric]"},
                {"name": "c", "type": ["refs:Eaddr"]},
                {"name": "d", "type": "refs:Eaddr"},
                {"name": "e", "type": "Array[Array[Text]]"},
                {"name": "f", "type": "Geometry"}
            ]
        });
        let bundle = bundle_from_json(&doc).unwrap();
        let types: Vec<_> = bundle.attributes.iter().map(|a| &a.attr_type).collect();
        assert_eq!(*types[0], AttributeType::scalar(BaseType::Primitive(Primitive::Text)));
        assert_eq!(*types[1], AttributeType::array(BaseType::Primitive(Primitive::Numeric)));
        assert_eq!(types[2].reference(), Some("Eaddr"));
        assert!(types[2].is_array);
        assert_eq!(types[3].reference(), Some("Eaddr"));
        assert!(!types[3].is_array);
        assert_eq!(
            types[4].base,
            BaseType::Unrecognized("Array[Text]".to_string())
        );
        assert_eq!(types[5].base, BaseType::Unrecognized("Geometry".to_string()));
        assert_eq!(types[1].to_string(), "Array[Numeric]");
    }

    #[test]
    fn entries_keep_declared_language_order() {
        let doc = json!({
            "digest": "E1",
            "attributes": [{
                "name": "color",
                "type": "Text",
                "entry_codes": {"warm": ["red"], "cold": ["blue"]},
                "entries": {
                    "pol": {"red": "czerwony", "blue": "niebieski"},
                    "eng": {"red": "red", "blue": "blue"}
                }
            }]
        });
        let bundle = bundle_from_json(&doc).unwrap();
        let attr = bundle.attribute("color").unwrap();
        let entries = attr.entries.as_ref().unwrap();
        assert_eq!(entries.0[0].0, "pol");
        assert_eq!(entries.first().unwrap()["red"], "czerwony");
        match attr.entry_codes.as_ref().unwrap() {
            EntryCodes::Grouped(groups) => {
                assert_eq!(groups[0].0, "warm");
                assert_eq!(groups[1].1, vec!["blue".to_string()]);
            }
            other => panic!("expected grouped codes, got {:?}", other),
        }
    }

    #[test]
    fn units_take_first_pair() {
        let doc = json!({
            "digest": "E1",
            "attributes": [{"name": "w", "type": "Numeric", "units": {"si": "kg"}}]
        });
        let bundle = bundle_from_json(&doc).unwrap();
        let units = bundle.attributes[0].units.as_ref().unwrap();
        assert_eq!(units.system, "si");
        assert_eq!(units.unit, "kg");
    }

    #[test]
    fn missing_digest_is_reported() {
        let err = bundle_from_json(&json!({"attributes": []})).unwrap_err();
        assert_eq!(
            err,
            InterchangeError::MissingField {
                field: "digest".to_string()
            }
        );
    }

    #[test]
    fn missing_type_is_reported() {
        let err = bundle_from_json(&json!({"digest": "E", "attributes": [{"name": "x"}]}))
            .unwrap_err();
        assert!(matches!(err, InterchangeError::AttributeError { ref name, .. } if name == "x"));
    }

    #[test]
    fn parses_presentation_with_nested_pages() {
        let doc = json!({
            "v": "1.0.0",
            "bd": "Eroot",
            "l": ["eng"],
            "p": [{"ns": "page 1", "ao": ["d", {"nr": "address", "ao": ["city"]}]}],
            "po": ["page 1"],
            "pl": {"eng": {"page 1": "First page"}},
            "i": [{"m": "web", "c": "capture", "a": {"d": {"t": "textarea"}}}]
        });
        let pres = presentation_from_json(&doc).unwrap();
        assert_eq!(pres.bundle_digest, "Eroot");
        let page = pres.find_page("page 1").unwrap();
        assert_eq!(page.entries[0], PageEntry::Attribute("d".to_string()));
        match &page.entries[1] {
            PageEntry::Page(nested) => assert_eq!(nested.reference.as_deref(), Some("address")),
            other => panic!("expected nested page, got {:?}", other),
        }
        assert_eq!(pres.page_label("eng", "page 1"), Some("First page"));
        let hints = &pres.capture_interaction().unwrap().attributes["d"];
        assert_eq!(hints.widget.as_deref(), Some("textarea"));
    }

    #[test]
    fn capture_interaction_ignores_other_media() {
        let doc = json!({
            "bd": "E",
            "i": [{"m": "paper", "c": "capture", "a": {}}]
        });
        let pres = presentation_from_json(&doc).unwrap();
        assert!(pres.capture_interaction().is_none());
    }
}
