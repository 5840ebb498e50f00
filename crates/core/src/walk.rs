//! Presentation tree walk: page specs to nested page/field nodes.
//!
//! The walker holds the read-only context of one compilation. Locale
//! strings and list metadata are written into an [`Accumulators`] value
//! that every recursive call receives explicitly.

use crate::descriptor::*;
use crate::error::CompileError;
use crate::locale::I18n;
use crate::mapper::{self, build_field, is_optional};
use crate::meta::{ListIdentifier, MetadataTree, ID_KEY};
use crate::path::Path;
use crate::props::{PresentationProps, Widget};
use crate::resolve::{BundleRegistry, DependencyMap};
use formc_interchange::{
    AttributeDef, AttributeHints, BaseType, EntryCodes, Interaction, Localized, PageEntry, PageSpec,
    Presentation, Primitive, SchemaBundle,
};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Language whose entry labels back the boolean radio prefill.
pub const DEFAULT_LANG: &str = "eng";

/// Caller-supplied visibility rules, by fully-qualified path.
pub type Conditionals = BTreeMap<String, Value>;

/// Side outputs written during the walk.
#[derive(Debug, Default)]
pub struct Accumulators {
    pub i18n: I18n,
    pub meta: MetadataTree,
}

/// How a page spec names itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAddress<'s> {
    /// `n`: deprecated, behaves like `nr`.
    Deprecated(&'s str),
    /// `nr`: embeds a reference-typed attribute.
    Reference(&'s str),
    /// `ns`: a grouping with no backing attribute.
    Synthetic(&'s str),
}

impl<'s> PageAddress<'s> {
    pub fn of(spec: &'s PageSpec) -> Result<Self, CompileError> {
        match (
            spec.name.as_deref(),
            spec.reference.as_deref(),
            spec.synthetic.as_deref(),
        ) {
            (Some(_), Some(r), Some(_)) | (None, Some(r), Some(_)) => {
                Err(CompileError::ConflictingPageAddressing {
                    page: r.to_owned(),
                    detail: "cannot have 'nr' and 'ns' attributes at the same time".to_owned(),
                })
            }
            (Some(n), Some(_), None) | (Some(n), None, Some(_)) => {
                Err(CompileError::ConflictingPageAddressing {
                    page: n.to_owned(),
                    detail: "cannot have 'n' and 'nr' or 'ns' attributes at the same time"
                        .to_owned(),
                })
            }
            (Some(n), None, None) => Ok(PageAddress::Deprecated(n)),
            (None, Some(r), None) => Ok(PageAddress::Reference(r)),
            (None, None, Some(s)) => Ok(PageAddress::Synthetic(s)),
            (None, None, None) => Err(CompileError::UnnamedPage),
        }
    }

    pub fn name(&self) -> &'s str {
        match *self {
            PageAddress::Deprecated(n) | PageAddress::Reference(n) | PageAddress::Synthetic(n) => n,
        }
    }
}

pub struct Walker<'a> {
    pub presentation: &'a Presentation,
    pub interaction: Option<&'a Interaction>,
    pub registry: &'a BundleRegistry<'a>,
    pub dependencies: &'a DependencyMap,
    pub conditionals: &'a Conditionals,
    pub readonly: &'a [Path],
    pub reference_time: OffsetDateTime,
}

impl<'a> Walker<'a> {
    /// Build one top-level page from its spec.
    pub fn top_level_page(
        &self,
        page_name: &str,
        spec: &PageSpec,
        base: &SchemaBundle,
        acc: &mut Accumulators,
    ) -> Result<PageNode, CompileError> {
        let address = PageAddress::of(spec)?;
        if let PageAddress::Deprecated(n) = address {
            warn_deprecated(n);
        }

        let mut page = PageNode::new(PageKind::Page, page_name, page_name);
        for lang in &self.presentation.languages {
            let Some(labels) = self.presentation.page_labels.get(lang) else {
                tracing::error!(
                    lang = %lang,
                    presentation = self.presentation.digest.as_deref().unwrap_or_default(),
                    "no presentation labels found for language"
                );
                continue;
            };
            match labels.get(page_name) {
                Some(title) => acc.i18n.record_page_title(lang, page_name, title),
                None => tracing::warn!(page = page_name, lang = %lang, "no page label"),
            }
        }
        page.fields = self.walk_entries(spec, base, &Path::root(), acc)?;
        Ok(page)
    }

    /// Turn every entry of `spec` into a node, reading attributes from
    /// `bundle` and qualifying names with `prefix`.
    pub fn walk_entries(
        &self,
        spec: &PageSpec,
        bundle: &SchemaBundle,
        prefix: &Path,
        acc: &mut Accumulators,
    ) -> Result<Vec<FormNode>, CompileError> {
        let mut nodes = Vec::with_capacity(spec.entries.len());
        for entry in &spec.entries {
            let node = match entry {
                PageEntry::Attribute(name) => {
                    let attr = find_attribute(bundle, name)?;
                    FormNode::Field(self.field_entry(attr, bundle, prefix, acc)?)
                }
                PageEntry::Page(nested) => {
                    FormNode::Page(self.nested_page(nested, bundle, prefix, acc)?)
                }
            };
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// One attribute as a field entry, with its locale strings recorded.
    pub fn field_entry(
        &self,
        attr: &AttributeDef,
        bundle: &SchemaBundle,
        prefix: &Path,
        acc: &mut Accumulators,
    ) -> Result<FieldEntry, CompileError> {
        let path = prefix.child(&attr.name);
        let hints = self.hints(&path);
        let props = PresentationProps::from_hints(hints);
        let attr = prefill(attr, &props);
        let optional = is_optional(attr.conformance.as_deref());

        let mut field = build_field(&attr, &props, self.reference_time)?;

        if let Some(hints) = hints.filter(|_| props.is(&Widget::Question)) {
            if attr.attr_type.reference().is_some() {
                let (answer, extras) =
                    self.question_parts(&attr, hints, bundle, &path, optional, acc)?;
                if let Some(question) = question_slot(&mut field) {
                    question.answer = Some(Box::new(answer));
                    question.additional_fields = extras;
                }
            }
        }

        acc.i18n.record_attribute(&path, &attr);

        Ok(FieldEntry {
            name: attr.name.clone(),
            label: Some(path.key("label")),
            optional,
            readonly: self.is_readonly(&path),
            condition: self.conditionals.get(&path.to_string()).cloned(),
            field,
        })
    }

    /// The answer field and option-dependent extra fields of a question.
    fn question_parts(
        &self,
        attr: &AttributeDef,
        hints: &AttributeHints,
        bundle: &SchemaBundle,
        path: &Path,
        optional: bool,
        acc: &mut Accumulators,
    ) -> Result<(FieldEntry, Option<PageNode>), CompileError> {
        let dep = self.find_dependency(bundle, &attr.name)?;
        let answer_name = hints.answer.as_deref().unwrap_or_default();
        let answer_attr = find_attribute(dep, answer_name)?;
        let mut answer = self.field_entry(answer_attr, dep, path, acc)?;
        if !optional {
            answer.optional = false;
        }
        let answer_path = path.child(&answer_attr.name);

        let mut extras = Vec::new();
        let options = hints.options.as_ref().and_then(Value::as_object);
        for (option, defs) in options.into_iter().flatten() {
            for def in defs.as_array().into_iter().flatten() {
                let (name, effects) = match def {
                    Value::String(name) => (name.as_str(), json!(["display"])),
                    other => (
                        other.get("an").and_then(Value::as_str).unwrap_or_default(),
                        other.get("e").cloned().unwrap_or_else(|| json!(["display"])),
                    ),
                };
                let extra_attr = find_attribute(dep, name)?;
                let mut extra = self.field_entry(extra_attr, dep, path, acc)?;
                let extra_path = path.child(&extra.name);
                if !self.conditionals.contains_key(&extra_path.to_string()) {
                    extra.condition = Some(answer_rule(&answer_path, option, effects));
                }
                extras.push(FormNode::Field(extra));
            }
        }

        let extras = (!extras.is_empty()).then(|| PageNode {
            fields: extras,
            ..PageNode::new(PageKind::Struct, path.to_string(), "")
        });
        Ok((answer, extras))
    }

    /// A nested page: a reference embedding (`nr`/`n`) or a synthetic
    /// grouping (`ns`).
    fn nested_page(
        &self,
        spec: &PageSpec,
        bundle: &SchemaBundle,
        prefix: &Path,
        acc: &mut Accumulators,
    ) -> Result<PageNode, CompileError> {
        let address = PageAddress::of(spec)?;
        let name = address.name();
        let path = prefix.child(name);
        let mut page = PageNode::new(PageKind::Struct, name, format!("page.{}.title", name));
        page.condition = self.conditionals.get(&path.to_string()).cloned();

        match address {
            PageAddress::Synthetic(_) => {
                for lang in &self.presentation.languages {
                    match self.presentation.page_label(lang, name) {
                        Some(title) => acc.i18n.record_page_title(lang, &page.title, title),
                        None => tracing::warn!(page = name, lang = %lang, "no page label"),
                    }
                }
                page.fields = self.walk_entries(spec, bundle, &path, acc)?;
            }
            PageAddress::Deprecated(_) | PageAddress::Reference(_) => {
                if let PageAddress::Deprecated(n) = address {
                    warn_deprecated(n);
                }
                let attr = find_attribute(bundle, name)?;
                self.record_reference_title(attr, &page.title, acc);
                if attr.attr_type.reference().is_none() {
                    return Err(CompileError::NotAReference {
                        attribute: attr.name.clone(),
                        attr_type: attr.attr_type.to_string(),
                    });
                }
                let dep = self.find_dependency(bundle, name)?;

                if attr.attr_type.is_array {
                    let list = self.list_entry(attr, spec, dep, &path, acc)?;
                    page.fields = vec![FormNode::Field(list)];
                } else {
                    page.fields = self.walk_entries(spec, dep, &path, acc)?;
                }
            }
        }
        Ok(page)
    }

    /// A repeatable reference: one list field whose element fields are the
    /// nested entries, plus a hidden identifier when one is requested.
    fn list_entry(
        &self,
        attr: &AttributeDef,
        spec: &PageSpec,
        dep: &SchemaBundle,
        path: &Path,
        acc: &mut Accumulators,
    ) -> Result<FieldEntry, CompileError> {
        let id_field = self.list_identifier(path, acc)?;
        let mut element_fields = self.walk_entries(spec, dep, path, acc)?;
        element_fields.extend(id_field.map(FormNode::Field));

        let (min_length, max_length) = mapper::parse_cardinality(attr.cardinality.as_deref());
        Ok(FieldEntry {
            name: attr.name.clone(),
            label: Some(path.key("label")),
            optional: is_optional(attr.conformance.as_deref()),
            readonly: self.is_readonly(path),
            condition: None,
            field: FieldDescriptor::List(ListField {
                min_length,
                max_length,
                element_fields,
            }),
        })
    }

    /// Validate a list's identifier request, record it in the metadata tree
    /// and build the hidden `_id` field.
    fn list_identifier(
        &self,
        path: &Path,
        acc: &mut Accumulators,
    ) -> Result<Option<FieldEntry>, CompileError> {
        let Some(hints) = self.hints(path) else {
            return Ok(None);
        };
        if hints.widget.as_deref() != Some("list") {
            return Ok(None);
        }
        let id = match &hints.id {
            Some(id) if is_truthy(id) => id.clone(),
            _ => return Ok(None),
        };
        let format = hints
            .idt
            .as_ref()
            .and_then(Value::as_str)
            .and_then(IdFormat::parse)
            .ok_or_else(|| CompileError::InvalidListIdentifierFormat {
                attribute: path.to_string(),
                found: hints
                    .idt
                    .as_ref()
                    .map_or_else(|| "(none)".to_owned(), Value::to_string),
            })?;

        acc.meta
            .record_list_identifier(path, ListIdentifier { id, format });

        Ok(Some(FieldEntry {
            name: ID_KEY.to_owned(),
            label: None,
            optional: true,
            readonly: false,
            condition: None,
            field: FieldDescriptor::Hidden(HiddenField {
                format,
                on_item_remove: hints.on_item_remove.clone(),
            }),
        }))
    }

    fn record_reference_title(&self, attr: &AttributeDef, key: &str, acc: &mut Accumulators) {
        if attr.labels.is_empty() {
            tracing::warn!(attribute = %attr.name, "no labels found for attribute");
        }
        for lang in &self.presentation.languages {
            match attr.labels.get(lang) {
                Some(label) => acc.i18n.record_page_title(lang, key, label),
                None => tracing::warn!(
                    attribute = %attr.name,
                    lang = %lang,
                    "no label found for attribute in language"
                ),
            }
        }
    }

    fn hints(&self, path: &Path) -> Option<&'a AttributeHints> {
        self.interaction?.attributes.get(&path.to_string())
    }

    fn is_readonly(&self, path: &Path) -> bool {
        self.readonly.iter().any(|ro| path.is_within(ro))
    }

    /// The bundle a previously resolved reference points at.
    fn find_dependency(
        &self,
        owner: &SchemaBundle,
        attribute: &str,
    ) -> Result<&'a SchemaBundle, CompileError> {
        self.dependencies
            .get(&owner.digest, attribute)
            .and_then(|digest| self.registry.get(digest))
            .ok_or_else(|| CompileError::MissingDependencyForFind {
                attribute: attribute.to_owned(),
                bundle: owner.digest.clone(),
            })
    }
}

fn find_attribute<'b>(bundle: &'b SchemaBundle, name: &str) -> Result<&'b AttributeDef, CompileError> {
    bundle
        .attribute(name)
        .ok_or_else(|| CompileError::AttributeNotFound {
            attribute: name.to_owned(),
            bundle: bundle.digest.clone(),
        })
}

fn warn_deprecated(name: &str) {
    tracing::warn!(
        page = name,
        "[DEPRECATED] page attribute 'n' is deprecated, use 'nr' or 'ns' instead"
    );
}

/// A boolean shown as radio buttons becomes a yes/no choice.
fn prefill<'b>(attr: &'b AttributeDef, props: &PresentationProps) -> Cow<'b, AttributeDef> {
    let is_bool = !attr.attr_type.is_array
        && attr.attr_type.base == BaseType::Primitive(Primitive::Boolean);
    if !(is_bool && props.is(&Widget::Radio)) {
        return Cow::Borrowed(attr);
    }
    let mut filled = attr.clone();
    let mut entries = Localized::new();
    entries.insert(
        DEFAULT_LANG,
        BTreeMap::from([
            ("true".to_owned(), "prefill.yes".to_owned()),
            ("false".to_owned(), "prefill.no".to_owned()),
        ]),
    );
    filled.entries = Some(entries);
    filled.entry_codes = Some(EntryCodes::Flat(vec!["true".to_owned(), "false".to_owned()]));
    Cow::Owned(filled)
}

/// Where a question's answer and extras attach: the descriptor itself, or
/// the element of a question array.
fn question_slot(field: &mut FieldDescriptor) -> Option<&mut QuestionField> {
    match field {
        FieldDescriptor::Question(q) => Some(q),
        FieldDescriptor::Array(arr) => match arr.element_field.as_mut() {
            FieldDescriptor::Question(q) => Some(q),
            _ => None,
        },
        _ => None,
    }
}

/// "Show when the answer equals `option`" as a rule-engine condition.
fn answer_rule(answer_path: &Path, option: &str, effects: Value) -> Value {
    let (fact, path) = answer_path
        .split_head()
        .map(|(head, tail)| (head.to_owned(), tail))
        .unwrap_or_default();
    json!([{
        "conditions": {
            "all": [{
                "fact": fact,
                "path": path,
                "operator": "equal",
                "value": option,
            }]
        },
        "effects": effects,
    }])
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
