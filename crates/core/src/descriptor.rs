//! The form intermediate representation: pages, field entries and field
//! descriptors.
//!
//! Serialization matches what form renderers consume: descriptors are
//! internally tagged by `type`, properties are camelCase, absent optional
//! properties are omitted and unknown bounds are `null`.

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

/// The compiled form: top-level pages in presentation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Form {
    pub pages: Vec<PageNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// A top-level page.
    Page,
    /// A nested section (reference, synthetic group, question extras).
    Struct,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageNode {
    #[serde(rename = "type")]
    pub kind: PageKind,
    pub name: String,
    /// Locale key of the title (a `p` entry).
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
    pub fields: Vec<FormNode>,
}

impl PageNode {
    pub fn new(kind: PageKind, name: impl Into<String>, title: impl Into<String>) -> Self {
        PageNode {
            kind,
            name: name.into(),
            title: title.into(),
            condition: None,
            fields: Vec::new(),
        }
    }
}

/// A child of a page: a field or a nested page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormNode {
    Field(FieldEntry),
    Page(PageNode),
}

impl FormNode {
    pub fn name(&self) -> &str {
        match self {
            FormNode::Field(f) => &f.name,
            FormNode::Page(p) => &p.name,
        }
    }

    pub fn as_field(&self) -> Option<&FieldEntry> {
        match self {
            FormNode::Field(f) => Some(f),
            FormNode::Page(_) => None,
        }
    }

    pub fn as_page(&self) -> Option<&PageNode> {
        match self {
            FormNode::Page(p) => Some(p),
            FormNode::Field(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldEntry {
    pub name: String,
    /// Locale key of the label (an `a` entry).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub optional: bool,
    pub readonly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
    pub field: FieldDescriptor,
}

// ── Descriptors ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldDescriptor {
    Choice(ChoiceField),
    Array(ArrayField),
    Multifile(MultiFileField),
    List(ListField),
    Text(TextField),
    CodeScanner(CodeScannerField),
    File(FileField),
    Signature(SignatureField),
    Number(NumberField),
    Checkbox,
    Date(DateField),
    Time(DateField),
    Datetime(DateField),
    Question(QuestionField),
    Hidden(HiddenField),
}

impl FieldDescriptor {
    /// The serialized `type` tag.
    pub fn tag(&self) -> &'static str {
        match self {
            FieldDescriptor::Choice(_) => "choice",
            FieldDescriptor::Array(_) => "array",
            FieldDescriptor::Multifile(_) => "multifile",
            FieldDescriptor::List(_) => "list",
            FieldDescriptor::Text(_) => "text",
            FieldDescriptor::CodeScanner(_) => "code_scanner",
            FieldDescriptor::File(_) => "file",
            FieldDescriptor::Signature(_) => "signature",
            FieldDescriptor::Number(_) => "number",
            FieldDescriptor::Checkbox => "checkbox",
            FieldDescriptor::Date(_) => "date",
            FieldDescriptor::Time(_) => "time",
            FieldDescriptor::Datetime(_) => "datetime",
            FieldDescriptor::Question(_) => "question",
            FieldDescriptor::Hidden(_) => "hidden",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChoiceDisplay {
    Select,
    SelectMultiple,
    RadioHorizontal,
    RadioVertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayType {
    #[serde(rename = "type")]
    pub kind: ChoiceDisplay,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceField {
    pub display: DisplayType,
    pub variants: Vec<ChoiceVariant>,
}

/// One selectable code; group variants carry nested `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceVariant {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ChoiceVariant>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayField {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub element_field: Box<FieldDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiFileField {
    pub accept: Option<String>,
    pub max_size: Option<u64>,
    pub min_files: Option<u64>,
    pub max_files: Option<u64>,
}

/// A repeatable group of fields built from an array-of-reference attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListField {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub element_fields: Vec<FormNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextField {
    pub multiline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeScannerField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileField {
    pub accept: Option<String>,
    pub max_size: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canvas_field_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_field_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geolocation_fields_name: Option<GeolocationFields>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeolocationFields {
    pub latitude_field_name: Option<String>,
    pub longitude_field_name: Option<String>,
    pub accuracy_field_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<Value>,
}

/// A parsed date bound; `None` when the expression could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateBound(#[serde(with = "time::serde::rfc3339::option")] pub Option<OffsetDateTime>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateField {
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<(DateBound, DateBound)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<Box<FieldEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_fields: Option<PageNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdFormat {
    Uuid,
    Bigint,
}

impl IdFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "uuid" => Some(IdFormat::Uuid),
            "bigint" => Some(IdFormat::Bigint),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HiddenField {
    pub format: IdFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_item_remove: Option<Value>,
}
