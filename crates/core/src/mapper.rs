//! Field descriptor mapping: one attribute plus its presentation properties
//! to exactly one [`FieldDescriptor`].
//!
//! Priority, first match wins:
//! 1. an enumerated entry set always yields a choice;
//! 2. array types yield multifile (binary + file widget) or array, the
//!    element descriptor mapped recursively;
//! 3. fixed widget/primitive pairs (textarea, code scanner, file, signature);
//! 4. plain dispatch on the primitive, with date widgets selecting the date
//!    variant and reference types requiring a signature or question widget.

use crate::dates;
use crate::descriptor::*;
use crate::error::CompileError;
use crate::props::{PresentationProps, Widget};
use formc_interchange::{AttributeDef, BaseType, EntryCodes, Localized, Primitive};
use serde_json::Value;
use std::collections::BTreeMap;
use time::OffsetDateTime;

pub fn build_field(
    attr: &AttributeDef,
    props: &PresentationProps,
    reference_time: OffsetDateTime,
) -> Result<FieldDescriptor, CompileError> {
    if let Some(entries) = &attr.entries {
        return Ok(FieldDescriptor::Choice(build_choice(attr, entries, props)));
    }

    if attr.attr_type.is_array {
        let (min, max) = parse_cardinality(attr.cardinality.as_deref());
        if attr.attr_type.base == BaseType::Primitive(Primitive::Binary) && props.is(&Widget::File)
        {
            return Ok(FieldDescriptor::Multifile(MultiFileField {
                accept: None,
                max_size: None,
                min_files: min,
                max_files: max,
            }));
        }
        let element = AttributeDef {
            attr_type: attr.attr_type.element(),
            ..attr.clone()
        };
        return Ok(FieldDescriptor::Array(ArrayField {
            min_length: min,
            max_length: max,
            element_field: Box::new(build_field(&element, props, reference_time)?),
        }));
    }

    let pattern = attr.format.clone();
    let descriptor = match (&attr.attr_type.base, props.widget.as_ref()) {
        (BaseType::Primitive(Primitive::Text), Some(Widget::Textarea)) => {
            FieldDescriptor::Text(TextField {
                multiline: true,
                pattern,
            })
        }
        (BaseType::Primitive(Primitive::Text), Some(Widget::CodeScanner)) => {
            FieldDescriptor::CodeScanner(CodeScannerField { pattern })
        }
        (BaseType::Primitive(Primitive::Binary), Some(Widget::File)) => {
            FieldDescriptor::File(FileField {
                accept: None,
                max_size: None,
            })
        }
        (BaseType::Primitive(Primitive::Binary), Some(Widget::Signature)) => {
            FieldDescriptor::Signature(SignatureField::default())
        }
        (BaseType::Primitive(Primitive::Text), _) => FieldDescriptor::Text(TextField {
            multiline: false,
            pattern,
        }),
        (BaseType::Primitive(Primitive::Numeric), _) => FieldDescriptor::Number(build_number(attr, props)),
        (BaseType::Primitive(Primitive::Boolean), _) => FieldDescriptor::Checkbox,
        (BaseType::Primitive(Primitive::DateTime), Some(Widget::Date)) => {
            FieldDescriptor::Date(build_date(attr, props, reference_time))
        }
        (BaseType::Primitive(Primitive::DateTime), Some(Widget::Time)) => {
            FieldDescriptor::Time(build_date(attr, props, reference_time))
        }
        (BaseType::Primitive(Primitive::DateTime), Some(Widget::DateTime)) => {
            FieldDescriptor::Datetime(build_date(attr, props, reference_time))
        }
        (BaseType::Reference(_), Some(Widget::Signature)) => {
            FieldDescriptor::Signature(build_signature(props))
        }
        (BaseType::Reference(_), Some(Widget::Question)) => {
            FieldDescriptor::Question(QuestionField::default())
        }
        (BaseType::Primitive(Primitive::DateTime | Primitive::Binary), _)
        | (BaseType::Reference(_), _)
        | (BaseType::Unrecognized(_), _) => {
            return Err(CompileError::UnsupportedAttributeType {
                attribute: attr.name.clone(),
                attr_type: attr.attr_type.to_string(),
            })
        }
    };
    Ok(descriptor)
}

/// Mandatory only for an exact `M` marker (either case).
pub fn is_optional(conformance: Option<&str>) -> bool {
    !matches!(conformance, Some(c) if c.eq_ignore_ascii_case("m"))
}

/// Parse `"<n>"` or `"<min>-<max>"`; empty or unparseable bounds are
/// unbounded.
pub fn parse_cardinality(cardinality: Option<&str>) -> (Option<u64>, Option<u64>) {
    let Some(raw) = cardinality.filter(|c| !c.is_empty()) else {
        return (None, None);
    };
    let bound = |s: &str| s.trim().parse::<u64>().ok();
    match raw.split_once('-') {
        None => (bound(raw), bound(raw)),
        Some((min, rest)) => {
            let max = rest.split('-').next().unwrap_or_default();
            (bound(min), bound(max))
        }
    }
}

/// The display override a radio or select widget asks for, if any.
pub fn choose_display(props: &PresentationProps) -> Option<ChoiceDisplay> {
    match props.widget.as_ref()? {
        Widget::Radio => match props.orientation.as_deref() {
            Some("horizontal") => Some(ChoiceDisplay::RadioHorizontal),
            Some("vertical") => Some(ChoiceDisplay::RadioVertical),
            _ => None,
        },
        Widget::Select => match props.variant.as_deref() {
            Some("multiple") => Some(ChoiceDisplay::SelectMultiple),
            _ => None,
        },
        _ => None,
    }
}

fn build_choice(
    attr: &AttributeDef,
    entries: &Localized<BTreeMap<String, String>>,
    props: &PresentationProps,
) -> ChoiceField {
    // Labels come from the first language; the rest go to the locale files.
    let labels = entries.first();
    let variant = |code: &str, options: Option<Vec<ChoiceVariant>>| ChoiceVariant {
        name: code.to_owned(),
        label: labels.and_then(|l| l.get(code)).cloned(),
        options,
    };
    let variants = match &attr.entry_codes {
        None => Vec::new(),
        Some(EntryCodes::Flat(codes)) => codes.iter().map(|c| variant(c, None)).collect(),
        Some(EntryCodes::Grouped(groups)) => groups
            .iter()
            .map(|(group, codes)| {
                let options = codes.iter().map(|c| variant(c, None)).collect();
                variant(group, Some(options))
            })
            .collect(),
    };
    ChoiceField {
        display: DisplayType {
            kind: choose_display(props).unwrap_or(ChoiceDisplay::Select),
        },
        variants,
    }
}

fn build_number(attr: &AttributeDef, props: &PresentationProps) -> NumberField {
    let mut field = NumberField::default();
    if let Some(units) = &attr.units {
        field.unit_system = Some(units.system.clone());
        field.unit = Some(units.unit.clone());
    }
    if props.is(&Widget::Number) {
        field.range = props.range.clone();
        field.step = props.step.clone();
    }
    field
}

fn build_date(
    attr: &AttributeDef,
    props: &PresentationProps,
    reference_time: OffsetDateTime,
) -> DateField {
    let range = match props.range.as_ref().and_then(Value::as_array).map(Vec::as_slice) {
        Some([start, end]) => Some((
            date_bound(&attr.name, start, reference_time),
            date_bound(&attr.name, end, reference_time),
        )),
        _ => None,
    };
    DateField {
        format: attr.format.clone(),
        range,
    }
}

fn date_bound(attribute: &str, expr: &Value, reference_time: OffsetDateTime) -> DateBound {
    let parsed = expr
        .as_str()
        .and_then(|s| dates::parse_human_date(s, reference_time));
    if parsed.is_none() {
        tracing::warn!(attribute, bound = %expr, "unreadable date range bound");
    }
    DateBound(parsed)
}

fn build_signature(props: &PresentationProps) -> SignatureField {
    let Some(b) = &props.signature else {
        return SignatureField::default();
    };
    SignatureField {
        canvas_field_name: b.canvas.clone(),
        timestamp_field_name: b.timestamp.clone(),
        geolocation_fields_name: Some(GeolocationFields {
            latitude_field_name: b.latitude.clone(),
            longitude_field_name: b.longitude.clone(),
            accuracy_field_name: b.accuracy.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formc_interchange::{AttributeType, Units};
    use serde_json::json;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-06-01 12:00 UTC);

    fn attr(name: &str, ty: &str) -> AttributeDef {
        AttributeDef::new(name, AttributeType::parse(ty))
    }

    fn widget(tag: &str) -> PresentationProps {
        PresentationProps {
            widget: Some(Widget::parse(tag)),
            ..PresentationProps::default()
        }
    }

    fn with_entries(mut a: AttributeDef) -> AttributeDef {
        let mut entries = Localized::new();
        entries.insert(
            "eng",
            BTreeMap::from([
                ("a".to_string(), "Alpha".to_string()),
                ("b".to_string(), "Beta".to_string()),
            ]),
        );
        entries.insert("pol", BTreeMap::from([("a".to_string(), "Alfa".to_string())]));
        a.entries = Some(entries);
        a.entry_codes = Some(EntryCodes::Flat(vec!["a".into(), "b".into()]));
        a
    }

    #[test]
    fn entries_win_over_every_primitive() {
        for ty in ["Text", "Numeric", "Boolean", "DateTime", "Binary", "Array[Text]", "refs:E1"] {
            let f = build_field(&with_entries(attr("x", ty)), &PresentationProps::empty(), NOW)
                .unwrap();
            assert_eq!(f.tag(), "choice", "type {}", ty);
        }
    }

    #[test]
    fn choice_labels_from_first_language() {
        let f = build_field(&with_entries(attr("x", "Text")), &PresentationProps::empty(), NOW)
            .unwrap();
        let FieldDescriptor::Choice(choice) = f else {
            panic!("expected choice");
        };
        assert_eq!(choice.display.kind, ChoiceDisplay::Select);
        assert_eq!(choice.variants.len(), 2);
        assert_eq!(choice.variants[0].label.as_deref(), Some("Alpha"));
        assert_eq!(choice.variants[1].name, "b");
    }

    #[test]
    fn grouped_codes_nest_options() {
        let mut a = with_entries(attr("x", "Text"));
        a.entry_codes = Some(EntryCodes::Grouped(vec![(
            "grp".to_string(),
            vec!["a".to_string(), "b".to_string()],
        )]));
        let FieldDescriptor::Choice(choice) =
            build_field(&a, &PresentationProps::empty(), NOW).unwrap()
        else {
            panic!("expected choice");
        };
        assert_eq!(choice.variants.len(), 1);
        assert_eq!(choice.variants[0].name, "grp");
        assert_eq!(choice.variants[0].label, None);
        let options = choice.variants[0].options.as_ref().unwrap();
        assert_eq!(options[1].label.as_deref(), Some("Beta"));
    }

    #[test]
    fn display_overrides() {
        let mut radio = widget("radio");
        radio.orientation = Some("horizontal".into());
        assert_eq!(choose_display(&radio), Some(ChoiceDisplay::RadioHorizontal));
        radio.orientation = Some("diagonal".into());
        assert_eq!(choose_display(&radio), None);

        let mut select = widget("select");
        select.variant = Some("multiple".into());
        assert_eq!(choose_display(&select), Some(ChoiceDisplay::SelectMultiple));
        assert_eq!(choose_display(&widget("select")), None);
        assert_eq!(choose_display(&widget("textarea")), None);
    }

    #[test]
    fn cardinality_bounds() {
        assert_eq!(parse_cardinality(Some("2-5")), (Some(2), Some(5)));
        assert_eq!(parse_cardinality(Some("3")), (Some(3), Some(3)));
        assert_eq!(parse_cardinality(Some("1-")), (Some(1), None));
        assert_eq!(parse_cardinality(Some("-4")), (None, Some(4)));
        assert_eq!(parse_cardinality(None), (None, None));
        assert_eq!(parse_cardinality(Some("")), (None, None));
    }

    #[test]
    fn array_wraps_recursive_element() {
        let mut a = attr("tags", "Array[Text]");
        a.cardinality = Some("2-5".into());
        let FieldDescriptor::Array(arr) = build_field(&a, &PresentationProps::empty(), NOW).unwrap()
        else {
            panic!("expected array");
        };
        assert_eq!((arr.min_length, arr.max_length), (Some(2), Some(5)));
        assert_eq!(arr.element_field.tag(), "text");
    }

    #[test]
    fn binary_array_with_file_widget_is_multifile() {
        let mut a = attr("scans", "Array[Binary]");
        a.cardinality = Some("1-".into());
        let f = build_field(&a, &widget("file"), NOW).unwrap();
        assert_eq!(
            f,
            FieldDescriptor::Multifile(MultiFileField {
                accept: None,
                max_size: None,
                min_files: Some(1),
                max_files: None,
            })
        );
    }

    #[test]
    fn question_array_maps_element_to_question() {
        let f = build_field(&attr("qs", "Array[refs:E1]"), &widget("question"), NOW).unwrap();
        let FieldDescriptor::Array(arr) = f else {
            panic!("expected array");
        };
        assert_eq!(arr.element_field.tag(), "question");
    }

    #[test]
    fn widget_pairs() {
        let mut text = attr("t", "Text");
        text.format = Some("^[a-z]+$".into());
        assert_eq!(
            build_field(&text, &widget("textarea"), NOW).unwrap(),
            FieldDescriptor::Text(TextField {
                multiline: true,
                pattern: Some("^[a-z]+$".into())
            })
        );
        assert_eq!(build_field(&text, &widget("code_scanner"), NOW).unwrap().tag(), "code_scanner");
        assert_eq!(build_field(&text, &widget("list"), NOW).unwrap().tag(), "text");
        let bin = attr("b", "Binary");
        assert_eq!(build_field(&bin, &widget("file"), NOW).unwrap().tag(), "file");
        assert_eq!(build_field(&bin, &widget("signature"), NOW).unwrap().tag(), "signature");
    }

    #[test]
    fn number_units_and_range() {
        let mut a = attr("w", "Numeric");
        a.units = Some(Units {
            system: "si".into(),
            unit: "kg".into(),
        });
        let mut props = widget("number");
        props.range = Some(json!([0, 100]));
        props.step = Some(json!(5));
        let FieldDescriptor::Number(n) = build_field(&a, &props, NOW).unwrap() else {
            panic!("expected number");
        };
        assert_eq!(n.unit_system.as_deref(), Some("si"));
        assert_eq!(n.unit.as_deref(), Some("kg"));
        assert_eq!(n.range, Some(json!([0, 100])));
        assert_eq!(n.step, Some(json!(5)));
    }

    #[test]
    fn boolean_is_checkbox() {
        assert_eq!(
            build_field(&attr("ok", "Boolean"), &PresentationProps::empty(), NOW).unwrap(),
            FieldDescriptor::Checkbox
        );
    }

    #[test]
    fn datetime_needs_a_date_widget() {
        let a = attr("when", "DateTime");
        let err = build_field(&a, &PresentationProps::empty(), NOW).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnsupportedAttributeType {
                attribute: "when".into(),
                attr_type: "DateTime".into()
            }
        );
        assert_eq!(build_field(&a, &widget("time"), NOW).unwrap().tag(), "time");
        assert_eq!(build_field(&a, &widget("datetime"), NOW).unwrap().tag(), "datetime");
    }

    #[test]
    fn date_range_is_parsed() {
        let mut props = widget("date");
        props.range = Some(json!(["2000-01-01", "today"]));
        let FieldDescriptor::Date(d) = build_field(&attr("dob", "DateTime"), &props, NOW).unwrap()
        else {
            panic!("expected date");
        };
        let (start, end) = d.range.unwrap();
        assert_eq!(start, DateBound(Some(datetime!(2000-01-01 0:00 UTC))));
        assert_eq!(end, DateBound(Some(datetime!(2024-06-01 0:00 UTC))));

        props.range = Some(json!(["whenever"]));
        let FieldDescriptor::Date(d) = build_field(&attr("dob", "DateTime"), &props, NOW).unwrap()
        else {
            panic!("expected date");
        };
        assert!(d.range.is_none());
    }

    #[test]
    fn reference_signature_carries_bindings() {
        let mut props = widget("signature");
        props.signature = Some(crate::props::SignatureBindings {
            canvas: Some("img".into()),
            timestamp: Some("ts".into()),
            ..Default::default()
        });
        let FieldDescriptor::Signature(sig) = build_field(&attr("s", "refs:E1"), &props, NOW).unwrap()
        else {
            panic!("expected signature");
        };
        assert_eq!(sig.canvas_field_name.as_deref(), Some("img"));
        assert_eq!(sig.timestamp_field_name.as_deref(), Some("ts"));
        assert!(sig.geolocation_fields_name.is_some());
    }

    #[test]
    fn bare_reference_is_unsupported() {
        let err = build_field(&attr("r", "refs:E1"), &PresentationProps::empty(), NOW).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedAttributeType { .. }));
        let err = build_field(&attr("g", "Geometry"), &widget("textarea"), NOW).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedAttributeType { .. }));
    }

    #[test]
    fn conformance_marker() {
        assert!(!is_optional(Some("M")));
        assert!(!is_optional(Some("m")));
        assert!(is_optional(Some("O")));
        assert!(is_optional(Some("MM")));
        assert!(is_optional(None));
    }
}
