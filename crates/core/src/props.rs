//! Presentation properties: the interaction hints for one attribute path,
//! resolved into the record the field mapper dispatches on.

use formc_interchange::AttributeHints;
use serde_json::Value;

/// Capture widget tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
    Radio,
    Select,
    Textarea,
    File,
    Signature,
    Date,
    Time,
    DateTime,
    Number,
    CodeScanner,
    Question,
    List,
    Other(String),
}

impl Widget {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "radio" => Widget::Radio,
            "select" => Widget::Select,
            "textarea" => Widget::Textarea,
            "file" => Widget::File,
            "signature" => Widget::Signature,
            "date" => Widget::Date,
            "time" => Widget::Time,
            "datetime" => Widget::DateTime,
            "number" => Widget::Number,
            "code_scanner" => Widget::CodeScanner,
            "question" => Widget::Question,
            "list" => Widget::List,
            other => Widget::Other(other.to_owned()),
        }
    }
}

/// Signature capture bindings: the sibling fields receiving the canvas
/// image and geolocation readings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureBindings {
    pub canvas: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub accuracy: Option<String>,
    pub timestamp: Option<String>,
}

impl SignatureBindings {
    fn from_value(m: &Value) -> Self {
        let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_owned);
        let geo = m.get("geolocation");
        SignatureBindings {
            canvas: text(m.get("canvas")),
            latitude: text(geo.and_then(|g| g.get("latitude"))),
            longitude: text(geo.and_then(|g| g.get("longitude"))),
            accuracy: text(geo.and_then(|g| g.get("accuracy"))),
            timestamp: text(geo.and_then(|g| g.get("timestamp"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresentationProps {
    pub widget: Option<Widget>,
    pub orientation: Option<String>,
    pub variant: Option<String>,
    /// Numeric range (copied verbatim) or date range (two expressions).
    pub range: Option<Value>,
    pub step: Option<Value>,
    pub signature: Option<SignatureBindings>,
}

impl PresentationProps {
    pub fn empty() -> Self {
        PresentationProps::default()
    }

    /// Pick the properties relevant to the hinted widget.
    pub fn from_hints(hints: Option<&AttributeHints>) -> Self {
        let Some(hints) = hints else {
            return PresentationProps::empty();
        };
        let widget = hints.widget.as_deref().map(Widget::parse);
        let mut props = PresentationProps {
            widget: widget.clone(),
            ..PresentationProps::default()
        };
        match widget {
            Some(Widget::Number) => {
                props.range = hints.range.clone();
                props.step = hints.step.clone();
            }
            Some(Widget::Date | Widget::Time | Widget::DateTime) => {
                props.range = hints.range.clone();
            }
            _ => {
                props.orientation = hints
                    .options
                    .as_ref()
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                props.variant = hints.variant.clone();
            }
        }
        if let (Some(Widget::Signature), Some(m)) = (&props.widget, &hints.bindings) {
            props.signature = Some(SignatureBindings::from_value(m));
        }
        props
    }

    pub fn is(&self, widget: &Widget) -> bool {
        self.widget.as_ref() == Some(widget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hints(v: Value) -> AttributeHints {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn radio_keeps_orientation() {
        let h = hints(json!({"t": "radio", "o": "vertical"}));
        let props = PresentationProps::from_hints(Some(&h));
        assert_eq!(props.widget, Some(Widget::Radio));
        assert_eq!(props.orientation.as_deref(), Some("vertical"));
        assert!(props.range.is_none());
    }

    #[test]
    fn number_keeps_range_and_step_only() {
        let h = hints(json!({"t": "number", "r": [0, 10], "s": 0.5, "va": "ignored"}));
        let props = PresentationProps::from_hints(Some(&h));
        assert_eq!(props.range, Some(json!([0, 10])));
        assert_eq!(props.step, Some(json!(0.5)));
        assert!(props.variant.is_none());
    }

    #[test]
    fn question_options_map_is_not_an_orientation() {
        let h = hints(json!({"t": "question", "answer": "a", "o": {"yes": ["x"]}}));
        let props = PresentationProps::from_hints(Some(&h));
        assert_eq!(props.widget, Some(Widget::Question));
        assert!(props.orientation.is_none());
    }

    #[test]
    fn signature_bindings() {
        let h = hints(json!({
            "t": "signature",
            "m": {"canvas": "img", "geolocation": {"latitude": "lat", "timestamp": "ts"}}
        }));
        let props = PresentationProps::from_hints(Some(&h));
        let sig = props.signature.unwrap();
        assert_eq!(sig.canvas.as_deref(), Some("img"));
        assert_eq!(sig.latitude.as_deref(), Some("lat"));
        assert_eq!(sig.longitude, None);
        assert_eq!(sig.timestamp.as_deref(), Some("ts"));
    }

    #[test]
    fn unknown_widget_is_kept() {
        let h = hints(json!({"t": "slider"}));
        let props = PresentationProps::from_hints(Some(&h));
        assert_eq!(props.widget, Some(Widget::Other("slider".to_string())));
        assert_eq!(PresentationProps::from_hints(None), PresentationProps::empty());
    }
}
