//! Locale dictionaries, one per requested language.
//!
//! Keys mirror the form IR: attribute strings live under
//! `<path>.label` / `<path>.placeholder` / `<path>.entries`, page titles
//! under the page's title key, bundle metadata under `name` and
//! `description`.

use crate::path::Path;
use formc_interchange::{AttributeDef, SchemaBundle};
use serde::Serialize;
use std::collections::BTreeMap;

/// Shown when a bundle has no name in a language.
pub const MISSING_NAME: &str = "\u{2014}";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct I18n {
    pub locales: BTreeMap<String, Locale>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Locale {
    #[serde(rename = "a")]
    pub attributes: BTreeMap<String, LocaleText>,
    #[serde(rename = "p")]
    pub pages: BTreeMap<String, String>,
    #[serde(rename = "m")]
    pub meta: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LocaleText {
    Text(String),
    /// Entry code -> label.
    Entries(BTreeMap<String, String>),
}

impl LocaleText {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            LocaleText::Text(s) => Some(s),
            LocaleText::Entries(_) => None,
        }
    }
}

impl I18n {
    /// Empty dictionaries for each requested language.
    pub fn for_languages(languages: &[String]) -> Self {
        I18n {
            locales: languages
                .iter()
                .map(|l| (l.clone(), Locale::default()))
                .collect(),
        }
    }

    pub fn locale(&self, lang: &str) -> Option<&Locale> {
        self.locales.get(lang)
    }

    /// Label, placeholder and entry labels of one attribute, for every
    /// language that has them.
    pub fn record_attribute(&mut self, path: &Path, attr: &AttributeDef) {
        for (lang, locale) in self.locales.iter_mut() {
            if let Some(label) = attr.labels.get(lang) {
                locale
                    .attributes
                    .insert(path.key("label"), LocaleText::Text(label.clone()));
            }
            if let Some(info) = attr.informations.get(lang) {
                locale
                    .attributes
                    .insert(path.key("placeholder"), LocaleText::Text(info.clone()));
            }
            if let Some(entries) = attr.entries.as_ref().and_then(|e| e.get(lang)) {
                locale
                    .attributes
                    .insert(path.key("entries"), LocaleText::Entries(entries.clone()));
            }
        }
    }

    pub fn record_page_title(&mut self, lang: &str, key: &str, title: &str) {
        if let Some(locale) = self.locales.get_mut(lang) {
            locale.pages.insert(key.to_owned(), title.to_owned());
        }
    }

    /// Bundle name and description from the base bundle's own metadata.
    pub fn record_bundle_meta(&mut self, bundle: &SchemaBundle) {
        for (lang, locale) in self.locales.iter_mut() {
            let meta = bundle.meta.get(lang);
            let name = meta
                .and_then(|m| m.name.clone())
                .unwrap_or_else(|| MISSING_NAME.to_owned());
            locale.meta.insert("name".to_owned(), name);
            if let Some(description) = meta.and_then(|m| m.description.clone()) {
                locale.meta.insert("description".to_owned(), description);
            }
        }
    }
}
