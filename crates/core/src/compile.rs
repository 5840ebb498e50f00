//! The compile pipeline: digest check, dependency resolution, page walk.

use crate::descriptor::{Form, PageNode};
use crate::error::CompileError;
use crate::locale::I18n;
use crate::meta::MetadataTree;
use crate::path::Path;
use crate::resolve::{resolve_dependencies, BundleRegistry};
use crate::walk::{Accumulators, Conditionals, Walker};
use formc_interchange::{
    bundle_from_json, presentation_from_json, InterchangeError, Presentation, SchemaBundle,
};
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

/// Knobs that do not come from the input documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Anchor for relative date expressions in range hints.
    pub reference_time: OffsetDateTime,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            reference_time: OffsetDateTime::UNIX_EPOCH,
        }
    }
}

/// Everything one compilation reads.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub bundle: &'a SchemaBundle,
    pub dependencies: &'a [SchemaBundle],
    pub presentation: &'a Presentation,
    pub conditionals: &'a Conditionals,
    pub readonly: &'a [Path],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledForm {
    pub form: Form,
    pub i18n: I18n,
    pub meta: MetadataTree,
}

/// Compile a bundle and its presentation into a form, its locale strings
/// and list metadata.
///
/// Fails on the first fatal condition; nothing partial is returned.
pub fn compile(
    request: CompileRequest<'_>,
    options: &CompileOptions,
) -> Result<CompiledForm, CompileError> {
    let CompileRequest {
        bundle,
        dependencies,
        presentation,
        conditionals,
        readonly,
    } = request;

    if presentation.bundle_digest != bundle.digest {
        return Err(CompileError::PresentationBundleMismatch {
            presentation: presentation.bundle_digest.clone(),
            bundle: bundle.digest.clone(),
        });
    }

    let registry = BundleRegistry::new(dependencies);
    let dependency_map = resolve_dependencies(bundle, &registry)?;

    let walker = Walker {
        presentation,
        interaction: presentation.capture_interaction(),
        registry: &registry,
        dependencies: &dependency_map,
        conditionals,
        readonly,
        reference_time: options.reference_time,
    };
    let mut acc = Accumulators {
        i18n: I18n::for_languages(&presentation.languages),
        meta: MetadataTree::new(),
    };

    let mut pages: Vec<PageNode> = Vec::with_capacity(presentation.page_order.len());
    for page_name in &presentation.page_order {
        let Some(spec) = presentation.find_page(page_name) else {
            tracing::warn!(page = %page_name, "page listed in page order not found, skipping");
            continue;
        };
        pages.push(walker.top_level_page(page_name, spec, bundle, &mut acc)?);
    }

    acc.i18n.record_bundle_meta(bundle);

    tracing::debug!(
        bundle = %bundle.digest,
        pages = pages.len(),
        languages = presentation.languages.len(),
        "form compiled"
    );

    Ok(CompiledForm {
        form: Form { pages },
        i18n: acc.i18n,
        meta: acc.meta,
    })
}

/// Parse the JSON documents and compile them.
///
/// `conditionals` must be a JSON object (or `null` for none); `readonly`
/// holds dotted paths.
pub fn compile_json(
    bundle: &Value,
    dependencies: &[Value],
    presentation: &Value,
    conditionals: &Value,
    readonly: &[String],
    options: &CompileOptions,
) -> Result<CompiledForm, CompileError> {
    let bundle = bundle_from_json(bundle)?;
    let dependencies = dependencies
        .iter()
        .map(bundle_from_json)
        .collect::<Result<Vec<_>, _>>()?;
    let presentation = presentation_from_json(presentation)?;
    let conditionals: Conditionals = match conditionals {
        Value::Null => Conditionals::new(),
        Value::Object(rules) => rules.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        other => {
            return Err(InterchangeError::InvalidDocument(format!(
                "conditionals must be an object keyed by attribute path, found {}",
                json_kind(other)
            ))
            .into())
        }
    };
    let readonly: Vec<Path> = readonly.iter().map(|p| Path::parse(p)).collect();

    compile(
        CompileRequest {
            bundle: &bundle,
            dependencies: &dependencies,
            presentation: &presentation,
            conditionals: &conditionals,
            readonly: &readonly,
        },
        options,
    )
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
