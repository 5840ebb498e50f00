//! Dependency resolution: verify that every reference-typed attribute,
//! transitively, points at a loaded bundle, and record which bundle each
//! reference resolves to.
//!
//! Runs to completion before any page is walked.

use crate::error::CompileError;
use formc_interchange::{BaseType, SchemaBundle};
use std::collections::{BTreeMap, HashSet};

/// The loaded dependency bundles, by digest.
#[derive(Debug, Default)]
pub struct BundleRegistry<'a> {
    bundles: BTreeMap<&'a str, &'a SchemaBundle>,
}

impl<'a> BundleRegistry<'a> {
    pub fn new(dependencies: &'a [SchemaBundle]) -> Self {
        BundleRegistry {
            bundles: dependencies.iter().map(|b| (b.digest.as_str(), b)).collect(),
        }
    }

    pub fn get(&self, digest: &str) -> Option<&'a SchemaBundle> {
        self.bundles.get(digest).copied()
    }
}

/// `(owning bundle digest, attribute name) -> referenced bundle digest`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap {
    refs: BTreeMap<(String, String), String>,
}

impl DependencyMap {
    pub fn get(&self, owner: &str, attribute: &str) -> Option<&str> {
        self.refs
            .get(&(owner.to_owned(), attribute.to_owned()))
            .map(String::as_str)
    }
}

/// Walk `base` and every bundle it reaches, depth-first in attribute order.
pub fn resolve_dependencies(
    base: &SchemaBundle,
    registry: &BundleRegistry<'_>,
) -> Result<DependencyMap, CompileError> {
    let mut map = DependencyMap::default();
    let mut visited: HashSet<String> = HashSet::new();
    // The Vec keeps the active path in order for cycle reports; the set
    // answers membership.
    let mut stack: Vec<String> = Vec::new();
    let mut stack_set: HashSet<String> = HashSet::new();

    resolve_bundle(
        base,
        registry,
        &mut map,
        &mut visited,
        &mut stack,
        &mut stack_set,
    )?;

    tracing::debug!(
        references = map.refs.len(),
        bundles = visited.len(),
        "dependency references resolved"
    );
    Ok(map)
}

fn resolve_bundle(
    bundle: &SchemaBundle,
    registry: &BundleRegistry<'_>,
    map: &mut DependencyMap,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
    stack_set: &mut HashSet<String>,
) -> Result<(), CompileError> {
    stack.push(bundle.digest.clone());
    stack_set.insert(bundle.digest.clone());

    for attr in &bundle.attributes {
        let digest = match &attr.attr_type.base {
            BaseType::Primitive(_) => continue,
            BaseType::Reference(digest) => digest,
            BaseType::Unrecognized(_) => {
                return Err(CompileError::UnsupportedAttributeType {
                    attribute: attr.name.clone(),
                    attr_type: attr.attr_type.to_string(),
                })
            }
        };
        let target = registry
            .get(digest)
            .ok_or_else(|| CompileError::UnresolvedReference {
                attribute: attr.name.clone(),
                digest: digest.clone(),
            })?;
        map.refs.insert(
            (bundle.digest.clone(), attr.name.clone()),
            digest.clone(),
        );

        if stack_set.contains(digest) {
            let mut cycle = stack.clone();
            cycle.push(digest.clone());
            return Err(CompileError::CyclicReference { cycle });
        }
        if visited.contains(digest) {
            continue;
        }
        resolve_bundle(target, registry, map, visited, stack, stack_set)?;
    }

    stack.pop();
    stack_set.remove(&bundle.digest);
    visited.insert(bundle.digest.clone());
    Ok(())
}
