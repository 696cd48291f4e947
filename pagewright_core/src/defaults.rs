//! Path- and collection-scoped front matter defaults.

use std::path::Path;

use globset::Glob;
use globset::GlobMatcher;
use serde::Deserialize;

use crate::Metadata;
use crate::SiteError;
use crate::SiteResult;

/// Scope type naming the top-level (non-collection) documents.
pub const PAGES_TYPE: &str = "pages";

/// One entry of the `defaults` list in `_config.yml`.
///
/// ```yaml
/// defaults:
///   - scope:
///       path: "projects"
///       type: pages
///     values:
///       layout: project
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultRule {
	#[serde(default)]
	pub scope: DefaultScope,
	#[serde(default)]
	pub values: Metadata,
}

/// Where a [`DefaultRule`] applies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultScope {
	/// Directory prefix, or a glob when it contains glob metacharacters.
	/// Empty matches every document.
	#[serde(default)]
	pub path: String,
	/// Collection name, or `pages` for top-level documents.
	#[serde(default, rename = "type")]
	pub collection: Option<String>,
}

#[derive(Debug, Clone)]
enum ScopePath {
	Any,
	Prefix(String),
	Glob(GlobMatcher),
}

impl ScopePath {
	fn new(path: &str) -> SiteResult<Self> {
		let path = path.trim_matches('/');
		if path.is_empty() || path == "." {
			return Ok(Self::Any);
		}

		if path.contains(['*', '?', '[', '{']) {
			let glob = Glob::new(path).map_err(|e| {
				SiteError::InvalidPattern {
					pattern: path.to_string(),
					reason: e.to_string(),
				}
			})?;
			return Ok(Self::Glob(glob.compile_matcher()));
		}

		Ok(Self::Prefix(path.to_string()))
	}

	fn matches(&self, rel_path: &str) -> bool {
		match self {
			Self::Any => true,
			Self::Prefix(prefix) => Path::new(rel_path).starts_with(prefix),
			Self::Glob(matcher) => {
				matcher.is_match(rel_path)
					|| Path::new(rel_path)
						.ancestors()
						.skip(1)
						.any(|ancestor| matcher.is_match(ancestor))
			}
		}
	}
}

#[derive(Debug, Clone)]
struct CompiledRule {
	path: ScopePath,
	collection: Option<String>,
	values: Metadata,
}

impl CompiledRule {
	fn applies_to(&self, rel_path: &str, collection: Option<&str>) -> bool {
		let type_matches = match (self.collection.as_deref(), collection) {
			(None, _) => true,
			(Some(PAGES_TYPE), None) => true,
			(Some(wanted), Some(actual)) => wanted == actual,
			(Some(_), None) => false,
		};

		type_matches && self.path.matches(rel_path)
	}
}

/// Computes the default metadata of a document from the configured rules.
#[derive(Debug, Clone, Default)]
pub struct DefaultsResolver {
	rules: Vec<CompiledRule>,
}

impl DefaultsResolver {
	/// Compile the rules once so each lookup is a plain scan.
	pub fn new(rules: &[DefaultRule]) -> SiteResult<Self> {
		let rules = rules
			.iter()
			.map(|rule| {
				Ok(CompiledRule {
					path: ScopePath::new(&rule.scope.path)?,
					collection: rule.scope.collection.clone(),
					values: rule.values.clone(),
				})
			})
			.collect::<SiteResult<Vec<_>>>()?;

		Ok(Self { rules })
	}

	/// Merge the values of every matching rule, in declaration order, on top
	/// of `base`. Later rules replace earlier top-level keys.
	pub fn resolve(&self, rel_path: &str, collection: Option<&str>, base: Metadata) -> Metadata {
		self.rules
			.iter()
			.filter(|rule| rule.applies_to(rel_path, collection))
			.fold(base, |merged, rule| merge_metadata(merged, &rule.values))
	}
}

/// Shallow merge: each top-level key of `over` replaces the one in `base`.
pub fn merge_metadata(mut base: Metadata, over: &Metadata) -> Metadata {
	for (key, value) in over {
		base.insert(key.clone(), value.clone());
	}
	base
}
