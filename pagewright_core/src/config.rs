use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use derive_more::Deref;
use serde::Deserialize;
use serde::Deserializer;
use serde::de::Error as _;

use crate::Metadata;
use crate::SiteError;
use crate::SiteResult;
use crate::defaults::DefaultRule;

/// Name of the root configuration file, relative to the source directory.
pub const CONFIG_FILE_NAME: &str = "_config.yml";

/// Extensions treated as markdown when `markdown_ext` is not configured.
pub const DEFAULT_MARKDOWN_EXT: &str = "markdown,mkdown,mkdn,mkd,md";

/// Site configuration loaded from `_config.yml`.
///
/// ```yaml
/// title: My Site
/// url: https://example.com
/// markdown_ext: md,markdown
/// exclude: [Gemfile, "vendor/"]
/// include: [.htaccess]
/// collections:
///   recipes:
///     output: true
///     permalink: /recipes/:name.html
/// defaults:
///   - scope: { path: "blog", type: pages }
///     values: { layout: post }
/// plugins: [jekyll-redirect-from, jekyll-sitemap]
/// ```
///
/// Keys that are not recognized here are kept in [`SiteConfig::variables`]
/// and exposed to templates as `site.<key>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
	/// Source directory. Set by [`SiteConfig::load`], never read from the file.
	#[serde(skip)]
	pub source: PathBuf,
	/// Output directory, relative to the source directory unless absolute.
	pub destination: PathBuf,
	/// Collections in declaration order.
	#[serde(deserialize_with = "deserialize_collections")]
	pub collections: Vec<CollectionConfig>,
	/// Front matter default rules, applied in declaration order.
	pub defaults: Vec<DefaultRule>,
	/// Comma separated list of markdown extensions (without dots).
	pub markdown_ext: String,
	/// Gitignore-style patterns for paths to skip.
	pub exclude: Vec<String>,
	/// Globs re-admitting entries that the built-in rules would skip.
	pub include: Vec<String>,
	/// Keep documents whose front matter says `published: false`.
	pub unpublished: bool,
	/// Directory holding data files exposed as `site.data`.
	pub data_dir: PathBuf,
	/// Directory holding layouts. Changes here force a full reload.
	pub layouts_dir: PathBuf,
	/// Plugin names, resolved once against the plugin registry.
	pub plugins: Vec<String>,
	/// Absolute site url, used for generated absolute links.
	pub url: String,
	/// Path prefix of the site below `url`.
	pub baseurl: String,
	/// Every other key of the configuration file.
	#[serde(flatten)]
	pub variables: Metadata,
}

impl Default for SiteConfig {
	fn default() -> Self {
		Self {
			source: PathBuf::from("."),
			destination: PathBuf::from("_site"),
			collections: Vec::new(),
			defaults: Vec::new(),
			markdown_ext: DEFAULT_MARKDOWN_EXT.to_string(),
			exclude: Vec::new(),
			include: Vec::new(),
			unpublished: false,
			data_dir: PathBuf::from("_data"),
			layouts_dir: PathBuf::from("_layouts"),
			plugins: Vec::new(),
			url: String::new(),
			baseurl: String::new(),
			variables: Metadata::new(),
		}
	}
}

/// A configured collection.
///
/// ```yaml
/// collections:
///   recipes:
///     output: true
///     layout: recipe
/// ```
///
/// Every key besides `output` becomes a metadata default for the
/// collection's documents.
#[derive(Debug, Clone, Default)]
pub struct CollectionConfig {
	pub name: String,
	pub output: bool,
	pub defaults: Metadata,
}

impl CollectionConfig {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CollectionEntry {
	output: bool,
	#[serde(flatten)]
	defaults: Metadata,
}

/// Accepts either a list of collection names or a mapping of name to
/// collection settings. Mapping order is declaration order.
fn deserialize_collections<'de, D>(deserializer: D) -> Result<Vec<CollectionConfig>, D::Error>
where
	D: Deserializer<'de>,
{
	use serde_yaml_ng::Value;

	match Value::deserialize(deserializer)? {
		Value::Null => Ok(Vec::new()),
		Value::Sequence(names) => {
			names
				.into_iter()
				.map(|name| {
					match name {
						Value::String(name) => Ok(CollectionConfig::new(name)),
						other => {
							Err(D::Error::custom(format!(
								"collection names must be strings, found `{other:?}`"
							)))
						}
					}
				})
				.collect()
		}
		Value::Mapping(table) => {
			table
				.into_iter()
				.map(|(key, value)| {
					let Some(name) = key.as_str() else {
						return Err(D::Error::custom(format!(
							"collection names must be strings, found `{key:?}`"
						)));
					};
					let entry = if value.is_null() {
						CollectionEntry::default()
					} else {
						serde_yaml_ng::from_value::<CollectionEntry>(value)
							.map_err(|e| D::Error::custom(format!("collection `{name}`: {e}")))?
					};

					Ok(CollectionConfig {
						name: name.to_string(),
						output: entry.output,
						defaults: entry.defaults,
					})
				})
				.collect()
		}
		_ => Err(D::Error::custom("`collections` must be a list or a mapping")),
	}
}

/// Overrides supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct BuildFlags {
	pub destination: Option<PathBuf>,
	pub unpublished: bool,
}

/// The set of file extensions (without dots) rendered as markdown.
#[derive(Debug, Clone, Default, Deref, PartialEq, Eq)]
pub struct MarkdownExtensions(BTreeSet<String>);

impl MarkdownExtensions {
	/// Parse a comma separated list such as `md,markdown`.
	pub fn parse(list: &str) -> Self {
		Self(
			list.split(',')
				.map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
				.filter(|ext| !ext.is_empty())
				.collect(),
		)
	}

	/// Whether the file at `path` has a markdown extension.
	pub fn matches(&self, path: &str) -> bool {
		Path::new(path)
			.extension()
			.and_then(|ext| ext.to_str())
			.is_some_and(|ext| self.0.contains(&ext.to_ascii_lowercase()))
	}
}

impl SiteConfig {
	/// Load `_config.yml` from `source`. A missing file yields the defaults.
	pub fn load(source: &Path) -> SiteResult<SiteConfig> {
		let config_path = source.join(CONFIG_FILE_NAME);
		let mut config = match std::fs::read_to_string(&config_path) {
			Ok(content) => {
				Self::parse(&content).map_err(|reason| {
					SiteError::ConfigParse {
						path: config_path.clone(),
						reason,
					}
				})?
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
			Err(e) => return Err(SiteError::path("read config", config_path, e)),
		};

		config.source = source.to_path_buf();
		tracing::debug!(source = %source.display(), "loaded site configuration");
		Ok(config)
	}

	/// Parse configuration text. Empty or comment-only text yields the defaults.
	pub fn parse(content: &str) -> Result<SiteConfig, String> {
		let value: serde_yaml_ng::Value =
			serde_yaml_ng::from_str(content).map_err(|e| e.to_string())?;
		if value.is_null() {
			return Ok(Self::default());
		}

		serde_yaml_ng::from_value(value).map_err(|e| e.to_string())
	}

	/// Apply command line overrides on top of the file configuration.
	pub fn apply_flags(&mut self, flags: &BuildFlags) {
		if let Some(destination) = &flags.destination {
			self.destination.clone_from(destination);
		}
		if flags.unpublished {
			self.unpublished = true;
		}
	}

	/// The configured markdown extensions.
	pub fn markdown_extensions(&self) -> MarkdownExtensions {
		MarkdownExtensions::parse(&self.markdown_ext)
	}

	/// Absolute (or source-joined) output directory.
	pub fn destination_dir(&self) -> PathBuf {
		self.source.join(&self.destination)
	}
}
