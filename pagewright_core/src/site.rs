use std::collections::BTreeMap;
use std::path::Path;

use derive_more::Deref;
use serde_json::Value;
use serde_json::json;

use crate::BuildFlags;
use crate::Collection;
use crate::DefaultsResolver;
use crate::Document;
use crate::EntryFilter;
use crate::Metadata;
use crate::Plugin;
use crate::PluginRegistry;
use crate::ReadContext;
use crate::ReloadPlan;
use crate::SiteConfig;
use crate::SiteResult;
use crate::load_data_dir;
use crate::plan_reload;
use crate::render::RenderContext;
use crate::walk_files;

/// Maps each permalink to the index of the document that serves it.
///
/// Later insertions for the same permalink replace earlier ones.
#[derive(Debug, Clone, Default, Deref)]
pub struct RoutingTable(BTreeMap<String, usize>);

/// The document registry: every document read from the source tree, the
/// collections they belong to, and the routing table built from them.
#[derive(Debug)]
pub struct Site {
	config: SiteConfig,
	flags: BuildFlags,
	registry: PluginRegistry,
	plugins: Vec<Box<dyn Plugin>>,
	data: Metadata,
	documents: Vec<Document>,
	routes: RoutingTable,
	collections: Vec<Collection>,
}

impl Site {
	/// Create an unread site from an already loaded configuration, using the
	/// built-in plugins.
	pub fn new(config: SiteConfig) -> Self {
		Self::with_registry(config, BuildFlags::default(), PluginRegistry::builtin())
	}

	/// Create an unread site, resolving the configured plugin names against
	/// `registry`.
	pub fn with_registry(config: SiteConfig, flags: BuildFlags, registry: PluginRegistry) -> Self {
		let plugins = registry.resolve(&config.plugins);
		Self {
			config,
			flags,
			registry,
			plugins,
			data: Metadata::new(),
			documents: Vec::new(),
			routes: RoutingTable::default(),
			collections: Vec::new(),
		}
	}

	/// Load `_config.yml` from `source`, apply `flags` and create an unread
	/// site with the built-in plugins.
	pub fn from_directory(source: &Path, flags: BuildFlags) -> SiteResult<Self> {
		Self::from_directory_with_registry(source, flags, PluginRegistry::builtin())
	}

	pub fn from_directory_with_registry(
		source: &Path,
		flags: BuildFlags,
		registry: PluginRegistry,
	) -> SiteResult<Self> {
		let mut config = SiteConfig::load(source)?;
		config.apply_flags(&flags);
		Ok(Self::with_registry(config, flags, registry))
	}

	pub fn config(&self) -> &SiteConfig {
		&self.config
	}

	/// Data files loaded from the data directory, keyed by file stem.
	pub fn data(&self) -> &Metadata {
		&self.data
	}

	/// Every published (or, in unpublished mode, every) document in
	/// processing order.
	pub fn documents(&self) -> &[Document] {
		&self.documents
	}

	/// Mutable access for plugins. Permalinks stay as computed.
	pub fn documents_mut(&mut self) -> &mut [Document] {
		&mut self.documents
	}

	pub fn routes(&self) -> &RoutingTable {
		&self.routes
	}

	/// The document served at `permalink`.
	pub fn route(&self, permalink: &str) -> Option<&Document> {
		self.routes
			.get(permalink)
			.and_then(|index| self.documents.get(*index))
	}

	/// Routed documents in permalink order.
	pub fn routed_documents(&self) -> impl Iterator<Item = (&str, &Document)> {
		self.routes
			.iter()
			.filter_map(|(permalink, index)| Some((permalink.as_str(), self.documents.get(*index)?)))
	}

	pub fn collections(&self) -> &[Collection] {
		&self.collections
	}

	/// Register a document. Unpublished documents are dropped unless the
	/// configuration keeps them. With `output`, the document takes over the
	/// route for its permalink.
	pub fn add_document(&mut self, document: Document, output: bool) {
		if !(document.published() || self.config.unpublished) {
			tracing::debug!(path = document.relative_path(), "skipping unpublished document");
			return;
		}

		let index = self.documents.len();
		if output {
			if let Some(previous) = self.routes.0.insert(document.permalink().to_string(), index) {
				tracing::warn!(
					permalink = document.permalink(),
					replaced = self.documents[previous].relative_path(),
					by = document.relative_path(),
					"permalink collision"
				);
			} else {
				tracing::debug!(permalink = document.permalink(), "routed document");
			}
		}
		self.documents.push(document);
	}

	/// Run the read pipeline: data files, the source tree walk, each
	/// collection in declaration order, then the plugins' post-read hooks.
	///
	/// The first error aborts the pass and leaves the site empty.
	pub fn read(&mut self) -> SiteResult<()> {
		self.clear();
		let result = self.read_sources();
		if result.is_err() {
			self.clear();
		}
		result
	}

	fn clear(&mut self) {
		self.data = Metadata::new();
		self.documents.clear();
		self.routes.0.clear();
		self.collections.clear();
	}

	fn read_sources(&mut self) -> SiteResult<()> {
		let source = self.config.source.clone();
		self.data = load_data_dir(&source.join(&self.config.data_dir))?;

		let markdown = self.config.markdown_extensions();
		let defaults = DefaultsResolver::new(&self.config.defaults)?;
		let filter = EntryFilter::new(&self.config)?;
		let ctx = ReadContext {
			source: &source,
			markdown: &markdown,
			defaults: &defaults,
		};

		for rel_path in walk_files(&source, &source, &filter)? {
			let page_defaults = defaults.resolve(&rel_path, None, Metadata::new());
			let document = Document::read(&ctx, &rel_path, page_defaults)?;
			self.add_document(document, true);
		}

		let mut collections: Vec<Collection> =
			self.config.collections.iter().map(Collection::new).collect();
		for collection in &mut collections {
			collection.read_documents(&ctx, &filter)?;
			for document in collection.documents() {
				self.add_document(document.clone(), collection.output());
			}
		}
		self.collections = collections;

		self.run_post_read_hooks()?;

		tracing::info!(
			documents = self.documents.len(),
			routes = self.routes.len(),
			collections = self.collections.len(),
			"read site"
		);
		Ok(())
	}

	fn run_post_read_hooks(&mut self) -> SiteResult<()> {
		let plugins = std::mem::take(&mut self.plugins);
		let result = plugins.iter().try_for_each(|plugin| {
			tracing::debug!(plugin = plugin.name(), "running post-read hook");
			plugin.post_read(self)
		});
		self.plugins = plugins;
		result
	}

	/// Rebuild after the source-relative `changed` paths were modified.
	///
	/// Configuration and layout changes reload everything from disk; any
	/// other change reuses the configuration and reruns the read pass.
	pub fn reloaded<P: AsRef<Path>>(self, changed: &[P]) -> SiteResult<Site> {
		let mut site = match plan_reload(&self.config, changed) {
			ReloadPlan::Full => {
				tracing::info!("reloading configuration and all documents");
				Self::from_directory_with_registry(
					&self.config.source,
					self.flags.clone(),
					self.registry.clone(),
				)?
			}
			ReloadPlan::Partial => {
				tracing::info!("rereading documents");
				self
			}
		};

		site.read()?;
		Ok(site)
	}

	/// The `site` template variable.
	pub fn site_variables(&self) -> Value {
		let mut site = self.config.variables.clone();
		site.insert("url".to_string(), json!(self.config.url));
		site.insert("baseurl".to_string(), json!(self.config.baseurl));
		site.insert("data".to_string(), Value::Object(self.data.clone()));
		site.insert(
			"pages".to_string(),
			self.template_objects(|document| {
				document.is_dynamic() && document.collection().is_none()
			}),
		);
		site.insert(
			"html_pages".to_string(),
			self.template_objects(|document| {
				document.is_dynamic()
					&& document.collection().is_none()
					&& is_html_permalink(document.permalink())
			}),
		);
		site.insert(
			"static_files".to_string(),
			self.template_objects(Document::is_static),
		);
		site.insert("documents".to_string(), self.template_objects(|_| true));
		site.insert(
			"collections".to_string(),
			Value::Array(
				self.collections
					.iter()
					.map(Collection::template_object)
					.collect(),
			),
		);
		for collection in &self.collections {
			site.entry(collection.name().to_string()).or_insert_with(|| {
				self.template_objects(|document| document.collection() == Some(collection.name()))
			});
		}

		Value::Object(site)
	}

	fn template_objects(&self, filter: impl Fn(&Document) -> bool) -> Value {
		Value::Array(
			self.documents
				.iter()
				.filter(|document| filter(document))
				.map(Document::template_object)
				.collect(),
		)
	}

	/// Everything a document needs to render.
	pub fn render_context(&self) -> RenderContext {
		RenderContext {
			site: self.site_variables(),
			markdown: self.config.markdown_extensions(),
		}
	}
}

/// Whether a permalink names an HTML page.
pub fn is_html_permalink(permalink: &str) -> bool {
	permalink.ends_with('/') || permalink.ends_with(".html") || permalink.ends_with(".htm")
}
