//! Plugins run after the read pass and may add documents or replace the
//! rendered content of existing ones.

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::Site;
use crate::SiteResult;

pub use redirect_from::RedirectFromPlugin;
pub use sitemap::SitemapPlugin;

mod redirect_from;
mod sitemap;

/// A site plugin.
pub trait Plugin: Debug {
	/// The name used to enable the plugin in `_config.yml`.
	fn name(&self) -> &'static str;

	/// Called once all documents of a read pass are registered. The plugin
	/// may inspect and mutate documents and add new ones through
	/// [`Site::add_document`].
	fn post_read(&self, site: &mut Site) -> SiteResult<()>;
}

/// Builds a plugin instance.
pub type PluginConstructor = fn() -> Box<dyn Plugin>;

/// Name to constructor table, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
	constructors: BTreeMap<&'static str, PluginConstructor>,
}

impl PluginRegistry {
	/// An empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry containing the plugins shipped with pagewright.
	pub fn builtin() -> Self {
		let mut registry = Self::new();
		registry.register(RedirectFromPlugin::NAME, || Box::new(RedirectFromPlugin));
		registry.register(SitemapPlugin::NAME, || Box::new(SitemapPlugin));
		registry
	}

	pub fn register(&mut self, name: &'static str, constructor: PluginConstructor) {
		self.constructors.insert(name, constructor);
	}

	pub fn contains(&self, name: &str) -> bool {
		self.constructors.contains_key(name)
	}

	/// Instantiate the named plugins in the given order. Unknown names are
	/// logged and skipped.
	pub fn resolve(&self, names: &[String]) -> Vec<Box<dyn Plugin>> {
		names
			.iter()
			.filter_map(|name| {
				let constructor = self.constructors.get(name.as_str());
				if constructor.is_none() {
					tracing::warn!(plugin = %name, "unknown plugin, ignoring");
				}
				constructor.map(|constructor| constructor())
			})
			.collect()
	}
}
