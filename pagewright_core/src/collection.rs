use serde_json::Value;
use serde_json::json;

use crate::CollectionConfig;
use crate::Document;
use crate::EntryFilter;
use crate::Metadata;
use crate::ReadContext;
use crate::SiteResult;
use crate::defaults::merge_metadata;
use crate::walk_files;

/// A named group of documents rooted at `_<name>/`.
#[derive(Debug, Clone)]
pub struct Collection {
	name: String,
	output: bool,
	defaults: Metadata,
	documents: Vec<Document>,
}

impl Collection {
	pub fn new(config: &CollectionConfig) -> Self {
		Self {
			name: config.name.clone(),
			output: config.output,
			defaults: config.defaults.clone(),
			documents: Vec::new(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Whether the collection's documents enter the routing table.
	pub fn output(&self) -> bool {
		self.output
	}

	/// The source-relative directory prefix, e.g. `_posts/`.
	pub fn prefix(&self) -> String {
		format!("_{}/", self.name)
	}

	/// Documents in directory traversal order.
	pub fn documents(&self) -> &[Document] {
		&self.documents
	}

	/// Read every non-excluded file under the collection directory.
	///
	/// Each document's defaults start with `collection: <name>`, then the
	/// collection's configured values, then the matching `defaults` rules. A
	/// missing directory is an empty collection.
	pub fn read_documents(&mut self, ctx: &ReadContext<'_>, filter: &EntryFilter) -> SiteResult<()> {
		self.documents.clear();
		let dir = ctx.source.join(format!("_{}", self.name));
		if !dir.is_dir() {
			tracing::debug!(collection = %self.name, "collection directory does not exist");
			return Ok(());
		}

		for rel_path in walk_files(ctx.source, &dir, filter)? {
			let mut base = Metadata::new();
			base.insert("collection".to_string(), json!(self.name));
			let base = merge_metadata(base, &self.defaults);
			let defaults = ctx.defaults.resolve(&rel_path, Some(&self.name), base);
			self.documents.push(Document::read(ctx, &rel_path, defaults)?);
		}

		tracing::debug!(
			collection = %self.name,
			documents = self.documents.len(),
			"read collection"
		);
		Ok(())
	}

	/// The collection as seen by templates under `site.collections`.
	pub fn template_object(&self) -> Value {
		json!({
			"label": self.name,
			"output": self.output,
			"relative_directory": format!("_{}", self.name),
			"docs": self
				.documents
				.iter()
				.map(Document::template_object)
				.collect::<Vec<_>>(),
		})
	}
}
