use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use serde_json::Value;
use serde_json::json;

use crate::DEFAULT_PERMALINK_PATTERN;
use crate::DefaultsResolver;
use crate::MarkdownExtensions;
use crate::Metadata;
use crate::SiteError;
use crate::SiteResult;
use crate::defaults::merge_metadata;
use crate::expand_permalink;
use crate::extract_front_matter;
use crate::render::RenderContext;
use crate::render::markdown_to_html;
use crate::render::render_document_template;

/// Front matter keys that configure the document rather than describe it.
const RESERVED_KEYS: [&str; 3] = ["layout", "permalink", "published"];

/// How a document produces its output bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentKind {
	/// No front matter: the source file is copied verbatim.
	Static,
	/// Front matter present: the body is evaluated as a template and, for
	/// markdown extensions, converted to HTML.
	Dynamic { body: Vec<u8> },
	/// Created by a plugin with fixed content and no source file.
	Generated { content: Vec<u8> },
}

/// Site-wide inputs for constructing documents.
#[derive(Debug, Clone, Copy)]
pub struct ReadContext<'a> {
	/// The source directory.
	pub source: &'a Path,
	/// Extensions rendered as markdown.
	pub markdown: &'a MarkdownExtensions,
	/// Compiled `defaults` rules.
	pub defaults: &'a DefaultsResolver,
}

/// A source file (or plugin output) together with its permalink.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
	kind: DocumentKind,
	relative_path: String,
	source_path: PathBuf,
	permalink: String,
	published: bool,
	metadata: Metadata,
	rendered: Option<Vec<u8>>,
}

impl Document {
	/// Read the file at source-relative `rel_path` and build a document from
	/// it. `defaults` is the merged default metadata for the file.
	pub fn read(ctx: &ReadContext<'_>, rel_path: &str, defaults: Metadata) -> SiteResult<Self> {
		let source_path = ctx.source.join(rel_path);
		let source =
			std::fs::read(&source_path).map_err(|e| SiteError::path("read", &source_path, e))?;
		Self::from_source(ctx, rel_path, &source, defaults)
	}

	/// Build a document from file contents already in memory.
	///
	/// The kind is decided by the presence of a front matter block. Front
	/// matter is merged on top of `defaults` and the permalink is computed
	/// here, once.
	pub fn from_source(
		ctx: &ReadContext<'_>,
		rel_path: &str,
		source: &[u8],
		defaults: Metadata,
	) -> SiteResult<Self> {
		let (kind, metadata) = match extract_front_matter(rel_path, source)? {
			Some(front_matter) => {
				(
					DocumentKind::Dynamic {
						body: front_matter.body,
					},
					merge_metadata(defaults, &front_matter.metadata),
				)
			}
			None => (DocumentKind::Static, defaults),
		};

		// Static files are always served at their source path.
		let permalink = if kind == DocumentKind::Static {
			format!("/{rel_path}")
		} else {
			let pattern = metadata
				.get("permalink")
				.and_then(Value::as_str)
				.unwrap_or(DEFAULT_PERMALINK_PATTERN);
			expand_permalink(pattern, rel_path, &metadata, ctx.markdown)?
		};
		let published = metadata
			.get("published")
			.and_then(Value::as_bool)
			.unwrap_or(true);

		tracing::debug!(
			path = rel_path,
			permalink = %permalink,
			dynamic = matches!(kind, DocumentKind::Dynamic { .. }),
			"read document"
		);

		Ok(Self {
			kind,
			relative_path: rel_path.to_string(),
			source_path: ctx.source.join(rel_path),
			permalink,
			published,
			metadata,
			rendered: None,
		})
	}

	/// A document synthesized by a plugin, served at `permalink`.
	pub fn generated(permalink: impl Into<String>, metadata: Metadata, content: Vec<u8>) -> Self {
		let permalink = permalink.into();
		let permalink = if permalink.starts_with('/') {
			permalink
		} else {
			format!("/{permalink}")
		};

		Self {
			kind: DocumentKind::Generated { content },
			relative_path: String::new(),
			source_path: PathBuf::new(),
			permalink,
			published: true,
			metadata,
			rendered: None,
		}
	}

	pub fn kind(&self) -> &DocumentKind {
		&self.kind
	}

	pub fn is_static(&self) -> bool {
		self.kind == DocumentKind::Static
	}

	pub fn is_dynamic(&self) -> bool {
		matches!(self.kind, DocumentKind::Dynamic { .. })
	}

	/// Source path relative to the source directory, `/` separated. Empty for
	/// generated documents.
	pub fn relative_path(&self) -> &str {
		&self.relative_path
	}

	/// Absolute (source-joined) path of the source file.
	pub fn source_path(&self) -> &Path {
		&self.source_path
	}

	pub fn permalink(&self) -> &str {
		&self.permalink
	}

	pub fn published(&self) -> bool {
		self.published
	}

	pub fn metadata(&self) -> &Metadata {
		&self.metadata
	}

	/// Mutable access to the metadata. The permalink is not recomputed.
	pub fn metadata_mut(&mut self) -> &mut Metadata {
		&mut self.metadata
	}

	/// The collection this document was read from, if any.
	pub fn collection(&self) -> Option<&str> {
		self.metadata.get("collection").and_then(Value::as_str)
	}

	/// Replace the rendered output of this document. Subsequent writes emit
	/// `content` verbatim instead of transforming the source.
	pub fn set_rendered_content(&mut self, content: Vec<u8>) {
		self.rendered = Some(content);
	}

	/// Content set through [`Document::set_rendered_content`], if any.
	pub fn rendered_content(&self) -> Option<&[u8]> {
		self.rendered.as_deref()
	}

	/// The `page` object seen by templates.
	pub fn template_object(&self) -> Value {
		match &self.kind {
			DocumentKind::Static => {
				let path = format!("/{}", self.relative_path);
				let file = Path::new(&self.relative_path);
				let name = file
					.file_name()
					.and_then(|name| name.to_str())
					.unwrap_or_default();
				let basename = file
					.file_stem()
					.and_then(|stem| stem.to_str())
					.unwrap_or_default();
				let extname = file
					.extension()
					.and_then(|ext| ext.to_str())
					.map(|ext| format!(".{ext}"))
					.unwrap_or_default();

				let mut object = self.metadata.clone();
				object.extend([
					("path".to_string(), json!(path)),
					("url".to_string(), json!(self.permalink)),
					("name".to_string(), json!(name)),
					("basename".to_string(), json!(basename)),
					("extname".to_string(), json!(extname)),
				]);
				Value::Object(object)
			}
			DocumentKind::Dynamic { .. } | DocumentKind::Generated { .. } => {
				let mut object = Metadata::new();
				object.insert("url".to_string(), json!(self.permalink));
				object.insert("path".to_string(), json!(self.relative_path));
				object.insert("relative_path".to_string(), json!(self.relative_path));
				for (key, value) in &self.metadata {
					if !RESERVED_KEYS.contains(&key.as_str()) {
						object.insert(key.clone(), value.clone());
					}
				}
				Value::Object(object)
			}
		}
	}

	/// Produce the output bytes of this document.
	pub fn render(&self, ctx: &RenderContext) -> SiteResult<Vec<u8>> {
		if let Some(rendered) = &self.rendered {
			return Ok(rendered.clone());
		}

		match &self.kind {
			DocumentKind::Static => {
				std::fs::read(&self.source_path)
					.map_err(|e| SiteError::path("read", &self.source_path, e))
			}
			DocumentKind::Dynamic { body } => {
				let body = std::str::from_utf8(body).map_err(|e| {
					SiteError::Template {
						path: self.relative_path.clone(),
						message: format!("body is not valid UTF-8: {e}"),
					}
				})?;
				let mut output = render_document_template(
					&self.relative_path,
					body,
					&self.template_object(),
					&ctx.site,
				)?;
				if ctx.markdown.matches(&self.relative_path) {
					output = markdown_to_html(&self.relative_path, &output)?;
				}
				Ok(output.into_bytes())
			}
			DocumentKind::Generated { content } => Ok(content.clone()),
		}
	}

	/// Render this document into `writer`.
	pub fn write(&self, writer: &mut dyn Write, ctx: &RenderContext) -> SiteResult<()> {
		let output = self.render(ctx)?;
		writer.write_all(&output).map_err(|source| {
			SiteError::Write {
				permalink: self.permalink.clone(),
				source,
			}
		})
	}
}
