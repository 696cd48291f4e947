//! The two transformations applied to dynamic documents: template
//! evaluation through minijinja and markdown conversion.

use minijinja::AutoEscape;
use minijinja::Environment;

use crate::MarkdownExtensions;
use crate::SiteError;
use crate::SiteResult;

/// Site-wide state needed while rendering documents.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
	/// The `site` template variable.
	pub site: serde_json::Value,
	/// Extensions whose template output is converted from markdown.
	pub markdown: MarkdownExtensions,
}

/// Evaluate a document body with `page` and `site` in scope.
///
/// Output is never auto-escaped: document bodies are trusted content.
pub fn render_document_template(
	path: &str,
	source: &str,
	page: &serde_json::Value,
	site: &serde_json::Value,
) -> SiteResult<String> {
	let mut env = Environment::new();
	env.set_keep_trailing_newline(true);
	env.set_auto_escape_callback(|_| AutoEscape::None);

	let ctx = minijinja::context! {
		page => minijinja::Value::from_serialize(page),
		site => minijinja::Value::from_serialize(site),
	};
	render_with(&mut env, path, source, ctx)
}

/// Render one of the built-in templates used by plugins. Values are escaped
/// explicitly with the `markup` filter, which leaves `/` intact so urls stay
/// readable.
pub(crate) fn render_builtin_template(
	name: &str,
	source: &str,
	ctx: minijinja::Value,
) -> SiteResult<String> {
	let mut env = Environment::new();
	env.set_keep_trailing_newline(true);
	env.set_auto_escape_callback(|_| AutoEscape::None);
	env.add_filter("markup", escape_markup);
	render_with(&mut env, name, source, ctx)
}

/// Escape text for HTML and XML attribute or element content.
fn escape_markup(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len());
	for c in value.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			_ => escaped.push(c),
		}
	}
	escaped
}

fn render_with<'source>(
	env: &mut Environment<'source>,
	name: &'source str,
	source: &'source str,
	ctx: minijinja::Value,
) -> SiteResult<String> {
	let template_error = |e: minijinja::Error| {
		SiteError::Template {
			path: name.to_string(),
			message: e.to_string(),
		}
	};

	env.add_template(name, source).map_err(template_error)?;
	let template = env.get_template(name).map_err(template_error)?;
	template.render(ctx).map_err(template_error)
}

/// Convert markdown to HTML with GitHub flavored extensions enabled. Raw
/// HTML in the source is passed through.
pub fn markdown_to_html(path: &str, source: &str) -> SiteResult<String> {
	let mut options = markdown::Options::gfm();
	options.compile.allow_dangerous_html = true;

	markdown::to_html_with_options(source, &options).map_err(|e| {
		SiteError::Markdown {
			path: path.to_string(),
			message: e.to_string(),
		}
	})
}
