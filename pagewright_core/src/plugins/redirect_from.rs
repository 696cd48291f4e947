use serde_json::Value;

use crate::Document;
use crate::Metadata;
use crate::Plugin;
use crate::Site;
use crate::SiteResult;
use crate::render::render_builtin_template;

const REDIRECT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en-US">
  <meta charset="utf-8">
  <title>Redirecting&hellip;</title>
  <link rel="canonical" href="{{ to | markup }}">
  <meta http-equiv="refresh" content="0; url={{ to | markup }}">
  <meta name="robots" content="noindex">
  <h1>Redirecting&hellip;</h1>
  <a href="{{ to | markup }}">Click here if you are not redirected.</a>
  <script>location="{{ to | markup }}"</script>
</html>
"#;

/// Handles `redirect_from` and `redirect_to` front matter keys.
///
/// `redirect_from: /old/` (or a list of urls) adds a redirect page at each
/// old url pointing at the document. `redirect_to: https://…` replaces the
/// document's output with a redirect to that url.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectFromPlugin;

impl RedirectFromPlugin {
	pub const NAME: &'static str = "jekyll-redirect-from";
}

/// Render the redirect stub pointing at `to`.
pub(crate) fn redirect_page(to: &str) -> SiteResult<Vec<u8>> {
	let ctx = minijinja::context! { to => to };
	Ok(render_builtin_template("redirect.html", REDIRECT_TEMPLATE, ctx)?.into_bytes())
}

impl Plugin for RedirectFromPlugin {
	fn name(&self) -> &'static str {
		Self::NAME
	}

	fn post_read(&self, site: &mut Site) -> SiteResult<()> {
		let mut redirects = Vec::new();

		for document in site.documents_mut() {
			if let Some(value) = document.metadata().get("redirect_from") {
				for from in redirect_sources(document.relative_path(), value) {
					redirects.push((from, document.permalink().to_string()));
				}
			}

			match document.metadata().get("redirect_to") {
				Some(Value::String(to)) => {
					let content = redirect_page(to)?;
					document.set_rendered_content(content);
				}
				Some(other) => {
					tracing::warn!(
						path = document.relative_path(),
						value = %other,
						"`redirect_to` must be a string, skipping"
					);
				}
				None => {}
			}
		}

		for (from, to) in redirects {
			let mut metadata = Metadata::new();
			metadata.insert("redirect_to".to_string(), Value::String(to.clone()));
			metadata.insert("sitemap".to_string(), Value::Bool(false));
			let document = Document::generated(from, metadata, redirect_page(&to)?);
			site.add_document(document, true);
		}

		Ok(())
	}
}

/// Accepts a single url or a list of urls. Anything else is logged and
/// ignored.
fn redirect_sources(path: &str, value: &Value) -> Vec<String> {
	match value {
		Value::String(from) => vec![from.clone()],
		Value::Array(items) => {
			items
				.iter()
				.filter_map(|item| {
					match item {
						Value::String(from) => Some(from.clone()),
						other => {
							tracing::warn!(
								path,
								value = %other,
								"`redirect_from` entries must be strings, skipping"
							);
							None
						}
					}
				})
				.collect()
		}
		other => {
			tracing::warn!(
				path,
				value = %other,
				"`redirect_from` must be a string or a list of strings, skipping"
			);
			Vec::new()
		}
	}
}
