use serde::Serialize;
use serde_json::Value;

use crate::Document;
use crate::Metadata;
use crate::Plugin;
use crate::Site;
use crate::SiteResult;
use crate::render::render_builtin_template;
use crate::site::is_html_permalink;

const SITEMAP_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{%- for entry in entries %}
  <url>
    <loc>{{ entry.loc | markup }}</loc>
    {%- if entry.lastmod %}
    <lastmod>{{ entry.lastmod | markup }}</lastmod>
    {%- endif %}
  </url>
{%- endfor %}
</urlset>
"#;

pub const SITEMAP_PERMALINK: &str = "/sitemap.xml";

/// Adds `/sitemap.xml` listing every routed HTML document.
///
/// Documents with `sitemap: false` and `/404.html` are left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct SitemapPlugin;

impl SitemapPlugin {
	pub const NAME: &'static str = "jekyll-sitemap";
}

#[derive(Debug, Serialize)]
struct SitemapEntry {
	loc: String,
	lastmod: Option<String>,
}

impl Plugin for SitemapPlugin {
	fn name(&self) -> &'static str {
		Self::NAME
	}

	fn post_read(&self, site: &mut Site) -> SiteResult<()> {
		let base = format!(
			"{}{}",
			site.config().url.trim_end_matches('/'),
			site.config().baseurl.trim_end_matches('/')
		);
		let entries: Vec<SitemapEntry> = site
			.routed_documents()
			.filter(|(permalink, document)| is_listed(permalink, document))
			.map(|(permalink, document)| {
				let path = permalink
					.strip_suffix("/index.html")
					.map_or_else(|| permalink.to_string(), |dir| format!("{dir}/"));
				SitemapEntry {
					loc: format!("{base}{path}"),
					lastmod: document
						.metadata()
						.get("last_modified_at")
						.or_else(|| document.metadata().get("date"))
						.and_then(Value::as_str)
						.map(str::to_string),
				}
			})
			.collect();

		tracing::debug!(entries = entries.len(), "generating sitemap");
		let ctx = minijinja::context! { entries => entries };
		let content = render_builtin_template("sitemap.xml", SITEMAP_TEMPLATE, ctx)?;

		let mut metadata = Metadata::new();
		metadata.insert("sitemap".to_string(), Value::Bool(false));
		site.add_document(
			Document::generated(SITEMAP_PERMALINK, metadata, content.into_bytes()),
			true,
		);
		Ok(())
	}
}

fn is_listed(permalink: &str, document: &Document) -> bool {
	is_html_permalink(permalink)
		&& permalink != "/404.html"
		&& document.metadata().get("sitemap") != Some(&Value::Bool(false))
}
