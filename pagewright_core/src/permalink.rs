//! Expansion of permalink patterns such as `/:categories/:year/:title.html`
//! into concrete output paths.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Datelike;
use chrono::NaiveDate;
use serde_json::Value;

use crate::MarkdownExtensions;
use crate::Metadata;
use crate::PermalinkError;
use crate::SiteResult;

/// Pattern used when a document does not set `permalink`.
pub const DEFAULT_PERMALINK_PATTERN: &str = ":path";

/// Named permalink styles and the patterns they stand for.
pub const PERMALINK_STYLES: [(&str, &str); 4] = [
	("date", "/:categories/:year/:month/:day/:title.html"),
	("pretty", "/:categories/:year/:month/:day/:title/"),
	("ordinal", "/:categories/:y_day/:title.html"),
	("none", "/:categories/:title.html"),
];

/// Return the pattern for a named style, or the pattern itself.
pub fn resolve_permalink_style(pattern: &str) -> &str {
	PERMALINK_STYLES
		.iter()
		.find(|(style, _)| *style == pattern)
		.map_or(pattern, |(_, expanded)| expanded)
}

/// Expand `pattern` for the document at source-relative `path` with the
/// merged `metadata`.
///
/// Every `:identifier` token must name a known variable; an unknown one is
/// an error rather than an empty substitution. The result always starts
/// with `/` and never contains `//`.
pub fn expand_permalink(
	pattern: &str,
	path: &str,
	metadata: &Metadata,
	markdown: &MarkdownExtensions,
) -> SiteResult<String> {
	let pattern = resolve_permalink_style(pattern);
	let variables = permalink_variables(path, metadata, markdown)?;
	let mut expanded = String::with_capacity(pattern.len());
	let mut rest = pattern;

	while let Some(colon) = rest.find(':') {
		expanded.push_str(&rest[..colon]);
		let after = &rest[colon + 1..];
		let token_len = after
			.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
			.unwrap_or(after.len());

		if token_len == 0 {
			expanded.push(':');
			rest = after;
			continue;
		}

		let name = &after[..token_len];
		let Some(value) = variables.get(name) else {
			let error = if DATE_VARIABLES.contains(&name) {
				PermalinkError::MissingDate {
					name: name.to_string(),
					pattern: pattern.to_string(),
					path: path.to_string(),
				}
			} else {
				PermalinkError::UnknownVariable {
					name: name.to_string(),
					pattern: pattern.to_string(),
					path: path.to_string(),
				}
			};
			return Err(error.into());
		};
		expanded.push_str(value);
		rest = &after[token_len..];
	}
	expanded.push_str(rest);

	Ok(clean_url(&expanded))
}

/// Replace every run of characters that are not ASCII letters or digits
/// with a single hyphen.
pub fn hyphenate(text: &str) -> String {
	let mut result = String::with_capacity(text.len());
	let mut in_run = false;

	for c in text.chars() {
		if c.is_ascii_alphanumeric() {
			result.push(c);
			in_run = false;
		} else if !in_run {
			result.push('-');
			in_run = true;
		}
	}

	result
}

/// Variables only defined for documents that have a date.
const DATE_VARIABLES: [&str; 7] = [
	"year",
	"month",
	"day",
	"i_month",
	"i_day",
	"short_year",
	"y_day",
];

/// The variables available to permalink patterns for one document.
pub fn permalink_variables(
	path: &str,
	metadata: &Metadata,
	markdown: &MarkdownExtensions,
) -> SiteResult<BTreeMap<&'static str, String>> {
	let file = Path::new(path);
	let ext = file
		.extension()
		.and_then(|ext| ext.to_str())
		.unwrap_or_default();
	let name = file
		.file_stem()
		.and_then(|stem| stem.to_str())
		.unwrap_or_default();
	let output_ext = if markdown.matches(path) { "html" } else { ext };

	let collection = metadata
		.get("collection")
		.and_then(Value::as_str)
		.unwrap_or_default();
	let local_path = if collection.is_empty() {
		path
	} else {
		let prefix = format!("_{collection}/");
		path.strip_prefix(&prefix).ok_or_else(|| {
			PermalinkError::CollectionPrefix {
				path: path.to_string(),
				collection: collection.to_string(),
				prefix,
			}
		})?
	};

	let date = document_date(path, name, metadata);
	let default_title = date.as_ref().map_or(name, |date| date.title);
	let title = metadata
		.get("title")
		.and_then(scalar_string)
		.unwrap_or_else(|| default_title.to_string());
	let slug = metadata
		.get("slug")
		.and_then(scalar_string)
		.unwrap_or_else(|| default_title.to_string());

	let mut variables = BTreeMap::from([
		("collection", collection.to_string()),
		("ext", ext.to_string()),
		("output_ext", output_ext.to_string()),
		("name", hyphenate(name)),
		("path", local_path.to_string()),
		("title", hyphenate(&title)),
		("slug", hyphenate(&slug)),
		("categories", categories(metadata).join("/")),
	]);

	if let Some(DocumentDate { date, .. }) = date {
		variables.extend([
			("year", date.format("%Y").to_string()),
			("month", date.format("%m").to_string()),
			("day", date.format("%d").to_string()),
			("i_month", date.month().to_string()),
			("i_day", date.day().to_string()),
			("short_year", date.format("%y").to_string()),
			("y_day", format!("{:03}", date.ordinal())),
		]);
	}

	Ok(variables)
}

struct DocumentDate<'a> {
	date: NaiveDate,
	/// Title implied by the file name once any date prefix is removed.
	title: &'a str,
}

/// A document's date comes from its `date` key, falling back to a
/// `YYYY-MM-DD-` prefix on the file name.
fn document_date<'a>(path: &str, name: &'a str, metadata: &Metadata) -> Option<DocumentDate<'a>> {
	let from_name = name
		.get(..11)
		.filter(|prefix| prefix.ends_with('-'))
		.and_then(|prefix| parse_date(&prefix[..10]))
		.map(|date| (date, &name[11..]));

	if let Some(value) = metadata.get("date").and_then(Value::as_str) {
		match value.get(..10).and_then(parse_date) {
			Some(date) => {
				return Some(DocumentDate {
					date,
					title: from_name.map_or(name, |(_, title)| title),
				});
			}
			None => tracing::warn!(path, date = value, "ignoring unparsable `date`"),
		}
	}

	from_name.map(|(date, title)| DocumentDate { date, title })
}

fn parse_date(text: &str) -> Option<NaiveDate> {
	NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

fn categories(metadata: &Metadata) -> Vec<String> {
	match metadata.get("categories").or_else(|| metadata.get("category")) {
		Some(Value::Array(items)) => items.iter().filter_map(scalar_string).collect(),
		Some(Value::String(text)) => text.split_whitespace().map(str::to_string).collect(),
		Some(other) => scalar_string(other).into_iter().collect(),
		None => Vec::new(),
	}
}

/// Render strings, numbers and booleans as text.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => Some(text.clone()),
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		_ => None,
	}
}

/// Ensure a leading slash and collapse repeated slashes.
fn clean_url(url: &str) -> String {
	let mut cleaned = String::with_capacity(url.len() + 1);
	cleaned.push('/');
	for c in url.chars() {
		if c == '/' && cleaned.ends_with('/') {
			continue;
		}
		cleaned.push(c);
	}
	cleaned
}
