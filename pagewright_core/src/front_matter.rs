//! Splitting raw source bytes into an optional front matter block and a body.

use crate::SiteError;
use crate::SiteResult;

/// Document metadata: string keys mapped to arbitrary YAML-shaped values.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

const DELIMITER: &[u8] = b"---";

/// The result of splitting a file that starts with a front matter block.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
	/// The parsed metadata block.
	pub metadata: Metadata,
	/// Everything after the closing delimiter, preceded by one blank line per
	/// line the front matter occupied so that body line numbers stay stable.
	pub body: Vec<u8>,
}

/// Byte offsets of a detected front matter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontMatterSpan {
	/// Start of the yaml content (just past the opening `---\n`).
	pub content_start: usize,
	/// End of the yaml content (start of the closing `---` line).
	pub content_end: usize,
	/// First byte after the closing delimiter line.
	pub body_start: usize,
}

/// Locate a front matter block. It must start at byte 0 with a `---` line
/// and end at the next line consisting exactly of `---`.
pub fn find_front_matter(source: &[u8]) -> Option<FrontMatterSpan> {
	let first_line_end = DELIMITER.len();
	if !source.starts_with(DELIMITER) || source.get(first_line_end) != Some(&b'\n') {
		return None;
	}

	let content_start = first_line_end + 1;
	let mut line_start = content_start;
	while line_start <= source.len() {
		let line_end = source[line_start..]
			.iter()
			.position(|&byte| byte == b'\n')
			.map_or(source.len(), |offset| line_start + offset);

		if &source[line_start..line_end] == DELIMITER {
			return Some(FrontMatterSpan {
				content_start,
				content_end: line_start,
				body_start: (line_end + 1).min(source.len()),
			});
		}

		if line_end == source.len() {
			break;
		}
		line_start = line_end + 1;
	}

	None
}

/// Split `source` into front matter and body. Returns `Ok(None)` when the
/// file has no front matter block. `path` only qualifies errors.
pub fn extract_front_matter(path: &str, source: &[u8]) -> SiteResult<Option<FrontMatter>> {
	let Some(span) = find_front_matter(source) else {
		return Ok(None);
	};

	let metadata = parse_metadata(path, &source[span.content_start..span.content_end])?;
	let mut body: Vec<u8> = source[..span.body_start]
		.iter()
		.copied()
		.filter(|byte| matches!(byte, b'\n' | b'\r'))
		.collect();
	body.extend_from_slice(&source[span.body_start..]);

	Ok(Some(FrontMatter { metadata, body }))
}

fn parse_metadata(path: &str, yaml: &[u8]) -> SiteResult<Metadata> {
	let malformed = |reason: String| {
		SiteError::FrontMatter {
			path: path.to_string(),
			reason,
		}
	};

	let value: serde_yaml_ng::Value =
		serde_yaml_ng::from_slice(yaml).map_err(|e| malformed(e.to_string()))?;

	match value {
		serde_yaml_ng::Value::Null => Ok(Metadata::new()),
		serde_yaml_ng::Value::Mapping(_) => {
			serde_yaml_ng::from_value(value).map_err(|e| malformed(e.to_string()))
		}
		_ => Err(malformed("expected a mapping of keys to values".to_string())),
	}
}
