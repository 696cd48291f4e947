use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum SiteError {
	#[error("failed to {op} `{}`: {source}", .path.display())]
	#[diagnostic(code(pagewright::path))]
	Path {
		op: &'static str,
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("malformed front matter in `{path}`: {reason}")]
	#[diagnostic(
		code(pagewright::front_matter),
		help("front matter must be a YAML mapping between two `---` lines")
	)]
	FrontMatter { path: String, reason: String },

	#[error(transparent)]
	#[diagnostic(transparent)]
	Permalink(#[from] PermalinkError),

	#[error("template error in `{path}`: {message}")]
	#[diagnostic(code(pagewright::template))]
	Template { path: String, message: String },

	#[error("markdown conversion failed for `{path}`: {message}")]
	#[diagnostic(code(pagewright::markdown))]
	Markdown { path: String, message: String },

	#[error("failed to parse config file `{}`: {reason}", .path.display())]
	#[diagnostic(
		code(pagewright::config_parse),
		help("check that _config.yml is a valid YAML mapping")
	)]
	ConfigParse { path: PathBuf, reason: String },

	#[error("invalid pattern `{pattern}`: {reason}")]
	#[diagnostic(code(pagewright::invalid_pattern))]
	InvalidPattern { pattern: String, reason: String },

	#[error("failed to load data file `{path}`: {reason}")]
	#[diagnostic(code(pagewright::data_file))]
	DataFile { path: String, reason: String },

	#[error("unsupported data file format: `{0}`")]
	#[diagnostic(
		code(pagewright::unsupported_format),
		help("supported formats: json, yaml, yml, toml")
	)]
	UnsupportedDataFormat(String),

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(pagewright::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },

	#[error("failed to write `{permalink}`: {source}")]
	#[diagnostic(code(pagewright::write))]
	Write {
		permalink: String,
		#[source]
		source: std::io::Error,
	},
}

/// Failures while turning a permalink pattern into an output path.
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum PermalinkError {
	#[error("unknown variable `{name}` in permalink template `{pattern}` (from `{path}`)")]
	#[diagnostic(
		code(pagewright::permalink::unknown_variable),
		help(
			"available variables: collection, ext, output_ext, name, path, title, slug, \
			 categories, year, month, day, i_month, i_day, short_year, y_day"
		)
	)]
	UnknownVariable {
		name: String,
		pattern: String,
		path: String,
	},

	#[error("permalink template `{pattern}` uses `{name}` but `{path}` has no date")]
	#[diagnostic(
		code(pagewright::permalink::missing_date),
		help("date variables require a `date` key or a YYYY-MM-DD- file name prefix")
	)]
	MissingDate {
		name: String,
		pattern: String,
		path: String,
	},

	#[error("`{path}` is a member of collection `{collection}` but does not start with `{prefix}`")]
	#[diagnostic(
		code(pagewright::permalink::collection_prefix),
		help("the `collection` key is reserved for collection membership")
	)]
	CollectionPrefix {
		path: String,
		collection: String,
		prefix: String,
	},
}

impl SiteError {
	pub(crate) fn path(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::Path {
			op,
			path: path.into(),
			source,
		}
	}
}

pub type SiteResult<T> = Result<T, SiteError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
