use std::path::Path;

use serde_json::Value;

use crate::Metadata;
use crate::SiteError;
use crate::SiteResult;

/// Load every data file below `dir` into a map keyed by file stem.
/// Subdirectories become nested maps. A missing directory yields an empty
/// map. Files with other extensions are ignored.
pub fn load_data_dir(dir: &Path) -> SiteResult<Metadata> {
	let mut data = Metadata::new();
	if !dir.is_dir() {
		return Ok(data);
	}

	let mut entries = std::fs::read_dir(dir)
		.map_err(|e| SiteError::path("read directory", dir, e))?
		.map(|entry| {
			entry
				.map(|entry| entry.path())
				.map_err(|e| SiteError::path("read directory", dir, e))
		})
		.collect::<SiteResult<Vec<_>>>()?;
	entries.sort();

	for path in entries {
		let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
			continue;
		};
		if stem.starts_with('.') {
			continue;
		}

		if path.is_dir() {
			data.insert(stem.to_string(), Value::Object(load_data_dir(&path)?));
			continue;
		}

		let format = path
			.extension()
			.and_then(|e| e.to_str())
			.unwrap_or("")
			.to_ascii_lowercase();
		if !matches!(format.as_str(), "json" | "yaml" | "yml" | "toml") {
			tracing::debug!(path = %path.display(), "skipping unsupported data file");
			continue;
		}

		let content = std::fs::read_to_string(&path).map_err(|e| {
			SiteError::DataFile {
				path: path.display().to_string(),
				reason: e.to_string(),
			}
		})?;
		let value = parse_data_file(&content, &format, &path.display().to_string())?;
		data.insert(stem.to_string(), value);
	}

	Ok(data)
}

/// Parse a data file's content into a `serde_json::Value` based on its
/// format.
pub fn parse_data_file(content: &str, format: &str, path_display: &str) -> SiteResult<Value> {
	let data_error = |reason: String| {
		SiteError::DataFile {
			path: path_display.to_string(),
			reason,
		}
	};

	match format {
		"json" => serde_json::from_str(content).map_err(|e| data_error(e.to_string())),
		"toml" => {
			let toml_value: toml::Value =
				toml::from_str(content).map_err(|e| data_error(e.to_string()))?;
			toml_to_json(toml_value, path_display)
		}
		"yaml" | "yml" => {
			let value: Option<Value> =
				serde_yaml_ng::from_str(content).map_err(|e| data_error(e.to_string()))?;
			Ok(value.unwrap_or(Value::Null))
		}
		other => Err(SiteError::UnsupportedDataFormat(other.to_string())),
	}
}

/// Convert a `toml::Value` to a `serde_json::Value`.
fn toml_to_json(value: toml::Value, path_display: &str) -> SiteResult<Value> {
	let json = match value {
		toml::Value::String(s) => Value::String(s),
		toml::Value::Integer(i) => Value::Number(i.into()),
		toml::Value::Float(f) => {
			Value::Number(serde_json::Number::from_f64(f).ok_or_else(|| {
				SiteError::DataFile {
					path: path_display.to_string(),
					reason: format!("unconvertible float value {f}"),
				}
			})?)
		}
		toml::Value::Boolean(b) => Value::Bool(b),
		toml::Value::Datetime(dt) => Value::String(dt.to_string()),
		toml::Value::Array(arr) => {
			let items: SiteResult<Vec<Value>> = arr
				.into_iter()
				.map(|v| toml_to_json(v, path_display))
				.collect();
			Value::Array(items?)
		}
		toml::Value::Table(table) => {
			let mut map = serde_json::Map::new();
			for (k, v) in table {
				map.insert(k, toml_to_json(v, path_display)?);
			}
			Value::Object(map)
		}
	};

	Ok(json)
}
