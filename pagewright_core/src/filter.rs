use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;

use crate::SiteConfig;
use crate::SiteError;
use crate::SiteResult;

/// Decides which source entries take part in a read pass.
///
/// Names starting with `.`, `_` or `#`, and names ending in `~`, are
/// skipped unless an `include` glob matches them. `exclude` entries follow
/// gitignore syntax. The destination directory is always skipped.
#[derive(Debug, Clone)]
pub struct EntryFilter {
	exclude: Gitignore,
	include: GlobSet,
	destination: Option<PathBuf>,
}

impl EntryFilter {
	pub fn new(config: &SiteConfig) -> SiteResult<Self> {
		let destination = if config.destination.is_absolute() {
			config
				.destination
				.strip_prefix(&config.source)
				.ok()
				.map(Path::to_path_buf)
		} else {
			Some(config.destination.clone())
		};

		Ok(Self {
			exclude: build_exclude_matcher(&config.source, &config.exclude)?,
			include: build_include_set(&config.include)?,
			destination,
		})
	}

	/// Whether the entry at source-relative `rel_path` is skipped.
	pub fn is_excluded(&self, rel_path: &str, is_dir: bool) -> bool {
		let path = Path::new(rel_path);
		if self
			.destination
			.as_deref()
			.is_some_and(|destination| path == destination)
		{
			return true;
		}

		if self.exclude.matched(path, is_dir).is_ignore() {
			return true;
		}

		let name = path
			.file_name()
			.and_then(|name| name.to_str())
			.unwrap_or_default();
		is_reserved_name(name) && !self.is_included(path, name)
	}

	fn is_included(&self, path: &Path, name: &str) -> bool {
		self.include.is_match(name) || self.include.is_match(path)
	}
}

fn is_reserved_name(name: &str) -> bool {
	name.starts_with(['.', '_', '#']) || name.ends_with('~')
}

/// Build a `Gitignore` matcher from the configured `exclude` entries.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> SiteResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			SiteError::InvalidPattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			}
		})?;
	}
	builder.build().map_err(|e| {
		SiteError::InvalidPattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}

fn build_include_set(patterns: &[String]) -> SiteResult<GlobSet> {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let glob = Glob::new(pattern).map_err(|e| {
			SiteError::InvalidPattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			}
		})?;
		builder.add(glob);
	}
	builder.build().map_err(|e| {
		SiteError::InvalidPattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}

/// Collect the files under `dir` that pass `filter`, as `/`-separated paths
/// relative to `source`.
///
/// Entries are visited depth first in file name order, so the result is
/// deterministic. Excluded directories are not descended into.
pub fn walk_files(source: &Path, dir: &Path, filter: &EntryFilter) -> SiteResult<Vec<String>> {
	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();
	walk_dir(source, dir, filter, &mut files, &mut visited_dirs)?;
	Ok(files)
}

fn walk_dir(
	source: &Path,
	dir: &Path,
	filter: &EntryFilter,
	files: &mut Vec<String>,
	visited_dirs: &mut HashSet<PathBuf>,
) -> SiteResult<()> {
	// Detect symlink cycles by tracking canonical paths.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		return Err(SiteError::SymlinkCycle {
			path: dir.display().to_string(),
		});
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
		let Some(rel_path) = relative_key(source, &path) else {
			continue;
		};
		let is_dir = path.is_dir();

		if filter.is_excluded(&rel_path, is_dir) {
			tracing::trace!(path = %rel_path, "skipping excluded entry");
			continue;
		}

		if is_dir {
			walk_dir(source, &path, filter, files, visited_dirs)?;
		} else {
			files.push(rel_path);
		}
	}

	Ok(())
}

/// A `/`-separated path of `path` relative to `source`.
pub fn relative_key(source: &Path, path: &Path) -> Option<String> {
	let rel = path.strip_prefix(source).ok()?;
	Some(rel.to_string_lossy().replace('\\', "/"))
}
