use std::path::Path;

use crate::CONFIG_FILE_NAME;
use crate::SiteConfig;

/// How much of the site has to be rebuilt after source changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadPlan {
	/// Re-read the configuration and rebuild everything from nothing.
	Full,
	/// Keep the parsed configuration; rerun the document read pass.
	Partial,
}

/// Decide the reload needed for `changed`, a set of source-relative paths.
///
/// A full reload is required when the configuration file changed or when a
/// path lies under the data or layouts directory. Directory tests are
/// component-wise: `_data` does not cover `_database.md`.
pub fn plan_reload<P: AsRef<Path>>(config: &SiteConfig, changed: &[P]) -> ReloadPlan {
	let requires_full = changed.iter().map(AsRef::as_ref).any(|path| {
		path == Path::new(CONFIG_FILE_NAME)
			|| is_under(path, &config.data_dir)
			|| is_under(path, &config.layouts_dir)
	});

	if requires_full {
		ReloadPlan::Full
	} else {
		ReloadPlan::Partial
	}
}

fn is_under(path: &Path, dir: &Path) -> bool {
	let dir = dir.strip_prefix(".").unwrap_or(dir);
	let path = path.strip_prefix(".").unwrap_or(path);
	!dir.as_os_str().is_empty() && path.starts_with(dir)
}
