use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::mpsc;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use pagewright_core::BuildFlags;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Build a static site from a tree of markdown and template sources.",
	long_about = "pagewright reads a source directory, applies front matter defaults, expands \
	              permalinks and writes the rendered site to a destination directory.\n\nQuick \
	              start:\n  pagewright build          Render the site into `_site`\n  \
	              pagewright build --watch  Rebuild whenever a source file changes\n  \
	              pagewright routes         List every permalink and the file serving it"
)]
pub struct PagewrightCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the site source directory.
	#[arg(long, short, global = true)]
	pub source: Option<PathBuf>,

	/// Output directory, overriding `destination` in `_config.yml`.
	#[arg(long, short, global = true)]
	pub destination: Option<PathBuf>,

	/// Keep documents marked `published: false`.
	#[arg(long, global = true, default_value_t = false)]
	pub unpublished: bool,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

impl PagewrightCli {
	/// The overrides passed on the command line.
	pub fn build_flags(&self) -> BuildFlags {
		BuildFlags {
			destination: self.destination.clone(),
			unpublished: self.unpublished,
		}
	}
}

#[derive(Subcommand)]
pub enum Commands {
	/// Read the source directory and write the rendered site.
	///
	/// Every routed document is written below the destination directory.
	/// A failure to render one document is reported and the remaining
	/// documents are still written; the exit code is non-zero if any
	/// document failed.
	Build {
		/// Keep running and rebuild whenever a source file changes. Changes
		/// to `_config.yml`, the data directory or the layouts directory
		/// reload the configuration too.
		#[arg(long, default_value_t = false)]
		watch: bool,
	},
	/// Print the routing table without writing anything.
	///
	/// Lists each permalink with the source file that serves it, in
	/// permalink order.
	Routes {
		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}

/// Turn the absolute paths reported by the file watcher into sorted,
/// de-duplicated paths relative to `source`. Paths outside `source` and
/// paths inside `destination` (the build's own output) are dropped.
pub fn source_relative_changes(
	source: &Path,
	destination: &Path,
	paths: impl IntoIterator<Item = PathBuf>,
) -> Vec<PathBuf> {
	paths
		.into_iter()
		.filter(|path| !path.starts_with(destination))
		.filter_map(|path| path.strip_prefix(source).ok().map(Path::to_path_buf))
		.filter(|path| !path.as_os_str().is_empty())
		.collect::<BTreeSet<_>>()
		.into_iter()
		.collect()
}

/// Pass the paths of a create, modify or remove event to the rebuild loop.
/// Returns `false` once the loop has hung up.
pub fn forward_watch_event(tx: &mpsc::Sender<Vec<PathBuf>>, event: notify::Event) -> bool {
	if !matches!(
		event.kind,
		notify::EventKind::Modify(_) | notify::EventKind::Create(_) | notify::EventKind::Remove(_)
	) {
		return true;
	}

	match tx.send(event.paths) {
		Ok(()) => true,
		Err(error) => {
			tracing::debug!(%error, "watch loop stopped, dropping file event");
			false
		}
	}
}
