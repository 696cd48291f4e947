use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::Document;
use crate::Site;
use crate::SiteError;
use crate::SiteResult;
use crate::render::RenderContext;

/// Result of writing a site to its destination.
#[derive(Debug, Default)]
pub struct WriteReport {
	/// Files written, in permalink order.
	pub written: Vec<PathBuf>,
	/// Per-document failures. One failure does not stop the others.
	pub errors: Vec<SiteError>,
}

impl WriteReport {
	/// Returns true if every routed document was written.
	pub fn is_ok(&self) -> bool {
		self.errors.is_empty()
	}
}

/// The file a permalink is written to: `/a/` becomes `a/index.html`.
pub fn output_path(destination: &Path, permalink: &str) -> PathBuf {
	let relative = permalink.trim_start_matches('/');
	if relative.is_empty() || permalink.ends_with('/') {
		destination.join(relative).join("index.html")
	} else {
		destination.join(relative)
	}
}

/// Write every routed document of `site` below its destination directory.
///
/// Only failing to create the destination itself is an error; individual
/// document failures are collected in the report.
pub fn write_site(site: &Site) -> SiteResult<WriteReport> {
	let destination = site.config().destination_dir();
	std::fs::create_dir_all(&destination)
		.map_err(|e| SiteError::path("create directory", &destination, e))?;

	let ctx = site.render_context();
	let mut report = WriteReport::default();
	for (permalink, document) in site.routed_documents() {
		let path = output_path(&destination, permalink);
		match write_document(document, &path, &ctx) {
			Ok(()) => report.written.push(path),
			Err(error) => {
				tracing::warn!(permalink, %error, "failed to write document");
				report.errors.push(error);
			}
		}
	}

	tracing::info!(
		written = report.written.len(),
		failed = report.errors.len(),
		destination = %destination.display(),
		"wrote site"
	);
	Ok(report)
}

fn write_document(document: &Document, path: &Path, ctx: &RenderContext) -> SiteResult<()> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)
			.map_err(|e| SiteError::path("create directory", parent, e))?;
	}

	let file = std::fs::File::create(path).map_err(|e| SiteError::path("create", path, e))?;
	let mut writer = BufWriter::new(file);
	document.write(&mut writer, ctx)?;
	writer.flush().map_err(|source| {
		SiteError::Write {
			permalink: document.permalink().to_string(),
			source,
		}
	})
}
