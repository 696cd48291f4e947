//! `pagewright_core` turns a directory of markup and template sources into
//! a routed set of documents. It decides which files are copied verbatim and
//! which are rendered, where each one is written, and with what metadata.
//!
//! ## Processing Pipeline
//!
//! ```text
//! _config.yml
//!   → SiteConfig (collections, defaults rules, excludes, plugins)
//! Source tree
//!   → Tree walk (exclusion rules, directories pruned)
//!   → Front matter split (`---` block at byte 0 = dynamic document)
//!   → Defaults resolver (built-in → collection → rules → front matter)
//!   → Permalink expansion (`:token` patterns and named styles)
//!   → Site registry (document list + permalink routing table)
//!   → Plugins (post-read hooks: redirects, sitemap)
//!   → Output (template evaluation, markdown, files under the destination)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: `_config.yml` loading and command line overrides.
//! - [`permalink`]: permalink styles, variables and expansion.
//! - [`plugins`]: the post-read hook contract and the built-in plugins.
//!
//! ## Key Types
//!
//! - [`Site`]: the document registry and routing table; drives a read pass.
//! - [`Document`]: a static, dynamic or generated document with its permalink.
//! - [`Collection`]: documents read from a `_<name>/` directory.
//! - [`DefaultsResolver`]: compiled `defaults` rules.
//! - [`ReloadPlan`]: full or partial reload after source changes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use pagewright_core::BuildFlags;
//! use pagewright_core::Site;
//! use pagewright_core::write_site;
//!
//! let mut site = Site::from_directory(Path::new("."), BuildFlags::default())?;
//! site.read()?;
//!
//! for (permalink, document) in site.routed_documents() {
//! 	println!("{permalink} <- {}", document.relative_path());
//! }
//!
//! let report = write_site(&site)?;
//! if !report.is_ok() {
//! 	eprintln!("{} document(s) failed to render", report.errors.len());
//! }
//! # Ok::<(), pagewright_core::SiteError>(())
//! ```

pub use collection::*;
pub use config::*;
pub use data::*;
pub use defaults::*;
pub use document::*;
pub use error::*;
pub use filter::*;
pub use front_matter::*;
pub use output::*;
pub use permalink::*;
pub use plugins::Plugin;
pub use plugins::PluginRegistry;
pub use reload::*;
pub use render::*;
pub use site::*;

mod collection;
pub mod config;
mod data;
mod defaults;
mod document;
#[allow(unused_assignments)]
mod error;
mod filter;
mod front_matter;
mod output;
pub mod permalink;
pub mod plugins;
mod reload;
mod render;
mod site;
