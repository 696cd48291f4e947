use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use owo_colors::OwoColorize;
use pagewright_cli::Commands;
use pagewright_cli::OutputFormat;
use pagewright_cli::PagewrightCli;
use pagewright_cli::forward_watch_event;
use pagewright_cli::source_relative_changes;
use pagewright_core::DocumentKind;
use pagewright_core::Site;
use pagewright_core::SiteError;
use pagewright_core::write_site;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
	let args = PagewrightCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match args.command {
		Some(Commands::Build { watch }) => run_build(&args, watch),
		Some(Commands::Routes { format }) => run_routes(&args, format),
		None => {
			eprintln!("No subcommand specified. Run `pagewright --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		print_error(e);
		process::exit(2);
	}
}

/// Log to stderr. `RUST_LOG` wins over the defaults: warnings, or debug
/// output for pagewright itself with `--verbose`.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_directives = if verbose {
		"warn,pagewright=debug,pagewright_core=debug"
	} else {
		"warn"
	};
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(default_directives));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_ansi(use_color)
		.with_target(false)
		.without_time()
		.with_writer(std::io::stderr)
		.init();
}

/// Render through miette when possible for codes and help text.
fn print_error(e: Box<dyn std::error::Error>) {
	match e.downcast::<SiteError>() {
		Ok(site_err) => {
			let report: miette::Report = (*site_err).into();
			eprintln!("{report:?}");
		}
		Err(e) => {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

fn resolve_source(args: &PagewrightCli) -> PathBuf {
	args.source
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn read_site(args: &PagewrightCli) -> CliResult<Site> {
	let mut site = Site::from_directory(&resolve_source(args), args.build_flags())?;
	site.read()?;
	Ok(site)
}

fn run_build(args: &PagewrightCli, watch: bool) -> CliResult<()> {
	let site = read_site(args)?;
	let all_written = write_and_report(args, &site)?;

	if !watch {
		if !all_written {
			process::exit(1);
		}
		return Ok(());
	}

	println!("\nWatching for file changes... (press Ctrl+C to stop)");

	let source = resolve_source(args);
	let source = source.canonicalize().unwrap_or(source);
	let destination = site.config().destination_dir();
	let destination = destination.canonicalize().unwrap_or(destination);
	let (tx, rx) = mpsc::channel();

	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			match res {
				Ok(event) => {
					forward_watch_event(&tx, event);
				}
				Err(error) => tracing::warn!(%error, "file watcher error"),
			}
		})?;

	use notify::Watcher;
	watcher.watch(&source, notify::RecursiveMode::Recursive)?;

	let mut current = Some(site);
	loop {
		let mut paths = rx.recv()?;
		// Debounce: collect additional events within 200ms.
		while let Ok(more) = rx.recv_timeout(Duration::from_millis(200)) {
			paths.extend(more);
		}

		let changed = source_relative_changes(&source, &destination, paths);
		if changed.is_empty() {
			continue;
		}

		println!("\nFile change detected, rebuilding...");
		tracing::debug!(?changed, "source changes");
		let rebuilt: CliResult<Site> = match current.take() {
			Some(site) => site.reloaded(&changed).map_err(Into::into),
			// The previous pass failed, so there is nothing to reuse.
			None => read_site(args),
		};

		match rebuilt {
			Ok(site) => {
				if let Err(e) = write_and_report(args, &site) {
					print_error(e);
				}
				current = Some(site);
			}
			Err(e) => print_error(e),
		}
	}
}

/// Write the site and print a summary. Returns whether every document was
/// written.
fn write_and_report(args: &PagewrightCli, site: &Site) -> CliResult<bool> {
	let destination = site.config().destination_dir();
	let report = write_site(site)?;
	let written = report.written.len();
	let failed = report.errors.len();

	if args.verbose {
		for path in &report.written {
			println!("  {}", make_relative(path, &destination));
		}
	}

	for error in report.errors {
		let report: miette::Report = error.into();
		eprintln!("{report:?}");
	}

	if failed == 0 {
		println!(
			"{} Wrote {written} file(s) to {}.",
			colored!("✓", green),
			destination.display()
		);
		Ok(true)
	} else {
		println!(
			"{} Wrote {written} file(s) to {}, {failed} failed.",
			colored!("✗", red),
			destination.display()
		);
		Ok(false)
	}
}

fn run_routes(args: &PagewrightCli, format: OutputFormat) -> CliResult<()> {
	let site = read_site(args)?;

	match format {
		OutputFormat::Text => {
			if site.routes().is_empty() {
				println!("No routes.");
				return Ok(());
			}

			println!("{}", colored!("Routes:", bold));
			for (permalink, document) in site.routed_documents() {
				let origin = if document.relative_path().is_empty() {
					colored!("(generated)", yellow)
				} else {
					document.relative_path().to_string()
				};
				println!("  {permalink:<40} {origin}");
			}
		}
		OutputFormat::Json => {
			let routes: Vec<serde_json::Value> = site
				.routed_documents()
				.map(|(permalink, document)| {
					let source = Some(document.relative_path()).filter(|path| !path.is_empty());
					serde_json::json!({
						"permalink": permalink,
						"source": source,
						"kind": kind_name(document.kind()),
						"published": document.published(),
					})
				})
				.collect();
			println!("{}", serde_json::to_string_pretty(&routes)?);
		}
	}

	Ok(())
}

fn kind_name(kind: &DocumentKind) -> &'static str {
	match kind {
		DocumentKind::Static => "static",
		DocumentKind::Dynamic { .. } => "dynamic",
		DocumentKind::Generated { .. } => "generated",
		_ => "unknown",
	}
}

fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
