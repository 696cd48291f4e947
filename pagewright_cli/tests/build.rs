mod common;

use std::path::PathBuf;
use std::sync::mpsc;

use clap::Parser;
use pagewright_cli::Commands;
use pagewright_cli::PagewrightCli;
use pagewright_cli::forward_watch_event;
use pagewright_cli::source_relative_changes;
use pagewright_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;

#[test]
fn build_writes_rendered_site() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let root = tmp.path();
	common::write_file(root, "_config.yml", "title: Example\n")?;
	common::write_file(
		root,
		"about.md",
		"---\ntitle: About\npermalink: /about/\n---\n# {{ page.title }} {{ site.title }}\n",
	)?;
	common::write_file(root, "css/site.css", "body { margin: 0; }\n")?;
	common::write_file(root, "_drafts/wip.md", "---\n---\nwip\n")?;

	common::pagewright_cmd()
		.arg("build")
		.arg("--source")
		.arg(root)
		.assert()
		.success()
		.stdout(predicates::str::contains("Wrote 2 file(s)"));

	let about = std::fs::read_to_string(root.join("_site/about/index.html"))?;
	assert!(about.contains("<h1>About Example</h1>"), "got: {about}");
	assert_eq!(
		std::fs::read_to_string(root.join("_site/css/site.css"))?,
		"body { margin: 0; }\n"
	);
	assert!(!root.join("_site/_drafts").exists());

	Ok(())
}

#[test]
fn build_respects_destination_flag() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let root = tmp.path();
	common::write_file(root, "index.html", "---\n---\nhome\n")?;

	common::pagewright_cmd()
		.arg("build")
		.arg("--source")
		.arg(root)
		.arg("--destination")
		.arg("public")
		.assert()
		.success();

	assert!(root.join("public/index.html").is_file());
	assert!(!root.join("_site").exists());

	Ok(())
}

#[test]
fn build_skips_unpublished_unless_requested() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let root = tmp.path();
	common::write_file(root, "draft.html", "---\npublished: false\n---\ndraft\n")?;

	common::pagewright_cmd()
		.arg("build")
		.arg("--source")
		.arg(root)
		.assert()
		.success();
	assert!(!root.join("_site/draft.html").exists());

	common::pagewright_cmd()
		.arg("build")
		.arg("--source")
		.arg(root)
		.arg("--unpublished")
		.assert()
		.success();
	assert!(root.join("_site/draft.html").is_file());

	Ok(())
}

#[test]
fn build_reports_render_failures_and_keeps_going() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let root = tmp.path();
	common::write_file(root, "bad.html", "---\n---\n{% if %}\n")?;
	common::write_file(root, "good.html", "---\n---\ngood\n")?;

	common::pagewright_cmd()
		.arg("build")
		.arg("--source")
		.arg(root)
		.assert()
		.code(1)
		.stdout(predicates::str::contains("1 failed"))
		.stderr(predicates::str::contains("bad.html"));

	assert!(root.join("_site/good.html").is_file());

	Ok(())
}

#[test]
fn build_fails_on_malformed_front_matter() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let root = tmp.path();
	common::write_file(root, "broken.md", "---\ntitle: [unclosed\n---\nbody\n")?;

	common::pagewright_cmd()
		.arg("build")
		.arg("--source")
		.arg(root)
		.assert()
		.code(2)
		.stderr(
			predicates::str::contains("pagewright::front_matter")
				.and(predicates::str::contains("broken.md")),
		);

	assert!(!root.join("_site").exists());

	Ok(())
}

#[test]
fn build_fails_on_malformed_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "_config.yml", "collections: [unclosed\n")?;

	common::pagewright_cmd()
		.arg("build")
		.arg("--source")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("pagewright::config_parse"));

	Ok(())
}

#[test]
fn missing_subcommand_fails() {
	common::pagewright_cmd()
		.assert()
		.code(1)
		.stderr(predicates::str::contains("No subcommand specified"));
}

#[test]
fn build_watch_flag_parses() {
	let cli = PagewrightCli::parse_from(["pagewright", "build", "--watch", "--unpublished"]);
	match cli.command {
		Some(Commands::Build { watch }) => assert!(watch),
		_ => panic!("expected Build command"),
	}
	assert!(cli.build_flags().unpublished);
	assert!(cli.build_flags().destination.is_none());

	let cli = PagewrightCli::parse_from(["pagewright", "build", "-d", "out"]);
	match cli.command {
		Some(Commands::Build { watch }) => assert!(!watch),
		_ => panic!("expected Build command"),
	}
	assert_eq!(cli.build_flags().destination, Some(PathBuf::from("out")));
}

#[test]
fn watcher_paths_become_source_relative() {
	let changed = source_relative_changes(
		&PathBuf::from("/site"),
		&PathBuf::from("/site/_site"),
		[
			PathBuf::from("/site/about.md"),
			PathBuf::from("/site/_site/about.md"),
			PathBuf::from("/site/_config.yml"),
			PathBuf::from("/site/about.md"),
			PathBuf::from("/elsewhere/file.md"),
			PathBuf::from("/site"),
		],
	);
	assert_eq!(changed, [PathBuf::from("_config.yml"), PathBuf::from("about.md")]);
}

#[test]
fn watch_events_reach_the_rebuild_loop() {
	let (tx, rx) = mpsc::channel();
	let modified = notify::Event::new(notify::EventKind::Modify(notify::event::ModifyKind::Any))
		.add_path(PathBuf::from("/site/about.md"));
	let accessed = notify::Event::new(notify::EventKind::Access(notify::event::AccessKind::Any))
		.add_path(PathBuf::from("/site/index.md"));

	assert!(forward_watch_event(&tx, accessed));
	assert!(forward_watch_event(&tx, modified.clone()));
	assert_eq!(rx.try_recv().ok(), Some(vec![PathBuf::from("/site/about.md")]));
	assert!(rx.try_recv().is_err());

	drop(rx);
	assert!(!forward_watch_event(&tx, modified));
}
