mod common;

use clap::Parser;
use pagewright_cli::Commands;
use pagewright_cli::OutputFormat;
use pagewright_cli::PagewrightCli;
use pagewright_core::AnyEmptyResult;
use serde_json::Value;

fn sample_site(root: &std::path::Path) -> std::io::Result<()> {
	common::write_file(
		root,
		"_config.yml",
		"url: https://example.com\nplugins: [jekyll-sitemap]\ncollections:\n  posts:\n    output: \
		 true\n    permalink: pretty\n",
	)?;
	common::write_file(root, "index.html", "---\n---\nhome\n")?;
	common::write_file(root, "robots.txt", "User-agent: *\n")?;
	common::write_file(root, "_posts/2024-02-03-first-post.md", "---\n---\nfirst\n")
}

#[test]
fn routes_lists_permalinks_as_text() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	sample_site(tmp.path())?;

	let output = common::pagewright_cmd()
		.arg("routes")
		.arg("--source")
		.arg(tmp.path())
		.output()?;
	assert!(output.status.success());

	let stdout = String::from_utf8(output.stdout)?;
	let lines: Vec<&str> = stdout.lines().map(str::trim).collect();
	assert_eq!(lines[0], "Routes:");
	assert!(lines[1].starts_with("/2024/02/03/first-post/"));
	assert!(lines[1].ends_with("_posts/2024-02-03-first-post.md"));
	assert!(lines[2].starts_with("/index.html"));
	assert!(lines[3].starts_with("/robots.txt"));
	assert!(lines[4].starts_with("/sitemap.xml"));
	assert!(lines[4].ends_with("(generated)"));
	assert!(!tmp.path().join("_site").exists());

	Ok(())
}

#[test]
fn routes_json_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	sample_site(tmp.path())?;

	let output = common::pagewright_cmd()
		.arg("routes")
		.arg("--format")
		.arg("json")
		.arg("--source")
		.arg(tmp.path())
		.output()?;
	assert!(output.status.success());

	let routes: Value = serde_json::from_slice(&output.stdout)?;
	let routes = routes.as_array().ok_or("expected an array")?;
	assert_eq!(routes.len(), 4);
	assert_eq!(routes[0]["permalink"], "/2024/02/03/first-post/");
	assert_eq!(routes[0]["kind"], "dynamic");
	assert_eq!(routes[2]["source"], "robots.txt");
	assert_eq!(routes[2]["kind"], "static");
	assert_eq!(routes[3]["source"], Value::Null);
	assert_eq!(routes[3]["kind"], "generated");

	Ok(())
}

#[test]
fn routes_on_empty_site() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::pagewright_cmd()
		.arg("routes")
		.arg("--source")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("No routes."));

	Ok(())
}

#[test]
fn routes_format_parses() {
	let cli = PagewrightCli::parse_from(["pagewright", "routes"]);
	match cli.command {
		Some(Commands::Routes { format }) => assert!(matches!(format, OutputFormat::Text)),
		_ => panic!("expected Routes command"),
	}

	let cli = PagewrightCli::parse_from(["pagewright", "routes", "--format", "json", "-s", "site"]);
	match cli.command {
		Some(Commands::Routes { format }) => assert!(matches!(format, OutputFormat::Json)),
		_ => panic!("expected Routes command"),
	}
	assert_eq!(cli.source.as_deref(), Some(std::path::Path::new("site")));
}
