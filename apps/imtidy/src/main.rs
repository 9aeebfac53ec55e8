//! Imtidy - Bibliography cleaner for LaTeX projects
//!
//! Scans a directory of LaTeX sources for citations and writes a cleaned
//! copy of a BibTeX file with unused and/or duplicate entries removed.

mod cli;

use clap::Parser;
use imtidy_core::{find_citations, find_source_files, process_bib_file, ConsoleReviewer};
use tracing_subscriber::prelude::*;

use cli::Cli;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so messages never mix with the review prompts on stdout
fn init_logging(default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = cli.cleanup_options();
    if options.is_noop() {
        println!(
            "No action specified. Please use '--remove-unused' and/or '--remove-duplicates' options."
        );
        return Ok(());
    }

    let config = cli.resolve_config()?;

    let files = find_source_files(&cli.tex_dir, &config.sources.extension)?;
    let names: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
    println!("Searching for citations in files: {}", names.join(", "));

    let citations = find_citations(&files)?;
    println!("Number of citations found: {}", citations.len());
    println!(
        "Found citations: {}",
        citations.iter().collect::<Vec<_>>().join(", ")
    );

    let mut reviewer = ConsoleReviewer::stdio();
    let (out_path, report) =
        process_bib_file(&cli.bib_file, &citations, &options, &config, &mut reviewer)?;

    if !report.missing_citations.is_empty() {
        println!(
            "Cited but not in {}: {}",
            cli.bib_file.display(),
            report.missing_citations.join(", ")
        );
    }
    println!(
        "Kept {} of {} entries ({} unused, {} duplicates removed)",
        report.entries_after,
        report.entries_before,
        report.unused_removed,
        report.duplicates_removed
    );
    println!("Wrote {}", out_path.display());

    if let Some(report_path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(report_path, json)
            .map_err(|e| format!("{}: {}", report_path.display(), e))?;
        tracing::info!("Wrote report to {:?}", report_path);
    }

    Ok(())
}
