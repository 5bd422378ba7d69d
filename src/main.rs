// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Validate them into a CrawlConfig (bad URL = stop right here)
// 3. Run the crawl and wait until every page and asset task is done
// 4. Print a summary and exit (0 = crawl completed, 1 = could not start)
//
// Individual pages or assets that fail to download do NOT change the exit
// code: a partial mirror is still a successful run.
//
// Rust concepts used:
// - async/await: Because we make many network requests concurrently
// - Result<T, E>: For error handling (T = success type, E = error type)
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli; // src/cli.rs - command-line parsing
mod crawl; // src/crawl/ - crawl orchestration
mod logging; // src/logging.rs - tracing setup
mod mirror; // src/mirror/ - resolving, rewriting and saving resources

#[cfg(test)]
mod testing; // src/testing.rs - local HTTP server for tests

use anyhow::Result;
use clap::Parser; // Parser trait enables the parse() method
use cli::Cli;
use crawl::{CrawlConfig, CrawlSummary};
use std::time::Duration;

// The #[tokio::main] attribute transforms our async main into a real main function
// It creates a multi-threaded tokio runtime and runs our async code inside it
#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> Result<()> {
    let config = CrawlConfig::new(cli.target_url()?, &cli.output, cli.depth)?
        .with_resources_dir(&cli.resources_dir)?
        .with_max_concurrency(cli.max_concurrency.map(|n| n.get()))
        .with_timeout(Duration::from_secs(cli.timeout));

    if !cli.json {
        println!(
            "🔍 Cloning {} into {}",
            config.seed,
            config.output_dir.display()
        );
        println!("📊 Max crawl depth: {}", config.max_depth);
    }

    let summary = crawl::clone_site(config).await?;

    print_summary(&summary, cli.json)
}

// Prints the summary either as text or JSON
fn print_summary(summary: &CrawlSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!();
    println!("📊 Summary:");
    println!(
        "   📄 Pages:  {} saved, {} failed, {} skipped",
        summary.pages_written, summary.pages_failed, summary.pages_skipped
    );
    println!(
        "   🧩 Assets: {} saved, {} failed (of {})",
        summary.assets_written, summary.assets_failed, summary.assets_dispatched
    );
    if summary.panics_recovered > 0 {
        println!("   ⚠️  Tasks recovered from panics: {}", summary.panics_recovered);
    }
    println!("   ⏱️  {:.1}s", summary.elapsed_ms as f64 / 1000.0);
    println!();
    println!("✅ Website cloning completed: {}", summary.output_dir);

    Ok(())
}
