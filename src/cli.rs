// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Option<T>: For arguments the user may leave out
// - Derive macros: Automatically generate code for our types
// =============================================================================

use crate::crawl::{DEFAULT_MAX_DEPTH, DEFAULT_OUTPUT_DIR, DEFAULT_RESOURCES_DIR};
use anyhow::{anyhow, Result};
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug)]
#[command(
    name = "site-cloner",
    version,
    about = "Mirror a website (pages, stylesheets, scripts and images) to local disk",
    long_about = "site-cloner downloads a web page, rewrites its stylesheets, scripts and images \
                  to local copies, and follows same-site links up to a maximum depth so the \
                  result can be browsed offline."
)]
pub struct Cli {
    /// Website URL to clone (e.g., https://example.com)
    ///
    /// Can also be given with --url
    #[arg(value_name = "URL", conflicts_with = "url_flag")]
    pub url: Option<String>,

    /// Website URL to clone (alternative to the positional argument)
    #[arg(long = "url", id = "url_flag", value_name = "URL")]
    pub url_flag: Option<String>,

    /// Directory to write the mirrored site into
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Maximum crawl depth
    ///
    /// Depth 0 = just the starting page (and its assets)
    /// Depth 1 = starting page + all same-site pages it links to
    /// etc.
    #[arg(short, long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub depth: usize,

    /// Folder inside the output directory for css/, js/ and img/
    #[arg(long, default_value = DEFAULT_RESOURCES_DIR)]
    pub resources_dir: String,

    /// Maximum number of simultaneous HTTP requests (default: unlimited)
    #[arg(long)]
    pub max_concurrency: Option<NonZeroUsize>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Print the final summary as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// More log output (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    // The URL from either the positional argument or --url
    pub fn target_url(&self) -> Result<&str> {
        self.url
            .as_deref()
            .or(self.url_flag.as_deref())
            .ok_or_else(|| {
                anyhow!("Please provide a URL to clone, either as the first argument or with --url")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_url_and_defaults() {
        let cli = Cli::try_parse_from(["site-cloner", "https://example.com"]).unwrap();

        assert_eq!(cli.target_url().unwrap(), "https://example.com");
        assert_eq!(cli.output, PathBuf::from("cloned-site"));
        assert_eq!(cli.depth, 1);
        assert_eq!(cli.resources_dir, "resources");
        assert_eq!(cli.max_concurrency, None);
        assert_eq!(cli.timeout, 30);
        assert!(!cli.json);
    }

    #[test]
    fn test_url_flag_and_options() {
        let cli = Cli::try_parse_from([
            "site-cloner",
            "--url",
            "https://example.com/docs/",
            "-o",
            "mirror",
            "-d",
            "3",
            "--max-concurrency",
            "8",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.target_url().unwrap(), "https://example.com/docs/");
        assert_eq!(cli.output, PathBuf::from("mirror"));
        assert_eq!(cli.depth, 3);
        assert_eq!(cli.max_concurrency, NonZeroUsize::new(8));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_missing_url_is_an_error() {
        let cli = Cli::try_parse_from(["site-cloner"]).unwrap();
        assert!(cli.target_url().is_err());
    }

    #[test]
    fn test_url_given_twice_is_rejected() {
        let result = Cli::try_parse_from([
            "site-cloner",
            "https://a.example",
            "--url",
            "https://b.example",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let result = Cli::try_parse_from(["site-cloner", "https://a.example", "--max-concurrency", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_depth_is_rejected() {
        let result = Cli::try_parse_from(["site-cloner", "https://a.example", "--depth", "-1"]);
        assert!(result.is_err());
    }
}
