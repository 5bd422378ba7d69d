// src/crawl/context.rs
// =============================================================================
// Settings and shared state for one crawl run.
//
// - CrawlConfig: what the user asked for (validated once, up front)
// - CrawlContext: everything the concurrent tasks share, behind one Arc
// - CrawlTarget: one page to visit and how far it is from the seed
// - CrawlStats / CrawlSummary: counters and the final report
//
// Rust concepts:
// - Arc<T>: Shared ownership across tasks and threads
// - Atomics: Counters updated from many tasks without locking
// - Builder-style methods: `config.with_timeout(..)` returns the new config
// =============================================================================

use crate::crawl::tracker::WorkTracker;
use crate::crawl::visited::VisitedRegistry;
use crate::mirror::{AssetMaterializer, Fetcher, SiteAuthority};
use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

pub const DEFAULT_OUTPUT_DIR: &str = "cloned-site";
pub const DEFAULT_RESOURCES_DIR: &str = "resources";
pub const DEFAULT_MAX_DEPTH: usize = 1;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// What to crawl and where to put it
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub seed: Url,
    /// host[:port] of the seed; the only authority we ever fetch from
    pub site: SiteAuthority,
    pub output_dir: PathBuf,
    /// Folder (inside output_dir) holding css/, js/ and img/
    pub resources_dir: String,
    /// 0 = only the seed page, 1 = seed + pages it links to, ...
    pub max_depth: usize,
    /// Maximum simultaneous HTTP requests, None for unlimited
    pub max_concurrency: Option<usize>,
    pub timeout: Duration,
}

impl CrawlConfig {
    // Parses and validates the seed URL
    //
    // Errors if the URL doesn't parse, isn't http(s), or has no host.
    pub fn new(seed_url: &str, output_dir: impl Into<PathBuf>, max_depth: usize) -> Result<Self> {
        let seed = Url::parse(seed_url.trim())
            .with_context(|| format!("Invalid URL '{}'", seed_url))?;

        if !matches!(seed.scheme(), "http" | "https") {
            bail!("Unsupported URL scheme '{}' (expected http or https)", seed.scheme());
        }

        let site = SiteAuthority::of(&seed)
            .ok_or_else(|| anyhow!("URL has no host: {}", seed_url))?;

        Ok(Self {
            seed,
            site,
            output_dir: output_dir.into(),
            resources_dir: DEFAULT_RESOURCES_DIR.to_string(),
            max_depth,
            max_concurrency: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_resources_dir(mut self, resources_dir: &str) -> Result<Self> {
        let trimmed = resources_dir.trim_matches('/');
        let is_single_segment = !trimmed.is_empty()
            && !trimmed.contains(|c: char| c == '/' || c == '\\')
            && trimmed != "."
            && trimmed != "..";

        if !is_single_segment {
            bail!(
                "Resources directory must be a single folder name, got '{}'",
                resources_dir
            );
        }
        self.resources_dir = trimmed.to_string();
        Ok(self)
    }

    pub fn with_max_concurrency(mut self, max_concurrency: Option<usize>) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// A page waiting to be visited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub url: Url,
    /// Number of link hops from the seed (the seed itself is 0)
    pub depth: usize,
}

impl CrawlTarget {
    pub fn seed(url: Url) -> Self {
        Self { url, depth: 0 }
    }

    // A page linked from this one
    pub fn child(&self, url: Url) -> Self {
        Self {
            url,
            depth: self.depth + 1,
        }
    }
}

// Counters updated by the tasks while the crawl runs
#[derive(Debug, Default)]
pub struct CrawlStats {
    pub pages_written: AtomicUsize,
    pub pages_failed: AtomicUsize,
    /// Already visited or on another host
    pub pages_skipped: AtomicUsize,
    pub assets_dispatched: AtomicUsize,
    pub assets_written: AtomicUsize,
    pub assets_failed: AtomicUsize,
}

impl CrawlStats {
    pub fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

// Everything the crawl tasks share
//
// Created once by the orchestrator and dropped only after every task has
// finished.
#[derive(Debug)]
pub struct CrawlContext {
    pub config: CrawlConfig,
    pub fetcher: Fetcher,
    pub assets: AssetMaterializer,
    pub visited: VisitedRegistry,
    pub tracker: WorkTracker,
    pub stats: CrawlStats,
}

impl CrawlContext {
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let fetcher = Fetcher::new(config.timeout, config.max_concurrency)
            .context("Failed to create HTTP client")?;
        let assets = AssetMaterializer::new(
            fetcher.clone(),
            config.output_dir.clone(),
            config.resources_dir.clone(),
        );

        Ok(Self {
            config,
            fetcher,
            assets,
            visited: VisitedRegistry::new(),
            tracker: WorkTracker::new(),
            stats: CrawlStats::default(),
        })
    }

    // Snapshot of the counters for reporting
    pub fn summary(&self, elapsed: Duration) -> CrawlSummary {
        let load = |counter: &AtomicUsize| counter.load(Ordering::Relaxed);

        CrawlSummary {
            seed: self.config.seed.to_string(),
            output_dir: self.config.output_dir.display().to_string(),
            max_depth: self.config.max_depth,
            pages_written: load(&self.stats.pages_written),
            pages_failed: load(&self.stats.pages_failed),
            pages_skipped: load(&self.stats.pages_skipped),
            assets_dispatched: load(&self.stats.assets_dispatched),
            assets_written: load(&self.stats.assets_written),
            assets_failed: load(&self.stats.assets_failed),
            panics_recovered: self.tracker.panics(),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

// Final report of a crawl
//
// #[derive(Serialize)] lets us print it with --json
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub seed: String,
    pub output_dir: String,
    pub max_depth: usize,
    pub pages_written: usize,
    pub pages_failed: usize,
    pub pages_skipped: usize,
    pub assets_dispatched: usize,
    pub assets_written: usize,
    pub assets_failed: usize,
    pub panics_recovered: usize,
    pub elapsed_ms: u64,
}
