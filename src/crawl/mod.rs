// src/crawl/mod.rs
// =============================================================================
// This module runs a whole mirroring crawl.
//
// Features:
// - Starts at the seed URL and follows same-host links up to a depth limit
// - Every page and every asset is its own concurrent tokio task
// - A visited registry makes sure no page is fetched twice
// - A work tracker lets us wait until every spawned task has finished
//
// Submodules:
// - context: Config, shared state and the final summary
// - visited: The "fetch each page once" registry
// - tracker: The completion barrier (outstanding task counter)
// - page: What happens to one page
// =============================================================================

mod context;
mod page;
mod tracker;
mod visited;

pub use context::{
    CrawlConfig, CrawlSummary, DEFAULT_MAX_DEPTH, DEFAULT_OUTPUT_DIR, DEFAULT_RESOURCES_DIR,
};

use crate::mirror::{to_fs_path, AssetCategory};
use anyhow::{Context, Result};
use context::{CrawlContext, CrawlTarget};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

// Mirrors a website according to `config`
//
// Returns: a summary once every page and asset task has finished
//
// Errors only for problems before crawling starts (output folders can't be
// created, HTTP client can't be built). Failures of individual pages and
// assets are logged and counted in the summary instead.
pub async fn clone_site(config: CrawlConfig) -> Result<CrawlSummary> {
    prepare_output(&config).await?;

    let started = Instant::now();
    let ctx = Arc::new(CrawlContext::new(config)?);

    page::spawn_page(&ctx, CrawlTarget::seed(ctx.config.seed.clone()));

    // Blocks until the seed page and everything it spawned (recursively)
    // has finished
    ctx.tracker.wait().await;

    let summary = ctx.summary(started.elapsed());
    info!(
        pages = summary.pages_written,
        assets = summary.assets_written,
        visited = ctx.visited.len(),
        elapsed_ms = summary.elapsed_ms,
        "crawl finished"
    );

    Ok(summary)
}

// Creates <output>/ and <output>/<resources>/{css,js,img}/
async fn prepare_output(config: &CrawlConfig) -> Result<()> {
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create output directory {}",
                config.output_dir.display()
            )
        })?;

    for category in AssetCategory::ALL {
        let relative = format!("{}/{}", config.resources_dir, category.dir_name());
        let dir = to_fs_path(&config.output_dir, &relative);

        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {} directory {}", category, dir.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Arc<CrawlContext>?
//    - Every task needs the same registry, tracker and HTTP client
//    - Tasks can outlive the function that spawned them
//    - Arc = "atomically reference counted": the context is freed when the
//      last task drops its clone
//
// 2. Why not just join all the JoinHandles?
//    - Page tasks spawn more tasks while they run, so there is no fixed list
//      of handles to wait on
//    - The tracker counts tasks instead, and wakes us when the count hits 0
//
// 3. Depth vs. breadth:
//    - Pages are not visited level by level like a queue-based BFS
//    - Each page spawns its children directly; the depth is carried in the
//      CrawlTarget, so every chain from the seed is bounded by max_depth
// -----------------------------------------------------------------------------
