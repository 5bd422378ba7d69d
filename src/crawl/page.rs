// src/crawl/page.rs
// =============================================================================
// Processes one page of the crawl.
//
// Steps (any failure logs a warning and ends this page only):
// 1. Claim the URL in the visited registry (someone else got it? stop)
// 2. Check it's on the seed host
// 3. Download it
// 4. Parse it, rewriting stylesheet/script/image references to local paths
// 5. Spawn a download task for every asset we rewrote
// 6. Write the rewritten HTML to its local path
// 7. If we're not at max depth yet, spawn a task for every same-host link
//
// Every spawned task is registered with the crawl's WorkTracker, so the
// orchestrator can wait for the whole tree of work.
// =============================================================================

use crate::crawl::context::{CrawlContext, CrawlStats, CrawlTarget};
use crate::mirror::{
    canonical_key, page_path, rewrite_page, same_host, to_fs_path, AssetRef, RewriteScope,
};
use anyhow::{Context, Result};
use futures::FutureExt; // .boxed()
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

// Registers and spawns a task that processes `target`
//
// Not async: process_page spawns more pages through this function, and an
// async fn's future can't contain itself.
pub fn spawn_page(ctx: &Arc<CrawlContext>, target: CrawlTarget) {
    let label = format!("page {}", target.url);
    let task = process_page(Arc::clone(ctx), target).boxed();
    ctx.tracker.spawn(label, task);
}

// Registers and spawns a download task for one asset
fn spawn_asset(ctx: &Arc<CrawlContext>, asset: AssetRef) {
    CrawlStats::bump(&ctx.stats.assets_dispatched);

    let label = format!("{} {}", asset.category, asset.url);
    let task_ctx = Arc::clone(ctx);
    ctx.tracker.spawn(label, async move {
        materialize_asset(&task_ctx, asset).await;
    });
}

async fn process_page(ctx: Arc<CrawlContext>, target: CrawlTarget) {
    let url = &target.url;

    // 1. Claim
    if !ctx.visited.claim_if_new(&canonical_key(url)) {
        debug!(url = %url, "already visited");
        CrawlStats::bump(&ctx.stats.pages_skipped);
        return;
    }

    // 2. Scope check against the seed's host:port (never the referring page's)
    if !same_host(url, &ctx.config.site) {
        debug!(url = %url, site = %ctx.config.site, "outside the seed host");
        CrawlStats::bump(&ctx.stats.pages_skipped);
        return;
    }

    info!(depth = target.depth, url = %url, "crawling page");

    // 3. Fetch
    let body = match ctx.fetcher.get(url).await {
        Ok(body) => body,
        Err(e) => {
            warn!(url = %url, error = %e, "failed to fetch page");
            CrawlStats::bump(&ctx.stats.pages_failed);
            return;
        }
    };

    // 4. Parse + rewrite
    let scope = RewriteScope {
        site: &ctx.config.site,
        resources_dir: &ctx.config.resources_dir,
    };
    let page = match rewrite_page(&body, url, scope) {
        Ok(page) => page,
        Err(e) => {
            warn!(url = %url, error = %e, "failed to parse page");
            CrawlStats::bump(&ctx.stats.pages_failed);
            return;
        }
    };

    // 5. Assets
    debug!(url = %url, assets = page.assets.len(), "dispatching asset downloads");
    for asset in page.assets {
        spawn_asset(&ctx, asset);
    }

    // 6. Write the page. A failed write still lets us follow its links.
    let relative = page_path(url);
    match write_page(&ctx.config.output_dir, &relative, &page.html).await {
        Ok(path) => {
            info!(url = %url, path = %path.display(), "saved page");
            CrawlStats::bump(&ctx.stats.pages_written);
        }
        Err(e) => {
            warn!(url = %url, error = %format!("{:#}", e), "failed to save page");
            CrawlStats::bump(&ctx.stats.pages_failed);
        }
    }

    // 7. Links, one level deeper
    if target.depth >= ctx.config.max_depth {
        return;
    }

    for link in page.links {
        if same_host(&link, &ctx.config.site) {
            spawn_page(&ctx, target.child(link));
        }
    }
}

async fn materialize_asset(ctx: &CrawlContext, asset: AssetRef) {
    match ctx.assets.fetch(asset.category, &asset.url).await {
        Ok(path) => {
            debug!(url = %asset.url, path = %path, "saved asset");
            CrawlStats::bump(&ctx.stats.assets_written);
        }
        Err(e) => {
            warn!(
                url = %asset.url,
                reference = %asset.raw,
                page = %asset.page,
                category = %asset.category,
                error = %e,
                "failed to download asset"
            );
            CrawlStats::bump(&ctx.stats.assets_failed);
        }
    }
}

// Writes a page below `output_dir`, creating parent folders as needed
async fn write_page(output_dir: &Path, relative: &str, html: &[u8]) -> Result<PathBuf> {
    let path = to_fs_path(output_dir, relative);

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    tokio::fs::write(&path, html)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}
