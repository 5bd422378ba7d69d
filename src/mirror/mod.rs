// src/mirror/mod.rs
// =============================================================================
// This module contains everything needed to mirror a single resource.
//
// Submodules:
// - resolve: Turns href/src values into absolute URLs (or rejects them)
// - paths: Maps URLs to local file paths
// - fetch: Downloads URLs over HTTP
// - html: Rewrites asset references in a page and collects its links
// - assets: Downloads one asset into its category folder
//
// The crawl module (src/crawl/) decides *which* resources to mirror and
// runs them concurrently; this module only knows how to mirror one.
// =============================================================================

mod assets;
mod fetch;
mod html;
mod paths;
mod resolve;

// Re-export public items from submodules
// This lets the crawler write `mirror::Fetcher` instead of
// `mirror::fetch::Fetcher`
pub use assets::AssetMaterializer;
pub use fetch::Fetcher;
pub use html::{rewrite_page, AssetRef, RewriteScope};
pub use paths::{page_path, to_fs_path, AssetCategory};
pub use resolve::{canonical_key, same_host, SiteAuthority};
