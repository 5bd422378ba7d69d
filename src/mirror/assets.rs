// src/mirror/assets.rs
// =============================================================================
// This module downloads one asset (stylesheet, script or image) and saves it.
//
// Layout on disk:
//   <output>/<resources_dir>/css/<file>
//   <output>/<resources_dir>/js/<file>
//   <output>/<resources_dir>/img/<file>
//
// Failures are never fatal: the caller logs them and the asset is simply
// missing from the mirror. There are no retries.
// =============================================================================

use crate::mirror::fetch::{FetchError, Fetcher};
use crate::mirror::paths::{asset_path, to_fs_path, AssetCategory};
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum AssetError {
    /// Only http(s) URLs are downloaded (data: URIs never become files)
    #[error("unsupported scheme '{0}'")]
    Unsupported(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// Downloads assets into the category folders of one output directory
#[derive(Debug, Clone)]
pub struct AssetMaterializer {
    fetcher: Fetcher,
    output_dir: PathBuf,
    resources_dir: String,
}

impl AssetMaterializer {
    pub fn new(fetcher: Fetcher, output_dir: PathBuf, resources_dir: impl Into<String>) -> Self {
        Self {
            fetcher,
            output_dir,
            resources_dir: resources_dir.into(),
        }
    }

    // Where an asset ends up, relative to the output directory.
    // This is also the string that goes into the rewritten HTML.
    pub fn local_path(&self, category: AssetCategory, url: &Url) -> String {
        asset_path(&self.resources_dir, category, url)
    }

    // Downloads `url` and writes it under the category folder
    //
    // Returns: the relative local path on success
    pub async fn fetch(&self, category: AssetCategory, url: &Url) -> Result<String, AssetError> {
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(AssetError::Unsupported(other.to_string())),
        }

        let body = self.fetcher.get(url).await?;

        let relative = self.local_path(category, url);
        let path = to_fs_path(&self.output_dir, &relative);

        // Category folders exist from startup unless removed mid-crawl
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| AssetError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&path, &body)
            .await
            .map_err(|source| AssetError::Write { path, source })?;

        Ok(relative)
    }
}
