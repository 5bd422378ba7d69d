// src/mirror/paths.rs
// =============================================================================
// This module decides where things go on disk.
//
// Two kinds of resources:
// - Pages: mirrored at the same path they have on the server
//     /            -> index.html
//     /blog/       -> blog/index.html
//     /about       -> about/index.html   (no extension = directory)
//     /page.html   -> page.html
// - Assets: flattened into one folder per category
//     https://example.com/static/site.css -> resources/css/site.css
//
// All paths produced here are relative, use forward slashes, and depend only
// on their inputs. The same string is used to write the file and to rewrite
// the HTML attribute, so the two can never disagree.
// =============================================================================

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use url::Url;

const MAX_FILE_NAME_LEN: usize = 128;
const MAX_EXTENSION_LEN: usize = 16;

// The three kinds of embedded assets we mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    /// <link rel="stylesheet" href="...">
    Stylesheet,
    /// <script src="...">
    Script,
    /// <img src="...">
    Image,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 3] = [
        AssetCategory::Stylesheet,
        AssetCategory::Script,
        AssetCategory::Image,
    ];

    /// Folder name under the resources directory
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetCategory::Stylesheet => "css",
            AssetCategory::Script => "js",
            AssetCategory::Image => "img",
        }
    }
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

// Computes the local path of a mirrored page
//
// The query string is ignored: /list?page=2 and /list both map to
// list/index.html.
pub fn page_path(url: &Url) -> String {
    let path = url.path().trim_start_matches('/');

    if path.is_empty() {
        return "index.html".to_string();
    }

    if path.ends_with('/') {
        return format!("{}index.html", path);
    }

    let last_segment = path.rsplit('/').next().unwrap_or(path);
    if !last_segment.contains('.') {
        return format!("{}/index.html", path);
    }

    path.to_string()
}

// Computes "<resources_dir>/<category>/<file>" for an asset URL
pub fn asset_path(resources_dir: &str, category: AssetCategory, url: &Url) -> String {
    format!(
        "{}/{}/{}",
        resources_dir.trim_matches('/'),
        category.dir_name(),
        asset_file_name(url)
    )
}

// Derives a file name for an asset
//
// Rules:
// - Start from the last path segment, percent-decoded
// - Fold the query string into the stem so ?v=1 and ?v=2 don't collide:
//     style.css?v=2 -> style_v_2.css
// - Replace anything that isn't safe in both a file name and an HTML
//   attribute with '_' (this covers '?', '&' and '=')
// - No last segment (e.g. https://example.com/) -> resource_<hash of url>
// - Longer than MAX_FILE_NAME_LEN -> stem cut short, then _<hash of url>
pub fn asset_file_name(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .unwrap_or_default();

    if segment.is_empty() || segment == "." || segment == ".." {
        return format!("resource_{}", short_hash(url.as_str()));
    }

    let name = match url.query().filter(|q| !q.is_empty()) {
        Some(query) => match segment.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, query, ext),
            _ => format!("{}_{}", segment, query),
        },
        None => segment,
    };

    cap_length(sanitize_file_name(&name), url)
}

// Joins a forward-slash relative path onto a directory using the host's
// own separator
pub fn to_fs_path(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .fold(root.to_path_buf(), |path, part| path.join(part))
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '~' | '+' | '@' | ',') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// Keeps a name well under the usual 255-byte filesystem limit.
// The hash keeps two long names that share a prefix apart.
fn cap_length(name: String, url: &Url) -> String {
    if name.len() <= MAX_FILE_NAME_LEN {
        return name;
    }

    // Sanitized names are pure ASCII, so byte slicing is safe
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= MAX_EXTENSION_LEN => {
            (stem, Some(ext))
        }
        _ => (name.as_str(), None),
    };

    let hash = short_hash(url.as_str());
    let suffix_len = 1 + hash.len() + ext.map_or(0, |ext| ext.len() + 1);
    let stem = &stem[..stem.len().min(MAX_FILE_NAME_LEN - suffix_len)];

    match ext {
        Some(ext) => format!("{}_{}.{}", stem, hash, ext),
        None => format!("{}_{}", stem, hash),
    }
}

// First 12 hex characters of the blake3 hash
fn short_hash(input: &str) -> String {
    let hash = blake3::hash(input.as_bytes()).to_hex();
    hash.as_str()[..12].to_string()
}
