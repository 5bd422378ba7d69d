// src/mirror/html.rs
// =============================================================================
// This module parses a downloaded page and rewrites it for offline use.
//
// In a single streaming pass over the HTML we:
// - Find every stylesheet <link>, <script src> and <img src>
// - Point each in-scope one at its local copy (resources/<category>/<file>)
// - Remember which assets need downloading
// - Collect every <a href> so the crawler can follow them later
//
// We use the `lol_html` crate which:
// - Streams HTML through CSS-selector based handlers
// - Lets handlers change attributes in place
// - Writes the modified document to an output sink as it goes
//
// The rewritten path only depends on the asset URL, so we can rewrite the
// attribute now and download the file later (or fail to).
//
// lol_html hands us attribute values exactly as written, entities and all,
// so `&amp;` is decoded to `&` before a reference is resolved.
// =============================================================================

use crate::mirror::paths::{asset_path, AssetCategory};
use crate::mirror::resolve::{resolve, same_host, ResolveError, SiteAuthority};
use html_escape::decode_html_entities;
use lol_html::errors::RewritingError;
use lol_html::html_content::Element;
use lol_html::{element, HtmlRewriter, Settings};
use std::cell::RefCell;
use thiserror::Error;
use tracing::debug;
use url::Url;

// An asset discovered on a page, already resolved and mapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    /// Page the reference was found on
    pub page: Url,
    /// Attribute value exactly as written in the HTML
    pub raw: String,
    pub category: AssetCategory,
    /// Absolute URL to download
    pub url: Url,
    /// Relative path written into the HTML (and used for the file)
    pub local_path: String,
}

// The result of rewriting one page
#[derive(Debug, Default)]
pub struct RewrittenPage {
    /// The modified document, ready to be written to disk
    pub html: Vec<u8>,
    /// Assets to download, in document order
    pub assets: Vec<AssetRef>,
    /// Every resolvable http(s) hyperlink, in document order (any host)
    pub links: Vec<Url>,
}

#[derive(Debug, Error)]
#[error("failed to parse HTML: {0}")]
pub struct RewriteError(#[from] RewritingError);

// Which pages count as "ours" and where their assets live
#[derive(Debug, Clone, Copy)]
pub struct RewriteScope<'a> {
    /// host[:port] of the seed URL; assets anywhere else are left alone
    pub site: &'a SiteAuthority,
    /// Name of the resources directory (e.g. "resources")
    pub resources_dir: &'a str,
}

// Rewrites a page's asset references and collects its links
//
// Parameters:
//   body: the raw HTML bytes
//   page_url: the URL the page was fetched from (base for relative refs)
//   scope: seed authority + resources directory
//
// References that are malformed, excluded (data:, mailto:, ...) or on
// another host are left untouched in the output.
pub fn rewrite_page(
    body: &[u8],
    page_url: &Url,
    scope: RewriteScope<'_>,
) -> Result<RewrittenPage, RewriteError> {
    let collector = Collector {
        page_url,
        scope,
        assets: RefCell::new(Vec::new()),
        links: RefCell::new(Vec::new()),
    };
    let mut html = Vec::with_capacity(body.len());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                // Stylesheets (rel can hold several tokens, e.g. "stylesheet preload")
                element!("link[rel][href]", |el| {
                    let is_stylesheet = el
                        .get_attribute("rel")
                        .map(|rel| {
                            rel.split_ascii_whitespace()
                                .any(|token| token.eq_ignore_ascii_case("stylesheet"))
                        })
                        .unwrap_or(false);

                    if is_stylesheet {
                        collector.rewrite_asset(el, "href", AssetCategory::Stylesheet)?;
                    }
                    Ok(())
                }),
                element!("script[src]", |el| {
                    collector.rewrite_asset(el, "src", AssetCategory::Script)?;
                    Ok(())
                }),
                element!("img[src]", |el| {
                    collector.rewrite_asset(el, "src", AssetCategory::Image)?;
                    Ok(())
                }),
                element!("a[href]", |el| {
                    if let Some(href) = el.get_attribute("href") {
                        collector.add_link(&decode_html_entities(&href));
                    }
                    Ok(())
                }),
            ],
            ..Settings::new()
        },
        |chunk: &[u8]| html.extend_from_slice(chunk),
    );

    rewriter.write(body)?;
    rewriter.end()?;

    Ok(RewrittenPage {
        html,
        assets: collector.assets.into_inner(),
        links: collector.links.into_inner(),
    })
}

// Shared state for the element handlers.
// Several handlers need to push into the same lists, so the lists live in
// RefCells and the handlers only borrow the collector immutably.
struct Collector<'a> {
    page_url: &'a Url,
    scope: RewriteScope<'a>,
    assets: RefCell<Vec<AssetRef>>,
    links: RefCell<Vec<Url>>,
}

impl Collector<'_> {
    fn rewrite_asset(
        &self,
        el: &mut Element<'_, '_>,
        attribute: &str,
        category: AssetCategory,
    ) -> lol_html::HandlerResult {
        let Some(raw) = el.get_attribute(attribute) else {
            return Ok(());
        };

        let url = match resolve(self.page_url, &decode_html_entities(&raw)) {
            Ok(url) => url,
            Err(ResolveError::Excluded(kind)) => {
                debug!(page = %self.page_url, reference = %raw, kind, "asset reference excluded");
                return Ok(());
            }
            Err(e) => {
                debug!(page = %self.page_url, reference = %raw, error = %e, "skipping asset reference");
                return Ok(());
            }
        };

        if !same_host(&url, self.scope.site) {
            debug!(page = %self.page_url, asset = %url, "asset is on another host, leaving it remote");
            return Ok(());
        }

        let local_path = asset_path(self.scope.resources_dir, category, &url);
        el.set_attribute(attribute, &local_path)?;

        self.assets.borrow_mut().push(AssetRef {
            page: self.page_url.clone(),
            raw,
            category,
            url,
            local_path,
        });

        Ok(())
    }

    fn add_link(&self, href: &str) {
        match resolve(self.page_url, href) {
            Ok(url) => self.links.borrow_mut().push(url),
            Err(ResolveError::Excluded(_)) => {}
            Err(e) => {
                debug!(page = %self.page_url, reference = %href, error = %e, "skipping link");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://example.com/blog/post").unwrap()
    }

    fn rewrite(html: &str) -> RewrittenPage {
        let site = SiteAuthority::of(&page()).unwrap();
        let scope = RewriteScope {
            site: &site,
            resources_dir: "resources",
        };
        rewrite_page(html.as_bytes(), &page(), scope).unwrap()
    }

    fn output(page: &RewrittenPage) -> String {
        String::from_utf8(page.html.clone()).unwrap()
    }

    #[test]
    fn test_rewrites_all_asset_kinds() {
        let result = rewrite(
            r#"<html><head>
                <link rel="stylesheet" href="/css/site.css">
                <script src="app.js"></script>
            </head><body><img src="https://example.com/img/logo.png"></body></html>"#,
        );

        let html = output(&result);
        assert!(html.contains(r#"href="resources/css/site.css""#));
        assert!(html.contains(r#"src="resources/js/app.js""#));
        assert!(html.contains(r#"src="resources/img/logo.png""#));

        let categories: Vec<_> = result.assets.iter().map(|a| a.category).collect();
        assert_eq!(
            categories,
            vec![
                AssetCategory::Stylesheet,
                AssetCategory::Script,
                AssetCategory::Image
            ]
        );
        assert_eq!(result.assets[1].url.as_str(), "https://example.com/blog/app.js");
        assert_eq!(result.assets[1].raw, "app.js");
        assert_eq!(result.assets[1].local_path, "resources/js/app.js");
    }

    #[test]
    fn test_non_stylesheet_links_are_untouched() {
        let result = rewrite(r#"<link rel="icon" href="/favicon.ico"><link rel="Preload Stylesheet" href="/a.css">"#);

        let html = output(&result);
        assert!(html.contains(r#"href="/favicon.ico""#));
        assert!(html.contains(r#"href="resources/css/a.css""#));
        assert_eq!(result.assets.len(), 1);
    }

    #[test]
    fn test_data_uri_and_foreign_assets_stay_as_is() {
        let result = rewrite(
            r#"<img src="data:image/png;base64,AAAA">
               <script src="https://cdn.other.com/lib.js"></script>"#,
        );

        let html = output(&result);
        assert!(html.contains("data:image/png;base64,AAAA"));
        assert!(html.contains("https://cdn.other.com/lib.js"));
        assert!(result.assets.is_empty());
    }

    #[test]
    fn test_collects_links_and_skips_bad_ones() {
        let result = rewrite(
            r##"<a href="not a url::::">bad</a>
               <a href="#top">anchor</a>
               <a href="mailto:me@example.com">mail</a>
               <a href="/about">about</a>
               <a href="https://other.com/x">other</a>
               <img src="after.png">"##,
        );

        let links: Vec<_> = result.links.iter().map(Url::as_str).collect();
        assert_eq!(links, vec!["https://example.com/about", "https://other.com/x"]);

        // Elements after the malformed link were still processed
        assert_eq!(result.assets.len(), 1);
        assert!(output(&result).contains(r#"href="not a url::::""#));
    }

    #[test]
    fn test_entities_in_references_are_decoded() {
        let result = rewrite(
            r#"<img src="/img.png?a=1&amp;b=2">
               <a href="/list?page=2&amp;sort=asc">next</a>"#,
        );

        assert_eq!(result.assets.len(), 1);
        assert_eq!(result.assets[0].url.as_str(), "https://example.com/img.png?a=1&b=2");
        assert_eq!(result.assets[0].raw, "/img.png?a=1&amp;b=2");
        assert_eq!(result.assets[0].local_path, "resources/img/img_a_1_b_2.png");

        let links: Vec<_> = result.links.iter().map(Url::as_str).collect();
        assert_eq!(links, vec!["https://example.com/list?page=2&sort=asc"]);
    }

    #[test]
    fn test_assets_on_another_port_stay_as_is() {
        let result = rewrite(r#"<img src="https://example.com:8443/logo.png">"#);

        assert!(output(&result).contains("https://example.com:8443/logo.png"));
        assert!(result.assets.is_empty());
    }

    #[test]
    fn test_counts_every_asset_reference() {
        let mut html = String::new();
        for i in 0..3 {
            html.push_str(&format!(r#"<link rel="stylesheet" href="/s{}.css">"#, i));
        }
        for i in 0..2 {
            html.push_str(&format!(r#"<script src="/j{}.js"></script>"#, i));
        }
        for i in 0..5 {
            html.push_str(&format!(r#"<img src="/i{}.png">"#, i));
        }

        let result = rewrite(&html);
        assert_eq!(result.assets.len(), 10);
    }

    #[test]
    fn test_text_outside_rewritten_elements_is_preserved() {
        let source = "<p>Hello <b>world</b></p>";
        let result = rewrite(source);
        assert_eq!(output(&result), source);
    }
}
