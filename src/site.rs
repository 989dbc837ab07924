//! Page link construction.
//!
//! Rows carrying a `_pageName` are linked back to the page that defined
//! them, using the configured article path.

use crate::config::SiteConfig;
use url::form_urlencoded;

/// Percent-escapes that are restored after encoding, keeping page URLs readable.
const KEPT_ESCAPES: &[(&str, &str)] = &[
    ("%3A", ":"),
    ("%2F", "/"),
    ("%3B", ";"),
    ("%40", "@"),
    ("%24", "$"),
    ("%21", "!"),
    ("%2A", "*"),
    ("%28", "("),
    ("%29", ")"),
    ("%2C", ","),
    ("%7E", "~"),
];

/// Builds local and full URLs for page names.
#[derive(Debug, Clone)]
pub struct PageLinker {
    server: String,
    article_path: String,
}

impl PageLinker {
    pub fn new(site: &SiteConfig) -> Self {
        Self {
            server: site.server.trim_end_matches('/').to_string(),
            article_path: site.article_path.clone(),
        }
    }

    /// Server-relative URL for a page, or `None` for a blank name.
    pub fn local_url(&self, page_name: &str) -> Option<String> {
        let page_name = page_name.trim();
        if page_name.is_empty() {
            return None;
        }
        Some(self.article_path.replace("$1", &encode_title(page_name)))
    }

    /// Absolute URL for a page, or `None` for a blank name.
    pub fn full_url(&self, page_name: &str) -> Option<String> {
        self.local_url(page_name)
            .map(|local| format!("{}{}", self.server, local))
    }
}

/// Encodes a page name the way page URLs spell it: spaces become
/// underscores and only unsafe characters are escaped.
pub fn encode_title(page_name: &str) -> String {
    let underscored = page_name.replace(' ', "_");
    let mut encoded: String = form_urlencoded::byte_serialize(underscored.as_bytes()).collect();
    for (escape, kept) in KEPT_ESCAPES {
        encoded = encoded.replace(escape, kept);
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linker(article_path: &str) -> PageLinker {
        PageLinker::new(&SiteConfig {
            server: "https://wiki.example.org/".to_string(),
            article_path: article_path.to_string(),
            american_dates: false,
        })
    }

    #[test]
    fn test_local_url() {
        let linker = linker("/wiki/$1");
        assert_eq!(
            linker.local_url("Main Page").as_deref(),
            Some("/wiki/Main_Page")
        );
    }

    #[test]
    fn test_full_url_uses_server() {
        let linker = linker("/index.php?title=$1");
        assert_eq!(
            linker.full_url("Help:Contents").as_deref(),
            Some("https://wiki.example.org/index.php?title=Help:Contents")
        );
    }

    #[test]
    fn test_blank_name_has_no_url() {
        assert_eq!(linker("/wiki/$1").local_url("  "), None);
    }

    #[test]
    fn test_encode_title_escapes_unsafe_characters() {
        assert_eq!(encode_title("Q&A"), "Q%26A");
        assert_eq!(encode_title("Dune (novel)"), "Dune_(novel)");
        assert_eq!(encode_title("Café"), "Caf%C3%A9");
    }
}
