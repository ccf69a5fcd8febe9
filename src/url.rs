//! Resolution of post slugs and site paths against the configured base URL.
//! Links are always produced with [`Url::join`], never by string
//! concatenation, so that trailing slashes and relative segments behave the
//! way a browser would resolve them.

use url::{ParseError, Url};

/// The file name of the generated feed, relative to the output directory.
pub const RSS_FILE: &str = "rss.xml";

/// Resolves `slug` against `base_url`. Note that a base URL without a
/// trailing slash has its last path segment replaced (`https://x.org/blog`
/// joined with `post` is `https://x.org/post`).
pub fn post_url(base_url: &Url, slug: &str) -> Result<Url, ParseError> {
    base_url.join(slug)
}

/// The absolute URL of the feed, which sits next to the post pages.
pub fn rss_url(base_url: &Url) -> Result<Url, ParseError> {
    base_url.join(RSS_FILE)
}

#[cfg(test)]
mod test {
    use super::*;

    fn fixture(wanted: &str, base: &str, slug: &str) -> Result<(), ParseError> {
        assert_eq!(wanted, post_url(&Url::parse(base)?, slug)?.as_str());
        Ok(())
    }

    #[test]
    fn test_post_url_root() -> Result<(), ParseError> {
        fixture("https://example.org/hello", "https://example.org", "hello")
    }

    #[test]
    fn test_post_url_trailing_slash() -> Result<(), ParseError> {
        fixture(
            "https://example.org/blog/hello",
            "https://example.org/blog/",
            "hello",
        )
    }

    #[test]
    fn test_post_url_no_trailing_slash() -> Result<(), ParseError> {
        fixture(
            "https://example.org/hello",
            "https://example.org/blog",
            "hello",
        )
    }

    #[test]
    fn test_post_url_relative_segments() -> Result<(), ParseError> {
        fixture(
            "https://example.org/hello",
            "https://example.org/blog/",
            "../hello",
        )
    }

    #[test]
    fn test_rss_url() -> Result<(), ParseError> {
        assert_eq!(
            "https://example.org/blog/rss.xml",
            rss_url(&Url::parse("https://example.org/blog/")?)?.as_str()
        );
        Ok(())
    }
}
