//! Support for creating the site's RSS feed from the recent posts.

use crate::config::Site;
use crate::post::Post;
use crate::url::post_url;
use crate::write::RenderContext;
use rss::validation::Validate;
use rss::{Channel, ChannelBuilder, Item, ItemBuilder};
use std::io::Write;
use thiserror::Error;

/// Creates a feed from the site configuration and the recent posts of a
/// [`RenderContext`] and writes the result to a [`std::io::Write`].
pub fn write_feed<W: Write>(site: &Site, context: &RenderContext, w: W) -> Result<()> {
    feed(site, context)?.write_to(w)?;
    Ok(())
}

/// Builds the feed channel. Items appear in the same order as
/// `context.recent`.
pub fn feed(site: &Site, context: &RenderContext) -> Result<Channel> {
    let channel = ChannelBuilder::default()
        .title(site.site_name.clone())
        .link(site.base_url.to_string())
        .description(site.slogan.clone())
        .items(feed_items(site, context.recent)?)
        .build();

    channel
        .validate()
        .map_err(|e| Error::Validate(e.to_string()))?;
    Ok(channel)
}

fn feed_items(site: &Site, posts: &[Post]) -> Result<Vec<Item>> {
    let mut items: Vec<Item> = Vec::with_capacity(posts.len());

    for post in posts {
        let link = post_url(&site.base_url, &post.slug).map_err(|err| Error::ResolveLink {
            slug: post.slug.clone(),
            err,
        })?;

        items.push(
            ItemBuilder::default()
                .title(post.title.clone())
                .link(link.to_string())
                .description(non_empty(&post.description))
                .author(non_empty(&post.author))
                .pub_date(post.publish_date.to_rfc2822())
                .build(),
        );
    }
    Ok(items)
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_owned())
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed. Variants include link resolution,
/// validation and serialization issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a post's slug can't be resolved against the base URL.
    #[error("Resolving feed link for `{slug}`: {err}")]
    ResolveLink { slug: String, err: url::ParseError },

    /// Returned when the assembled feed isn't valid RSS.
    #[error("Validating feed: {0}")]
    Validate(String),

    /// Returned when the feed can't be serialized or written.
    #[error(transparent)]
    Rss(#[from] rss::Error),
}
