//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: parsing the posts
//! ([`crate::parser`]), ordering them ([`crate::post`]), clearing stale output
//! ([`crate::clean`]), rendering post pages ([`crate::write`]), and generating
//! the RSS feed ([`crate::feed`]).

use crate::clean::{self, clear_publish_dir};
use crate::config::Config;
use crate::feed::{self, write_feed};
use crate::parser::{self, Parser as PostParser, Posts, Skipped};
use crate::post::{recent_posts, sort_posts};
use crate::url::{rss_url, RSS_FILE};
use crate::write::{self, RenderContext, Writer};
use gtmpl::Template;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// What a successful build produced.
#[derive(Debug)]
pub struct Report {
    /// The number of post pages written (not counting `index.html`).
    pub pages: usize,

    /// The number of posts in the recent subset, which is also the number of
    /// feed items.
    pub recent: usize,

    /// Post source files that were left out because they failed to parse.
    pub skipped: Vec<Skipped>,
}

/// Builds the site from a [`Config`] object. Steps run strictly in order and
/// the first fatal error aborts the build; nothing already written to the
/// output directory is rolled back.
pub fn build_site(config: &Config) -> Result<Report> {
    let site = &config.site;
    let rss_url = rss_url(&site.base_url).map_err(Error::RssUrl)?;

    // Parse the template files before touching the output directory.
    let template = parse_template(config.template_files().iter())?;

    // collect all posts
    let Posts {
        posts: mut all,
        skipped,
    } = PostParser::new(&site.base_url).parse_posts(&config.posts_directory)?;
    sort_posts(&mut all);
    let recent = recent_posts(&all, site.recent_posts_count);
    info!(
        "loaded {} posts ({} skipped, {} recent)",
        all.len(),
        skipped.len(),
        recent.len()
    );

    let removed = clear_publish_dir(&config.output_directory)?;
    info!(
        "cleared {} stale files from {}",
        removed,
        config.output_directory.display()
    );

    // write the post pages and the home page
    let writer = Writer {
        template: &template,
        site,
        rss_url: &rss_url,
        output_directory: &config.output_directory,
    };
    let pages = writer.write_posts(recent, &all)?;
    info!("wrote {} pages", pages);

    // create the rss feed
    let feed_path = config.output_directory.join(RSS_FILE);
    let file = File::create(&feed_path).map_err(|err| Error::CreateFeed {
        path: feed_path.clone(),
        err,
    })?;
    write_feed(
        site,
        &RenderContext::without_post(recent, &all),
        BufWriter::new(file),
    )?;
    info!("wrote {}", feed_path.display());

    Ok(Report {
        pages,
        recent: recent.len(),
        skipped,
    })
}

// Loads the template file contents, concatenates them, and parses the result
// into a single template set.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        let template_file = template_file.as_ref();
        contents.push_str(&std::fs::read_to_string(template_file).map_err(|e| {
            Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            }
        })?);
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing, cleaning
/// the output directory, loading templates, writing pages, or writing the
/// feed.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the posts directory can't be read or slugs collide.
    #[error(transparent)]
    Parse(#[from] parser::Error),

    /// Returned for I/O problems while clearing the output directory.
    #[error(transparent)]
    Clean(#[from] clean::Error),

    /// Returned for I/O problems while opening template files.
    #[error("Opening template file '{}': {}", path.display(), err)]
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    #[error("Parsing templates: {0}")]
    ParseTemplate(String),

    /// Returned for errors rendering or writing post pages.
    #[error(transparent)]
    Write(#[from] write::Error),

    /// Returned when the feed URL can't be derived from the base URL.
    #[error("Resolving feed URL: {0}")]
    RssUrl(url::ParseError),

    /// Returned when the feed file can't be created.
    #[error("Creating feed '{}': {}", path.display(), err)]
    CreateFeed { path: PathBuf, err: std::io::Error },

    /// Returned for errors building or writing the feed.
    #[error(transparent)]
    Feed(#[from] feed::Error),
}
