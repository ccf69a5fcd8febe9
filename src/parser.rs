//! Defines the [`Parser`] type, which discovers post source files in the
//! posts directory and turns them into [`Post`] objects. Discovery failures
//! abort the build; a single malformed post only gets skipped (see
//! [`Posts::skipped`]).

use std::{
    collections::HashMap,
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;
use walkdir::WalkDir;

use crate::{
    clean::RESERVED_FILES,
    markdown,
    post::Post,
    url::{post_url, RSS_FILE},
    write::INDEX_FILE,
};

const MARKDOWN_EXTENSION: &str = "md";

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// The site's base URL. Each post's URL is its slug resolved against it.
    base_url: &'a Url,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(base_url: &'a Url) -> Parser<'a> {
        Parser { base_url }
    }

    /// Lists the markdown files directly inside `source_directory`, ordered
    /// by file name. Subdirectories and files whose extension isn't exactly
    /// `md` are left out. Fails if `source_directory` is missing, unreadable
    /// or not a directory.
    pub fn candidates(&self, source_directory: &Path) -> Result<Vec<PathBuf>> {
        let mut candidates = Vec::new();
        for result in WalkDir::new(source_directory)
            .max_depth(1)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        {
            let entry = result.map_err(|err| Error::ReadDirectory {
                path: source_directory.to_owned(),
                err,
            })?;
            if entry.depth() == 0 {
                if !entry.file_type().is_dir() {
                    return Err(Error::NotADirectory(source_directory.to_owned()));
                }
                continue;
            }
            if entry.file_type().is_dir() {
                continue;
            }
            if entry.path().extension() == Some(OsStr::new(MARKDOWN_EXTENSION)) {
                candidates.push(entry.into_path());
            }
        }
        Ok(candidates)
    }

    /// Searches a provided `source_directory` for post files (extension =
    /// `.md`) and parses each of them. Each post file must be structured as
    /// follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with fields `Title` and `Date`, and optionally
    ///    `Description`, `Author` and `Slug`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// Title: Hello, world!
    /// Date: 2021-04-16
    /// Author: jo@example.org
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    ///
    /// Files that fail to parse are logged and reported in
    /// [`Posts::skipped`]. The returned posts are in scan order; see
    /// [`crate::post::sort_posts`] for ordering by date.
    pub fn parse_posts(&self, source_directory: &Path) -> Result<Posts> {
        let mut posts: Vec<Post> = Vec::new();
        let mut skipped = Vec::new();
        for path in self.candidates(source_directory)? {
            match self.parse_post(&path) {
                Ok(post) => {
                    debug!(slug = %post.slug, "parsed {}", path.display());
                    posts.push(post)
                }
                Err(err) => {
                    warn!("Post ignored: {}; Error: {}", path.display(), err);
                    skipped.push(Skipped { path, err });
                }
            }
        }

        check_unique_slugs(&posts)?;
        Ok(Posts { posts, skipped })
    }

    /// Parses the post at `path`. The slug falls back to the slugified file
    /// stem when the frontmatter doesn't set one.
    pub fn parse_post(&self, path: &Path) -> Result<Post> {
        fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
            const FENCE: &str = "---";
            if !input.starts_with(FENCE) {
                return Err(Error::FrontmatterMissingStartFence);
            }
            match input[FENCE.len()..].find("\n---") {
                None => Err(Error::FrontmatterMissingEndFence),
                Some(offset) => Ok((
                    FENCE.len(),                            // yaml_start
                    FENCE.len() + offset + 1,               // yaml_stop
                    FENCE.len() + offset + 1 + FENCE.len(), // body_start
                )),
            }
        }

        let contents = fs::read_to_string(path)?;
        let input: &str = &contents;

        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        let frontmatter: Frontmatter = serde_yaml::from_str(&input[yaml_start..yaml_stop])?;

        let slug = match frontmatter.slug {
            Some(slug) => slug,
            None => slug::slugify(
                path.file_stem()
                    .and_then(OsStr::to_str)
                    .ok_or_else(|| Error::InvalidFileName(path.to_owned()))?,
            ),
        };
        validate_slug(&slug)?;

        let mut post = Post {
            url: post_url(self.base_url, &slug)?,
            slug,
            title: frontmatter.title,
            description: frontmatter.description,
            author: frontmatter.author,
            publish_date: parse_date(&frontmatter.date)?,
            content: String::default(),
            source_path: path.to_owned(),
        };
        markdown::to_html(&mut post.content, &input[body_start..]);
        Ok(post)
    }
}

/// Parses a frontmatter date. Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` and
/// `YYYY-MM-DD`; the latter two are taken to be UTC.
pub fn parse_date(input: &str) -> Result<DateTime<FixedOffset>> {
    let input = input.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Ok(date);
    }
    let naive = match NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        Ok(naive) => Some(naive),
        Err(_) => NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0)),
    };
    match naive {
        Some(naive) => Ok(Utc.from_utc_datetime(&naive).into()),
        None => Err(Error::InvalidDate(input.to_owned())),
    }
}

// Slugs become file names in the publish directory, so they must not escape
// it, hide from the cleaner, or clobber a file the build owns otherwise.
fn validate_slug(slug: &str) -> Result<()> {
    let unsafe_slug = slug.is_empty()
        || slug.starts_with('.')
        || slug.contains(|c: char| c == '/' || c == '\\')
        || slug == INDEX_FILE
        || slug == RSS_FILE
        || RESERVED_FILES.contains(&slug);
    if unsafe_slug {
        Err(Error::InvalidSlug(slug.to_owned()))
    } else {
        Ok(())
    }
}

fn check_unique_slugs(posts: &[Post]) -> Result<()> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for post in posts {
        if let Some(first) = seen.insert(&post.slug, &post.source_path) {
            return Err(Error::DuplicateSlug {
                slug: post.slug.clone(),
                first: first.to_owned(),
                second: post.source_path.clone(),
            });
        }
    }
    Ok(())
}

#[derive(Deserialize, Clone)]
struct Frontmatter {
    /// The title of the post.
    #[serde(rename = "Title")]
    pub title: String,

    /// The publication date of the post.
    #[serde(rename = "Date")]
    pub date: String,

    #[serde(default, rename = "Description")]
    pub description: String,

    #[serde(default, rename = "Author")]
    pub author: String,

    /// Overrides the slug derived from the file name.
    #[serde(default, rename = "Slug")]
    pub slug: Option<String>,
}

/// The result of [`Parser::parse_posts`].
#[derive(Debug)]
pub struct Posts {
    /// Successfully parsed posts, in scan order.
    pub posts: Vec<Post>,

    /// Candidate files that could not be parsed.
    pub skipped: Vec<Skipped>,
}

/// A post source file that was left out of the build.
#[derive(Debug)]
pub struct Skipped {
    pub path: PathBuf,
    pub err: Error,
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing [`Post`] objects. [`Error::ReadDirectory`],
/// [`Error::NotADirectory`] and [`Error::DuplicateSlug`] are fatal to the
/// build; the rest only cause a single file to be skipped.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the posts directory can't be listed.
    #[error("Reading posts directory '{}': {}", path.display(), err)]
    ReadDirectory { path: PathBuf, err: walkdir::Error },

    /// Returned when the posts path exists but isn't a directory.
    #[error("Posts directory '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Returned when two posts resolve to the same slug.
    #[error(
        "Slug `{}` is used by both '{}' and '{}'",
        slug,
        first.display(),
        second.display()
    )]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    #[error("Post must begin with `---`")]
    FrontmatterMissingStartFence,

    /// Returned when the starting fence was found but the ending one was
    /// missing.
    #[error("Missing closing `---`")]
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML,
    /// including missing required fields.
    #[error(transparent)]
    DeserializeYaml(#[from] serde_yaml::Error),

    #[error("invalid date: {0:?}")]
    InvalidDate(String),

    #[error("invalid slug: {0:?}")]
    InvalidSlug(String),

    #[error("invalid file name: {0:?}")]
    InvalidFileName(PathBuf),

    /// Returned when there is a problem resolving the post's URL.
    #[error(transparent)]
    UrlParse(#[from] url::ParseError),

    /// Returned for other I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
