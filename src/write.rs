use crate::config::Site;
use crate::post::Post;
use gtmpl::{Template, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// The site's home page. It always mirrors the newest post.
pub const INDEX_FILE: &str = "index.html";

/// Responsible for templating and writing post pages to disk.
pub struct Writer<'a> {
    /// The parsed template set. Its unnamed top-level template is what gets
    /// executed: it is the base layout and pulls in the post section. A base
    /// layout wrapped in `{{define "base"}}` leaves only whitespace at the top
    /// level, which [`Writer::write_posts`] reports as [`Error::BlankPage`].
    pub template: &'a Template,

    /// Site-wide values made available to every page.
    pub site: &'a Site,

    /// The absolute URL of the feed, made available to every page.
    pub rss_url: &'a Url,

    /// The directory in which the HTML files will be written.
    pub output_directory: &'a Path,
}

/// Everything a template sees when it renders a page.
pub struct RenderContext<'a> {
    /// The post being rendered; `None` outside of page rendering (e.g., the
    /// feed pass).
    pub post: Option<&'a Post>,

    /// The position of `post` in `all`.
    pub index: usize,

    /// The newest posts, newest first.
    pub recent: &'a [Post],

    /// All posts, newest first.
    pub all: &'a [Post],
}

impl<'a> RenderContext<'a> {
    /// The context for the post at `index` in `all`.
    pub fn for_post(index: usize, recent: &'a [Post], all: &'a [Post]) -> Self {
        RenderContext {
            post: all.get(index),
            index,
            recent,
            all,
        }
    }

    /// A context with no current post.
    pub fn without_post(recent: &'a [Post], all: &'a [Post]) -> Self {
        RenderContext {
            post: None,
            index: 0,
            recent,
            all,
        }
    }

    /// Converts a [`RenderContext`] into a [`Value::Object`] with fields
    /// `Post`, `Index`, `Recent`, `All`, `Prev` (the next newer post) and
    /// `Next` (the next older post). Missing posts are `nil`.
    fn to_value(&self) -> Value {
        let option_to_value = |opt: Option<&Post>| match opt {
            Some(post) => post.to_value(),
            None => Value::Nil,
        };
        let slice_to_value = |posts: &[Post]| Value::Array(posts.iter().map(Post::to_value).collect());

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("Post".to_owned(), option_to_value(self.post));
        m.insert("Index".to_owned(), Value::from(self.index as u64));
        m.insert("Recent".to_owned(), slice_to_value(self.recent));
        m.insert("All".to_owned(), slice_to_value(self.all));
        m.insert(
            "Prev".to_owned(),
            option_to_value(match self.post {
                Some(_) if self.index > 0 => self.all.get(self.index - 1),
                _ => None,
            }),
        );
        m.insert(
            "Next".to_owned(),
            option_to_value(match self.post {
                Some(_) => self.all.get(self.index + 1),
                None => None,
            }),
        );
        Value::Object(m)
    }
}

impl Writer<'_> {
    /// Renders every post in `all` (which must already be sorted newest
    /// first) to `{output_directory}/{slug}`. Returns the number of pages
    /// rendered. Stops at the first failure, including a page that renders to
    /// nothing but whitespace; pages already written are left in place.
    pub fn write_posts(&self, recent: &[Post], all: &[Post]) -> Result<usize> {
        for (i, post) in all.iter().enumerate() {
            let context = RenderContext::for_post(i, recent, all);
            self.write_page(&context, &self.destinations(i, post))?;
        }
        Ok(all.len())
    }

    /// The files a post is rendered into. The newest post is fanned out to
    /// [`INDEX_FILE`] as well, so the home page is a full render of the same
    /// context rather than a copy of the post page.
    fn destinations(&self, index: usize, post: &Post) -> Vec<PathBuf> {
        let mut destinations = vec![self.output_directory.join(&post.slug)];
        if index == 0 {
            destinations.push(self.output_directory.join(INDEX_FILE));
        }
        destinations
    }

    /// Renders a single [`RenderContext`] once and writes the result to
    /// every path in `destinations`.
    fn write_page(&self, context: &RenderContext, destinations: &[PathBuf]) -> Result<()> {
        let mut value = context.to_value();
        if let Value::Object(obj) = &mut value {
            obj.insert("SiteName".to_owned(), (&self.site.site_name).into());
            obj.insert("Slogan".to_owned(), (&self.site.slogan).into());
            obj.insert(
                "BaseURL".to_owned(),
                Value::String(self.site.base_url.to_string()),
            );
            obj.insert("RssURL".to_owned(), Value::String(self.rss_url.to_string()));
        }

        let mut out = FanOut::create(destinations)?;
        self.template
            .execute(&mut out, &gtmpl::Context::from(value).map_err(Error::Template)?)
            .map_err(Error::Template)?;
        if out.blank {
            return Err(Error::BlankPage(destinations.to_vec()));
        }
        out.finish()?;
        for path in destinations {
            debug!("wrote {}", path.display());
        }
        Ok(())
    }
}

/// A [`Write`] that copies everything written to it into each of a set of
/// files. The files are created (truncated) up front and closed when the
/// [`FanOut`] is dropped, whether or not rendering succeeded.
pub struct FanOut {
    files: Vec<(PathBuf, BufWriter<File>)>,

    /// Whether everything written so far is whitespace.
    pub blank: bool,
}

impl FanOut {
    /// Creates every file in `paths`.
    pub fn create(paths: &[PathBuf]) -> Result<FanOut> {
        let files = paths
            .iter()
            .map(|path| match File::create(path) {
                Ok(file) => Ok((path.clone(), BufWriter::new(file))),
                Err(err) => Err(Error::Io {
                    path: path.clone(),
                    err,
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FanOut { files, blank: true })
    }

    /// Flushes every destination, reporting which one failed.
    pub fn finish(mut self) -> Result<()> {
        for (path, file) in self.files.iter_mut() {
            file.flush().map_err(|err| Error::Io {
                path: path.clone(),
                err,
            })?;
        }
        Ok(())
    }
}

impl Write for FanOut {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.blank {
            self.blank = buf.iter().all(u8::is_ascii_whitespace);
        }
        for (_, file) in self.files.iter_mut() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for (_, file) in self.files.iter_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug, Error)]
pub enum Error {
    /// An error during templating.
    #[error("Rendering template: {0}")]
    Template(String),

    /// An error writing an output file.
    #[error("Writing '{}': {}", path.display(), err)]
    Io { path: PathBuf, err: io::Error },

    /// The template rendered nothing but whitespace, usually because the base
    /// layout sits inside a `{{define}}` block instead of at the top level.
    #[error("Template rendered a blank page for {:?}", .0)]
    BlankPage(Vec<PathBuf>),
}
