//! Loads the site [`Config`] from a `config.json` file and resolves the
//! directories the build reads from and writes to.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the configuration file searched for by
/// [`Config::from_directory`].
pub const CONFIG_FILE: &str = "config.json";

const POSTS_DIRECTORY: &str = "post";
const TEMPLATES_DIRECTORY: &str = "template";
const OUTPUT_DIRECTORY: &str = "public";

#[derive(Deserialize)]
struct RecentPostsCount(usize);
impl Default for RecentPostsCount {
    fn default() -> Self {
        RecentPostsCount(10)
    }
}

/// The on-disk shape of `config.json`.
#[derive(Deserialize)]
struct Project {
    #[serde(rename = "BaseURL")]
    base_url: Url,

    #[serde(rename = "SiteName")]
    site_name: String,

    #[serde(default, rename = "Slogan")]
    slogan: String,

    #[serde(default, rename = "RecentPostsCount")]
    recent_posts_count: RecentPostsCount,
}

/// Site-wide values that end up in every rendered page and in the feed
/// channel.
#[derive(Clone, Debug)]
pub struct Site {
    pub site_name: String,
    pub slogan: String,

    /// Absolute URL of the site root. Post links are resolved against it.
    pub base_url: Url,

    /// How many of the newest posts make up the "recent" subset.
    pub recent_posts_count: usize,
}

/// Everything a build needs. Constructed once and never mutated.
#[derive(Clone, Debug)]
pub struct Config {
    pub site: Site,
    pub posts_directory: PathBuf,
    pub templates_directory: PathBuf,
    pub output_directory: PathBuf,
}

impl Config {
    /// Looks for [`CONFIG_FILE`] in `dir` and then in each of its ancestors.
    /// The first one found is loaded with [`Config::from_project_file`].
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Config::from_project_file(&path)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    CONFIG_FILE
                )),
            }
        }
    }

    /// Loads `path` and places the posts, templates and output directories
    /// next to it.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = File::open(path)
            .with_context(|| format!("Opening project file `{}`", path.display()))?;
        let project: Project = serde_json::from_reader(file)
            .with_context(|| format!("Loading configuration `{}`", path.display()))?;
        let root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;

        Ok(Config {
            site: Site {
                site_name: project.site_name,
                slogan: project.slogan,
                base_url: project.base_url,
                recent_posts_count: project.recent_posts_count.0,
            },
            posts_directory: root.join(POSTS_DIRECTORY),
            templates_directory: root.join(TEMPLATES_DIRECTORY),
            output_directory: root.join(OUTPUT_DIRECTORY),
        })
    }

    /// Returns a copy of the config writing into `output_directory` instead.
    pub fn with_output_directory(self, output_directory: PathBuf) -> Config {
        Config {
            output_directory,
            ..self
        }
    }

    /// The template files, in the order they are concatenated before
    /// parsing: the post section first, then the base layout.
    pub fn template_files(&self) -> Vec<PathBuf> {
        vec![
            self.templates_directory.join("post.html"),
            self.templates_directory.join("base.html"),
        ]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn write_config(dir: &Path, contents: &str) {
        fs::write(dir.join(CONFIG_FILE), contents).unwrap();
    }

    #[test]
    fn test_from_project_file() -> Result<()> {
        let root = tempfile::tempdir()?;
        write_config(
            root.path(),
            r#"{
                "BaseURL": "https://example.org/blog/",
                "SiteName": "Example",
                "Slogan": "Words, mostly",
                "RecentPostsCount": 3
            }"#,
        );

        let config = Config::from_project_file(&root.path().join(CONFIG_FILE))?;
        assert_eq!("Example", config.site.site_name);
        assert_eq!("Words, mostly", config.site.slogan);
        assert_eq!("https://example.org/blog/", config.site.base_url.as_str());
        assert_eq!(3, config.site.recent_posts_count);
        assert_eq!(root.path().join("post"), config.posts_directory);
        assert_eq!(root.path().join("template"), config.templates_directory);
        assert_eq!(root.path().join("public"), config.output_directory);
        Ok(())
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let root = tempfile::tempdir()?;
        write_config(
            root.path(),
            r#"{"BaseURL": "https://example.org", "SiteName": "Example"}"#,
        );

        let config = Config::from_project_file(&root.path().join(CONFIG_FILE))?;
        assert_eq!("", config.site.slogan);
        assert_eq!(10, config.site.recent_posts_count);
        Ok(())
    }

    #[test]
    fn test_from_directory_searches_ancestors() -> Result<()> {
        let root = tempfile::tempdir()?;
        write_config(
            root.path(),
            r#"{"BaseURL": "https://example.org", "SiteName": "Example"}"#,
        );
        let nested = root.path().join("post").join("drafts");
        fs::create_dir_all(&nested)?;

        let config = Config::from_directory(&nested)?;
        assert_eq!(root.path().join("public"), config.output_directory);
        Ok(())
    }

    #[test]
    fn test_rejects_relative_base_url() -> Result<()> {
        let root = tempfile::tempdir()?;
        write_config(root.path(), r#"{"BaseURL": "/blog", "SiteName": "Example"}"#);
        assert!(Config::from_project_file(&root.path().join(CONFIG_FILE)).is_err());
        Ok(())
    }

    #[test]
    fn test_rejects_negative_recent_posts_count() -> Result<()> {
        let root = tempfile::tempdir()?;
        write_config(
            root.path(),
            r#"{"BaseURL": "https://example.org", "SiteName": "Example", "RecentPostsCount": -1}"#,
        );
        assert!(Config::from_project_file(&root.path().join(CONFIG_FILE)).is_err());
        Ok(())
    }
}
