//! Defines the [`Post`] type along with the ordering rules for a set of posts
//! ([`sort_posts`]) and the selection of the "recent" subset
//! ([`recent_posts`]).

use chrono::{DateTime, FixedOffset};
use gtmpl::Value;
use std::path::PathBuf;
use url::Url;

/// A single parsed post. Posts are built fresh on every run by
/// [`crate::parser::Parser`] and are never written back to disk.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// URL- and filesystem-safe identifier. Doubles as the output file name
    /// and as the path segment of the post's link.
    pub slug: String,

    pub title: String,

    pub description: String,

    pub author: String,

    pub publish_date: DateTime<FixedOffset>,

    /// The post body rendered to HTML.
    pub content: String,

    /// The absolute URL of the rendered post (`{base_url}{slug}`).
    pub url: Url,

    /// The markdown file the post was parsed from.
    pub source_path: PathBuf,
}

impl Post {
    /// Converts a [`Post`] into a template [`Value`]. The resulting object
    /// exposes `Slug`, `Title`, `Description`, `Author`, `PublishDate`
    /// (RFC 3339), `Date` (human readable), `Content` and `URL`.
    pub fn to_value(&self) -> Value {
        use std::collections::HashMap;
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("Slug".to_owned(), (&self.slug).into());
        m.insert("Title".to_owned(), (&self.title).into());
        m.insert("Description".to_owned(), (&self.description).into());
        m.insert("Author".to_owned(), (&self.author).into());
        m.insert(
            "PublishDate".to_owned(),
            Value::String(self.publish_date.to_rfc3339()),
        );
        m.insert(
            "Date".to_owned(),
            Value::String(self.publish_date.format("%B %-d, %Y").to_string()),
        );
        m.insert("Content".to_owned(), (&self.content).into());
        m.insert("URL".to_owned(), Value::String(self.url.to_string()));
        Value::Object(m)
    }
}

/// Orders posts newest first. Posts published at the same instant are ordered
/// by slug so that repeated builds over the same input agree.
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.publish_date
            .cmp(&a.publish_date)
            .then_with(|| a.slug.cmp(&b.slug))
    });
}

/// Returns the first `count` posts of an already sorted slice, or the whole
/// slice if it holds fewer than `count` posts.
pub fn recent_posts(sorted: &[Post], count: usize) -> &[Post] {
    &sorted[..count.min(sorted.len())]
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn post(slug: &str, year: i32, month: u32, day: u32) -> Post {
        Post {
            slug: slug.to_owned(),
            title: format!("Title of {}", slug),
            description: format!("About {}", slug),
            author: String::from("jo@example.org"),
            publish_date: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(year, month, day, 0, 0, 0)
                .unwrap(),
            content: format!("<p>{}</p>", slug),
            url: Url::parse("https://example.org/").unwrap().join(slug).unwrap(),
            source_path: PathBuf::from(format!("{}.md", slug)),
        }
    }

    fn slugs(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.slug.as_str()).collect()
    }

    #[test]
    fn test_sort_posts_newest_first() {
        let mut posts = vec![
            post("middle", 2021, 2, 1),
            post("oldest", 2020, 12, 31),
            post("newest", 2021, 3, 1),
        ];
        sort_posts(&mut posts);
        assert_eq!(vec!["newest", "middle", "oldest"], slugs(&posts));
    }

    #[test]
    fn test_sort_posts_breaks_ties_by_slug() {
        let mut forward = vec![post("b", 2021, 1, 1), post("a", 2021, 1, 1), post("c", 2022, 1, 1)];
        let mut backward = forward.clone();
        backward.reverse();

        sort_posts(&mut forward);
        sort_posts(&mut backward);
        assert_eq!(vec!["c", "a", "b"], slugs(&forward));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_recent_posts_clamps_to_len() {
        let posts = vec![post("b", 2021, 1, 2), post("a", 2021, 1, 1)];
        assert_eq!(2, recent_posts(&posts, 5).len());
        assert_eq!(vec!["b"], slugs(recent_posts(&posts, 1)));
        assert!(recent_posts(&posts, 0).is_empty());
        assert!(recent_posts(&[], 3).is_empty());
    }

    fn string_field<'a>(value: &'a Value, key: &str) -> &'a str {
        match value {
            Value::Object(m) => match m.get(key) {
                Some(Value::String(s)) => s,
                other => panic!("wanted a string for `{}`, found {:?}", key, other),
            },
            _ => panic!("wanted an object, found {:?}", value),
        }
    }

    #[test]
    fn test_to_value() {
        let value = post("hello", 2021, 4, 16).to_value();
        assert_eq!("hello", string_field(&value, "Slug"));
        assert_eq!("2021-04-16T00:00:00+00:00", string_field(&value, "PublishDate"));
        assert_eq!("April 16, 2021", string_field(&value, "Date"));
        assert_eq!("https://example.org/hello", string_field(&value, "URL"));
        assert_eq!("<p>hello</p>", string_field(&value, "Content"));
    }
}
