//! The library code for the `gazette` static blog generator. A build is a
//! strictly sequential pipeline:
//!
//! 1. Discovering and parsing post source files ([`crate::parser`])
//! 2. Ordering the posts newest first and picking the recent ones
//!    ([`crate::post`])
//! 3. Clearing stale output from the publish directory ([`crate::clean`])
//! 4. Rendering one page per post, plus the home page ([`crate::write`])
//! 5. Writing the RSS feed ([`crate::feed`])
//!
//! A post that fails to parse is skipped with a warning; every other failure
//! aborts the build. [`crate::build::build_site`] runs the whole thing from a
//! [`crate::config::Config`].

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod clean;
pub mod config;
pub mod feed;
mod markdown;
pub mod parser;
pub mod post;
pub mod url;
pub mod write;
