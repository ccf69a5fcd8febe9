use anyhow::{Context, Result};
use clap::{App, AppSettings, Arg, SubCommand};
use gazette::build::build_site;
use gazette::config::Config;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let matches = App::new("gazette")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .global(true)
                .help("Log every file read and written"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site")
                .arg(
                    Arg::with_name("root")
                        .long("root")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Directory holding config.json, or one of its descendants (defaults to the current directory)"),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Publish directory (defaults to `public` next to config.json)"),
                ),
        )
        .get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(matches.is_present("verbose")))
        .init();

    if let Some(matches) = matches.subcommand_matches("build") {
        let root = match matches.value_of("root") {
            Some(root) => PathBuf::from(root),
            None => std::env::current_dir().context("Getting the current directory")?,
        };
        let mut config = Config::from_directory(&root)?;
        if let Some(output) = matches.value_of("output") {
            config = config.with_output_directory(PathBuf::from(output));
        }

        let report = build_site(&config).context("Building site")?;
        if !report.skipped.is_empty() {
            warn!("{} post files were skipped", report.skipped.len());
        }
        info!(
            "built {} pages and {} feed items into {}",
            report.pages,
            report.recent,
            config.output_directory.display()
        );
    }
    Ok(())
}

// `--verbose` wins over `RUST_LOG`; without it `RUST_LOG` applies, falling
// back to info.
fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("gazette=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gazette=info"))
    }
}
