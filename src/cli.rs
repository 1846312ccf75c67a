//! CLI argument definitions using clap derive macros.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};

use linkdl_core::config::FileConfig;
use linkdl_core::download::{DEFAULT_CONCURRENCY, DEFAULT_MAX_ATTEMPTS};
use linkdl_core::report::{DEFAULT_ERROR_LOG, DEFAULT_REPORT_FILE};

/// Rank a page's links against keywords and download link lists concurrently.
///
/// Ranking mode (-u URL -k FILE) scores every link on the page against each
/// keyword and writes the matches to a report. Download mode (-d -l FILE)
/// fetches every URL listed in a file with bounded parallelism and retry.
/// Both modes may be combined; ranking runs first.
#[derive(Parser, Debug)]
#[command(name = "linkdl")]
#[command(author, version, about)]
pub struct Args {
    /// Page whose links are ranked
    #[arg(short = 'u', long, requires = "keyword_file")]
    pub url: Option<String>,

    /// File with one keyword per line
    #[arg(short = 'k', long = "keywords", visible_alias = "kw", requires = "url")]
    pub keyword_file: Option<PathBuf>,

    /// Ranking report path
    #[arg(short = 'o', long, default_value = DEFAULT_REPORT_FILE)]
    pub output: PathBuf,

    /// Keep only the best N links per keyword
    #[arg(long = "topn", value_parser = clap::value_parser!(u64).range(1..))]
    pub top_n: Option<u64>,

    /// Drop links scoring below this similarity (0-100)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub min_score: u8,

    /// Download the links listed in the file given with -l
    #[arg(short = 'd', long)]
    pub download: bool,

    /// File of URLs to download, one per line
    #[arg(short = 'l', long = "links", visible_alias = "linkfile")]
    pub links_file: Option<PathBuf>,

    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, visible_alias = "concurrent", default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Directory downloads are written into
    #[arg(short = 'p', long = "path", default_value = ".")]
    pub download_dir: PathBuf,

    /// Attempts per URL, including the first (1-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_ATTEMPTS as u8, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub max_attempts: u8,

    /// Pause between attempts in milliseconds (max 60000)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub retry_delay_ms: u64,

    /// File final download failures are appended to
    #[arg(long, default_value = DEFAULT_ERROR_LOG)]
    pub error_log: PathBuf,

    /// Do not draw progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Config file to read instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// What an invocation asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Nothing selected.
    None,
    /// Rank `url`'s links against the keywords in `keyword_file`.
    Rank { url: String, keyword_file: PathBuf },
    /// Download the URLs in `links_file`.
    Download { links_file: PathBuf },
    /// Rank first, then download.
    Both {
        url: String,
        keyword_file: PathBuf,
        links_file: PathBuf,
    },
}

impl Args {
    /// Works out the selected modes.
    ///
    /// # Errors
    ///
    /// Fails when `-d` is given without `-l`.
    pub fn mode(&self) -> anyhow::Result<Mode> {
        let rank = match (&self.url, &self.keyword_file) {
            (Some(url), Some(keyword_file)) => Some((url.clone(), keyword_file.clone())),
            _ => None,
        };
        let download = if self.download {
            let Some(links_file) = &self.links_file else {
                anyhow::bail!("download mode (-d) needs a link file (-l FILE)");
            };
            Some(links_file.clone())
        } else {
            None
        };

        Ok(match (rank, download) {
            (None, None) => Mode::None,
            (Some((url, keyword_file)), None) => Mode::Rank { url, keyword_file },
            (None, Some(links_file)) => Mode::Download { links_file },
            (Some((url, keyword_file)), Some(links_file)) => Mode::Both {
                url,
                keyword_file,
                links_file,
            },
        })
    }
}

/// Which config-backed options were given explicitly on the command line.
#[derive(Debug, Clone, Copy, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct CliValueSources {
    pub output: bool,
    pub concurrency: bool,
    pub download_dir: bool,
    pub max_attempts: bool,
    pub retry_delay_ms: bool,
    pub error_log: bool,
}

/// Parses `argv`, exiting with clap's message on error.
pub fn parse_cli_with_sources() -> (Args, CliValueSources) {
    try_parse_cli_with_sources(std::env::args_os()).unwrap_or_else(|err| err.exit())
}

/// Parses `itr`, also reporting which options came from the command line.
///
/// # Errors
///
/// Returns clap's error for invalid arguments, `--help` and `--version`.
pub fn try_parse_cli_with_sources<I, T>(itr: I) -> Result<(Args, CliValueSources), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = Args::command().try_get_matches_from(itr)?;
    let args = Args::from_arg_matches(&matches)?;
    let sources = CliValueSources {
        output: is_commandline_value(&matches, "output"),
        concurrency: is_commandline_value(&matches, "concurrency"),
        download_dir: is_commandline_value(&matches, "download_dir"),
        max_attempts: is_commandline_value(&matches, "max_attempts"),
        retry_delay_ms: is_commandline_value(&matches, "retry_delay_ms"),
        error_log: is_commandline_value(&matches, "error_log"),
    };
    Ok((args, sources))
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Fills options not given on the command line from the config file.
///
/// Values in `file_config` have already been range-checked.
pub fn apply_config_defaults(
    mut args: Args,
    sources: CliValueSources,
    file_config: &FileConfig,
) -> Args {
    if !sources.output
        && let Some(output) = &file_config.output
    {
        args.output.clone_from(output);
    }
    if !sources.concurrency
        && let Some(concurrency) = file_config.concurrency
        && let Ok(concurrency) = u8::try_from(concurrency)
    {
        args.concurrency = concurrency;
    }
    if !sources.download_dir
        && let Some(dir) = &file_config.download_dir
    {
        args.download_dir.clone_from(dir);
    }
    if !sources.max_attempts
        && let Some(attempts) = file_config.max_attempts
        && let Ok(attempts) = u8::try_from(attempts)
    {
        args.max_attempts = attempts;
    }
    if !sources.retry_delay_ms
        && let Some(delay) = file_config.retry_delay_ms
    {
        args.retry_delay_ms = delay;
    }
    if !sources.error_log
        && let Some(error_log) = &file_config.error_log
    {
        args.error_log.clone_from(error_log);
    }
    args
}
