use clap::Parser;
use newest_listing::Readiness;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "newest-listing")]
#[command(about = "Lists the most recent submissions of a paginated listing, newest first")]
#[command(version)]
pub struct Args {
    /// Listing URL to start from (defaults to the configured start URL)
    pub url: Option<String>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// WebDriver server to drive
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Number of row parses kept in flight per page
    #[arg(short = 'c', long)]
    pub batch_width: Option<usize>,

    /// Readiness level awaited after loading a page
    #[arg(long, value_enum)]
    pub readiness: Option<Readiness>,

    /// Seconds to wait for the next page after activating "load more"
    #[arg(long)]
    pub pagination_timeout: Option<u64>,

    /// Bound on the whole run, in seconds
    #[arg(long)]
    pub total_timeout: Option<u64>,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Read saved HTML pages instead of driving a browser, one file per page
    #[arg(long, num_args = 1.., value_name = "FILE")]
    pub from_html: Vec<PathBuf>,

    /// Print each entry's link under its title
    #[arg(long)]
    pub links: bool,

    /// Write the ordered entries as JSON instead of ranked lines
    #[arg(long, conflicts_with = "links")]
    pub json: bool,
}
