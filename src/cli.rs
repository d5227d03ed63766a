use clap::{Args, Parser, Subcommand};

pub const DEFAULT_CASES_INDEX_URL: &str = "https://www.veterinaryctmasterclass.com/cases/";
pub const DEFAULT_SERIES_INDEX_URL: &str = "https://www.learnabdominal.com/cases/ct-basecamp";

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Cases(CasesArgs),
    Series(SeriesArgs),
}

#[derive(Debug, Args)]
pub struct CasesArgs {
    /// Destination folder for downloaded case archives.
    #[arg(long)]
    pub out: String,

    /// Index page listing the cases.
    #[arg(long, default_value = DEFAULT_CASES_INDEX_URL)]
    pub index_url: String,

    /// Delay between cases (politeness).
    #[arg(long, default_value_t = 2000)]
    pub delay_ms: u64,

    /// Directory holding `errors.txt` and `duplicates.txt`.
    #[arg(long, default_value = ".")]
    pub log_dir: String,
}

#[derive(Debug, Args)]
pub struct SeriesArgs {
    /// Index page carrying redirector-wrapped study links.
    #[arg(long, default_value = DEFAULT_SERIES_INDEX_URL)]
    pub index_url: String,

    /// Output directory for downloaded instance files.
    #[arg(long, default_value = "data")]
    pub out: String,

    /// Directory holding `errors.txt` and `duplicates.txt`.
    #[arg(long, default_value = ".")]
    pub log_dir: String,

    /// Substring identifying redirector links.
    #[arg(long, default_value = crate::redirect::DEFAULT_REDIRECTOR)]
    pub redirector: String,

    /// Substring an unwrapped target URL must contain.
    #[arg(long, default_value = crate::redirect::DEFAULT_TARGET_HOST)]
    pub target_host: String,

    /// Script variable holding the study object.
    #[arg(long, default_value = "studydata")]
    pub variable: String,
}
