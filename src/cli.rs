use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::model::SignalMatch;

pub const DEFAULT_DATA_PATH: &str = "data/sample_leads.csv";
pub const DEFAULT_MIN_SCORE: i64 = 70;

#[derive(Parser, Debug)]
#[command(
    name = "dealflow",
    version,
    about = "Filter, summarize and export a scored sales-lead dataset"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Filter the dataset and print KPIs, stage/signal charts and the lead table.
    Summary(SummaryArgs),
    /// List the stage and signal values available for filtering.
    Options(OptionsArgs),
    /// Write the full, unfiltered dataset back out as CSV.
    Export(ExportArgs),
    /// Log dataset provenance and data-quality counts.
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SummaryArgs {
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    pub data_path: PathBuf,

    #[arg(long, default_value_t = DEFAULT_MIN_SCORE, allow_negative_numbers = true)]
    pub min_score: i64,

    /// Allowed stage; repeat for several. All stages when omitted.
    #[arg(long = "stage")]
    pub stages: Vec<String>,

    /// Required signal; repeat for several.
    #[arg(long = "signal")]
    pub signals: Vec<String>,

    #[arg(long, value_enum, default_value_t = SignalMatchArg::Any)]
    pub signal_match: SignalMatchArg,

    /// Maximum number of table rows to print.
    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SignalMatchArg {
    Any,
    All,
}

impl From<SignalMatchArg> for SignalMatch {
    fn from(value: SignalMatchArg) -> Self {
        match value {
            SignalMatchArg::Any => SignalMatch::Any,
            SignalMatchArg::All => SignalMatch::All,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct OptionsArgs {
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    pub data_path: PathBuf,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    pub data_path: PathBuf,

    /// Destination file; stdout when omitted.
    #[arg(long)]
    pub out_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    pub data_path: PathBuf,
}
