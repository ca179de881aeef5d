use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::dataset::LeadDataset;
use crate::pipeline::{signal_options, stage_options};

pub fn run(args: StatusArgs) -> Result<()> {
    let dataset = LeadDataset::load(&args.data_path)?;
    let columns: Vec<&str> = dataset.headers().collect();

    info!(
        path = %dataset.source_path().display(),
        sha256 = %dataset.sha256(),
        leads = dataset.len(),
        columns = %columns.join(","),
        "dataset status"
    );
    info!(
        stages = stage_options(dataset.leads()).len(),
        signals = signal_options(dataset.leads()).len(),
        "filter option counts"
    );

    let unsignaled = dataset
        .leads()
        .iter()
        .filter(|lead| lead.top_signals.is_empty())
        .count();
    let signal_tokens: usize = dataset
        .leads()
        .iter()
        .map(|lead| lead.top_signals.len())
        .sum();
    info!(unsignaled, signal_tokens, "signal coverage");

    let unscored = dataset
        .leads()
        .iter()
        .filter(|lead| lead.lead_score.is_none())
        .count();
    if unscored > 0 {
        warn!(unscored, "leads without a usable lead_score never pass the score filter");
    }
    if dataset.malformed_cells() > 0 {
        warn!(
            malformed_cells = dataset.malformed_cells(),
            "dataset contains malformed numeric cells"
        );
    }

    Ok(())
}
