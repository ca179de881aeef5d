use std::io;

use anyhow::Result;
use tracing::info;

use crate::cli::OptionsArgs;
use crate::dataset::LeadDataset;
use crate::model::FilterOptions;
use crate::pipeline::{signal_options, stage_options};
use crate::render;

pub fn run(args: OptionsArgs) -> Result<()> {
    let dataset = LeadDataset::load(&args.data_path)?;
    let options = FilterOptions {
        stages: stage_options(dataset.leads()),
        signals: signal_options(dataset.leads()),
    };

    info!(
        stages = options.stages.len(),
        signals = options.signals.len(),
        "collected filter options"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        render::write_json(&mut output, &options)
    } else {
        render::write_options_text(&mut output, &options)
    }
}
