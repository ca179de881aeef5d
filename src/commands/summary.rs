use std::collections::BTreeSet;
use std::io;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::SummaryArgs;
use crate::dataset::LeadDataset;
use crate::model::{FilterSpec, LeadReport, LeadView};
use crate::pipeline;
use crate::render;
use crate::util::{now_utc_string, write_json_pretty};

const REPORT_VERSION: u32 = 1;

pub fn run(args: SummaryArgs) -> Result<()> {
    let dataset = LeadDataset::load(&args.data_path)?;
    let spec = build_filter(&args, &dataset);
    let view = pipeline::evaluate(dataset.leads(), &spec);

    info!(
        total = dataset.len(),
        matched = view.kpis.count,
        min_score = spec.min_score,
        stages = spec.allowed_stages.len(),
        signals = spec.required_signals.len(),
        signal_match = spec.signal_match.as_str(),
        signal_tokens = view.signal_histogram.total(),
        "evaluated lead filters"
    );

    let report = build_report(&dataset, &spec, &view);
    if let Some(path) = &args.report_path {
        write_json_pretty(path, &report)?;
        info!(path = %path.display(), "wrote lead report");
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        render::write_json(&mut output, &report)
    } else {
        render::write_summary_text(
            &mut output,
            &dataset.source_path().display().to_string(),
            dataset.len(),
            &spec,
            &view,
            args.limit,
        )
    }
}

fn build_filter(args: &SummaryArgs, dataset: &LeadDataset) -> FilterSpec {
    let mut spec = pipeline::default_filter(dataset.leads(), args.min_score);
    spec.signal_match = args.signal_match.into();

    if !args.stages.is_empty() {
        for stage in &args.stages {
            if !spec.allowed_stages.contains(stage) {
                warn!(stage = %stage, "stage does not occur in dataset");
            }
        }
        spec.allowed_stages = args.stages.iter().cloned().collect();
    }

    if !args.signals.is_empty() {
        let known: BTreeSet<String> = pipeline::signal_options(dataset.leads())
            .into_iter()
            .collect();
        for signal in &args.signals {
            if !known.contains(signal) {
                warn!(signal = %signal, "signal does not occur in dataset");
            }
        }
        spec.required_signals = args.signals.iter().cloned().collect();
    }

    spec
}

fn build_report<'a>(
    dataset: &LeadDataset,
    spec: &'a FilterSpec,
    view: &'a LeadView<'a>,
) -> LeadReport<'a> {
    LeadReport {
        report_version: REPORT_VERSION,
        generated_at: now_utc_string(),
        source_path: dataset.source_path().display().to_string(),
        source_sha256: dataset.sha256().to_string(),
        total_leads: dataset.len(),
        filter: spec,
        kpis: &view.kpis,
        kpi_display: view.kpis.display(),
        stage_histogram: &view.stage_histogram,
        signal_histogram: &view.signal_histogram,
        leads: &view.records,
    }
}
