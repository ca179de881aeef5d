use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::model::{FilterOptions, FilterSpec, Histogram, LeadRecord, LeadView, TABLE_COLUMNS};

const BAR_WIDTH: usize = 30;
const NO_SIGNALS_NOTICE: &str = "No signals found for current filter.";

pub fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to serialize json output")?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

pub fn write_summary_text<W: Write>(
    out: &mut W,
    source: &str,
    total_leads: usize,
    spec: &FilterSpec,
    view: &LeadView<'_>,
    limit: Option<usize>,
) -> Result<()> {
    writeln!(out, "Dataset: {source} ({total_leads} leads)")?;
    writeln!(
        out,
        "Filters: min_score={} stages={} signals={} match={}",
        spec.min_score,
        join_or_none(spec.allowed_stages.iter()),
        join_or_none(spec.required_signals.iter()),
        spec.signal_match.as_str(),
    )?;
    writeln!(out)?;

    let display = view.kpis.display();
    writeln!(out, "Leads (after filters): {}", display.leads)?;
    writeln!(out, "Avg Lead Score: {}", display.avg_score)?;
    writeln!(out, "Avg Propensity %: {}", display.avg_propensity)?;
    writeln!(out, "Stages: {}", display.stages)?;
    writeln!(out)?;

    writeln!(out, "Pipeline by Stage")?;
    if view.stage_histogram.is_empty() {
        writeln!(out, "  (no leads)")?;
    } else {
        write_bar_chart(out, &view.stage_histogram)?;
    }
    writeln!(out)?;

    writeln!(out, "Top Signals Frequency")?;
    if view.signal_histogram.is_empty() {
        writeln!(out, "  {NO_SIGNALS_NOTICE}")?;
    } else {
        write_bar_chart(out, &view.signal_histogram)?;
    }
    writeln!(out)?;

    writeln!(out, "Lead Table")?;
    write_lead_table(out, &view.records, limit)?;

    out.flush()?;
    Ok(())
}

fn join_or_none<'a>(values: impl Iterator<Item = &'a String>) -> String {
    let joined = values.map(String::as_str).collect::<Vec<_>>().join(",");
    if joined.is_empty() {
        "(none)".to_string()
    } else {
        joined
    }
}

fn write_bar_chart<W: Write>(out: &mut W, histogram: &Histogram) -> Result<()> {
    let label_width = histogram
        .buckets()
        .iter()
        .map(|bucket| bucket.label.chars().count())
        .max()
        .unwrap_or(0);
    let max_count = histogram.max_count();

    for bucket in histogram.buckets() {
        let bar = "#".repeat(bar_length(bucket.count, max_count));
        writeln!(
            out,
            "  {:<label_width$}  {} {}",
            bucket.label, bar, bucket.count
        )?;
    }
    Ok(())
}

fn bar_length(count: usize, max_count: usize) -> usize {
    if max_count == 0 || count == 0 {
        return 0;
    }
    ((count * BAR_WIDTH + max_count / 2) / max_count).max(1)
}

fn write_lead_table<W: Write>(
    out: &mut W,
    records: &[&LeadRecord],
    limit: Option<usize>,
) -> Result<()> {
    writeln!(out, "{}", TABLE_COLUMNS.join("\t"))?;

    let shown = limit.unwrap_or(records.len()).min(records.len());
    for lead in &records[..shown] {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            lead.company,
            format_number(lead.lead_score),
            format_number(lead.propensity_pct),
            lead.stage,
            lead.top_signals,
            lead.last_news_date,
            lead.next_best_action,
        )?;
    }

    if shown < records.len() {
        writeln!(out, "... {} more", records.len() - shown)?;
    }
    Ok(())
}

fn format_number(value: Option<f64>) -> String {
    match value {
        Some(number) if number.fract() == 0.0 && number.abs() < 1e15 => format!("{number:.0}"),
        Some(number) => number.to_string(),
        None => String::new(),
    }
}

pub fn write_options_text<W: Write>(out: &mut W, options: &FilterOptions) -> Result<()> {
    write_option_list(out, "Stages", &options.stages)?;
    write_option_list(out, "Signals", &options.signals)?;
    out.flush()?;
    Ok(())
}

fn write_option_list<W: Write>(out: &mut W, title: &str, values: &[String]) -> Result<()> {
    if values.is_empty() {
        writeln!(out, "{title}: (none)")?;
        return Ok(());
    }

    writeln!(out, "{title}:")?;
    for value in values {
        writeln!(out, "  {value}")?;
    }
    Ok(())
}
