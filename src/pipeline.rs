//! Filter-and-aggregate pipeline over an in-memory lead table.
//!
//! Every function here is pure: the dataset is passed in, nothing is cached,
//! and identical inputs always produce identical views.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::model::{FilterSpec, Histogram, Kpis, LeadRecord, LeadView, SignalMatch, Signals};

#[cfg(test)]
mod tests;

/// Filter defaults for a freshly loaded dataset: every stage allowed, no required signals.
pub fn default_filter(leads: &[LeadRecord], min_score: i64) -> FilterSpec {
    FilterSpec {
        min_score,
        allowed_stages: stage_options(leads).into_iter().collect(),
        required_signals: BTreeSet::new(),
        signal_match: SignalMatch::Any,
    }
}

/// Retained records ordered by `lead_score` desc, then `propensity_pct` desc.
pub fn filter<'a>(leads: &'a [LeadRecord], spec: &FilterSpec) -> Vec<&'a LeadRecord> {
    let threshold = spec.min_score as f64;

    let mut retained: Vec<&LeadRecord> = leads
        .iter()
        .filter(|lead| passes(lead, spec, threshold))
        .collect();

    retained.sort_by(|a, b| {
        descending(a.lead_score, b.lead_score)
            .then_with(|| descending(a.propensity_pct, b.propensity_pct))
    });
    retained
}

fn passes(lead: &LeadRecord, spec: &FilterSpec, threshold: f64) -> bool {
    let Some(score) = lead.lead_score else {
        return false;
    };

    score >= threshold
        && spec.allowed_stages.contains(&lead.stage)
        && signals_match(&lead.top_signals, &spec.required_signals, spec.signal_match)
}

pub fn signals_match(signals: &Signals, required: &BTreeSet<String>, mode: SignalMatch) -> bool {
    if required.is_empty() {
        return true;
    }

    match mode {
        SignalMatch::Any => required.iter().any(|signal| signals.contains(signal)),
        SignalMatch::All => required.iter().all(|signal| signals.contains(signal)),
    }
}

// Missing values sort last.
fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn kpis(records: &[&LeadRecord]) -> Kpis {
    let stages: BTreeSet<&str> = records.iter().map(|lead| lead.stage.as_str()).collect();

    Kpis {
        count: records.len(),
        avg_score: mean(records.iter().filter_map(|lead| lead.lead_score)),
        avg_propensity: mean(records.iter().filter_map(|lead| lead.propensity_pct)),
        stages: stages.into_iter().map(ToOwned::to_owned).collect(),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0_usize), |(sum, count), value| {
        (sum + value, count + 1)
    });
    (count > 0).then(|| sum / count as f64)
}

pub fn stage_histogram(records: &[&LeadRecord]) -> Histogram {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for lead in records {
        *counts.entry(lead.stage.clone()).or_default() += 1;
    }
    Histogram::from_counts(counts)
}

pub fn signal_histogram(records: &[&LeadRecord]) -> Histogram {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for signal in records.iter().flat_map(|lead| lead.top_signals.iter()) {
        *counts.entry(signal.to_string()).or_default() += 1;
    }
    Histogram::from_counts(counts)
}

pub fn evaluate<'a>(leads: &'a [LeadRecord], spec: &FilterSpec) -> LeadView<'a> {
    let records = filter(leads, spec);
    let kpis = kpis(&records);
    let stage_histogram = stage_histogram(&records);
    let signal_histogram = signal_histogram(&records);

    LeadView {
        records,
        kpis,
        stage_histogram,
        signal_histogram,
    }
}

/// Sorted distinct stages over the whole dataset.
pub fn stage_options(leads: &[LeadRecord]) -> Vec<String> {
    let stages: BTreeSet<&str> = leads.iter().map(|lead| lead.stage.as_str()).collect();
    stages.into_iter().map(ToOwned::to_owned).collect()
}

/// Sorted distinct signals over the whole dataset.
pub fn signal_options(leads: &[LeadRecord]) -> Vec<String> {
    let signals: BTreeSet<&str> = leads
        .iter()
        .flat_map(|lead| lead.top_signals.iter())
        .collect();
    signals.into_iter().map(ToOwned::to_owned).collect()
}
