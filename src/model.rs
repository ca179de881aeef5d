use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

pub const SIGNAL_SEPARATOR: &str = "; ";
pub const PLACEHOLDER: &str = "—";

/// Column order of the lead table, and the columns a dataset must provide.
pub const TABLE_COLUMNS: [&str; 7] = [
    "company",
    "lead_score",
    "propensity_pct",
    "stage",
    "top_signals",
    "last_news_date",
    "next_best_action",
];

/// Cell values read as "no value"; the default null markers of common dataframe readers.
const NULL_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_null_marker(cell: &str) -> bool {
    NULL_MARKERS.contains(&cell.trim())
}

/// Signal tags of a lead, in the order they were written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Signals(Vec<String>);

impl Signals {
    pub fn parse(raw: &str) -> Self {
        if is_null_marker(raw) {
            return Self::default();
        }

        Self(
            raw.split(SIGNAL_SEPARATOR)
                .filter(|token| !token.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, signal: &str) -> bool {
        self.0.iter().any(|value| value == signal)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Signals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(SIGNAL_SEPARATOR))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadRecord {
    pub company: String,
    pub lead_score: Option<f64>,
    pub propensity_pct: Option<f64>,
    pub stage: String,
    pub top_signals: Signals,
    pub last_news_date: String,
    pub next_best_action: String,
    pub news_date: Option<NaiveDate>,
}

/// How `FilterSpec::required_signals` is matched against a lead's signals.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalMatch {
    /// At least one required signal present.
    #[default]
    Any,
    /// Every required signal present.
    All,
}

impl SignalMatch {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    pub min_score: i64,
    pub allowed_stages: BTreeSet<String>,
    pub required_signals: BTreeSet<String>,
    pub signal_match: SignalMatch,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub count: usize,
    pub avg_score: Option<f64>,
    pub avg_propensity: Option<f64>,
    pub stages: Vec<String>,
}

impl Kpis {
    pub fn avg_score_display(&self) -> String {
        format_mean(self.avg_score)
    }

    pub fn avg_propensity_display(&self) -> String {
        format_mean(self.avg_propensity)
    }

    pub fn stages_display(&self) -> String {
        if self.stages.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            self.stages.join(", ")
        }
    }

    pub fn display(&self) -> KpiDisplay {
        KpiDisplay {
            leads: self.count.to_string(),
            avg_score: self.avg_score_display(),
            avg_propensity: self.avg_propensity_display(),
            stages: self.stages_display(),
        }
    }
}

fn format_mean(value: Option<f64>) -> String {
    match value {
        Some(mean) => format!("{mean:.1}"),
        None => PLACEHOLDER.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiDisplay {
    pub leads: String,
    pub avg_score: String,
    pub avg_propensity: String,
    pub stages: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramBucket {
    pub label: String,
    pub count: usize,
}

/// Category counts ordered by descending count, then ascending label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Histogram {
    buckets: Vec<HistogramBucket>,
}

impl Histogram {
    pub fn from_counts(counts: BTreeMap<String, usize>) -> Self {
        let mut buckets: Vec<HistogramBucket> = counts
            .into_iter()
            .map(|(label, count)| HistogramBucket { label, count })
            .collect();
        // BTreeMap order already breaks ties by label; the sort is stable.
        buckets.sort_by(|a, b| b.count.cmp(&a.count));
        Self { buckets }
    }

    pub fn buckets(&self) -> &[HistogramBucket] {
        &self.buckets
    }

    #[cfg(test)]
    pub fn count_of(&self, label: &str) -> Option<usize> {
        self.buckets
            .iter()
            .find(|bucket| bucket.label == label)
            .map(|bucket| bucket.count)
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.count).sum()
    }

    pub fn max_count(&self) -> usize {
        self.buckets.first().map(|bucket| bucket.count).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Everything derived from one filter evaluation.
#[derive(Debug, Clone)]
pub struct LeadView<'a> {
    pub records: Vec<&'a LeadRecord>,
    pub kpis: Kpis,
    pub stage_histogram: Histogram,
    pub signal_histogram: Histogram,
}

#[derive(Debug, Serialize)]
pub struct LeadReport<'a> {
    pub report_version: u32,
    pub generated_at: String,
    pub source_path: String,
    pub source_sha256: String,
    pub total_leads: usize,
    pub filter: &'a FilterSpec,
    pub kpis: &'a Kpis,
    pub kpi_display: KpiDisplay,
    pub stage_histogram: &'a Histogram,
    pub signal_histogram: &'a Histogram,
    pub leads: &'a [&'a LeadRecord],
}

#[derive(Debug, Serialize)]
pub struct FilterOptions {
    pub stages: Vec<String>,
    pub signals: Vec<String>,
}
