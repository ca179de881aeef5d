use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info, warn};

use crate::model::{LeadRecord, Signals, TABLE_COLUMNS, is_null_marker};
use crate::util::sha256_file;


const NEWS_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

/// The lead table as loaded from disk, read-only for the life of the process.
///
/// Raw rows are kept next to the parsed records so the dataset can be written
/// back out exactly as it was read.
#[derive(Debug, Clone)]
pub struct LeadDataset {
    source_path: PathBuf,
    sha256: String,
    headers: StringRecord,
    rows: Vec<StringRecord>,
    leads: Vec<LeadRecord>,
    malformed_cells: usize,
}

#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    company: usize,
    lead_score: usize,
    propensity_pct: usize,
    stage: usize,
    top_signals: usize,
    last_news_date: usize,
    next_best_action: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|header| header.trim() == name)
                .with_context(|| format!("data file is missing required column: {name}"))
        };

        Ok(Self {
            company: find(TABLE_COLUMNS[0])?,
            lead_score: find(TABLE_COLUMNS[1])?,
            propensity_pct: find(TABLE_COLUMNS[2])?,
            stage: find(TABLE_COLUMNS[3])?,
            top_signals: find(TABLE_COLUMNS[4])?,
            last_news_date: find(TABLE_COLUMNS[5])?,
            next_best_action: find(TABLE_COLUMNS[6])?,
        })
    }
}

impl LeadDataset {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            bail!("missing data file: {}", path.display());
        }

        let sha256 = sha256_file(path)?;
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let mut dataset = Self::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to load {}", path.display()))?;
        dataset.source_path = path.to_path_buf();
        dataset.sha256 = sha256;

        info!(
            path = %path.display(),
            leads = dataset.len(),
            "loaded lead dataset"
        );
        if dataset.malformed_cells > 0 {
            warn!(
                path = %path.display(),
                malformed_cells = dataset.malformed_cells,
                "non-numeric lead_score or propensity_pct cells treated as missing"
            );
        }

        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers().context("failed to read CSV headers")?.clone();
        let columns = ColumnIndex::resolve(&headers)?;

        let mut rows = Vec::new();
        let mut leads = Vec::new();
        let mut malformed_cells = 0;

        for (index, result) in rdr.records().enumerate() {
            // Header is line 1.
            let line = index + 2;
            let row = result.with_context(|| format!("failed to read CSV row at line {line}"))?;
            let (lead, malformed) = parse_lead(&row, &columns);
            if malformed > 0 {
                debug!(line, company = %lead.company, "row has malformed numeric cells");
            }
            malformed_cells += malformed;
            leads.push(lead);
            rows.push(row);
        }

        Ok(Self {
            source_path: PathBuf::new(),
            sha256: String::new(),
            headers,
            rows,
            leads,
            malformed_cells,
        })
    }

    pub fn leads(&self) -> &[LeadRecord] {
        &self.leads
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    pub fn malformed_cells(&self) -> usize {
        self.malformed_cells
    }

    /// Writes the full, unfiltered dataset with its original header and cell text.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = WriterBuilder::new().flexible(true).from_writer(writer);
        wtr.write_record(&self.headers)
            .context("failed to write CSV header")?;
        for row in &self.rows {
            wtr.write_record(row).context("failed to write CSV row")?;
        }
        wtr.flush().context("failed to flush CSV output")?;
        Ok(())
    }
}

fn parse_lead(row: &StringRecord, columns: &ColumnIndex) -> (LeadRecord, usize) {
    let cell = move |index: usize| row.get(index).unwrap_or("");
    let mut malformed = 0;

    let mut number = |index: usize| match parse_number(cell(index)) {
        Ok(value) => value,
        Err(()) => {
            malformed += 1;
            None
        }
    };
    let lead_score = number(columns.lead_score);
    let propensity_pct = number(columns.propensity_pct);

    let last_news_date = cell(columns.last_news_date);
    let lead = LeadRecord {
        company: cell(columns.company).to_string(),
        lead_score,
        propensity_pct,
        stage: cell(columns.stage).to_string(),
        top_signals: Signals::parse(cell(columns.top_signals)),
        last_news_date: last_news_date.to_string(),
        next_best_action: cell(columns.next_best_action).to_string(),
        news_date: parse_news_date(last_news_date),
    };

    (lead, malformed)
}

/// `Ok(None)` for null markers, `Err` for text that is not a finite number.
fn parse_number(cell: &str) -> Result<Option<f64>, ()> {
    if is_null_marker(cell) {
        return Ok(None);
    }

    match cell.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(()),
    }
}

fn parse_news_date(cell: &str) -> Option<NaiveDate> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }

    NEWS_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|ts| ts.date_naive())
        })
}
